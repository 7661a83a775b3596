//! `CompositeInjector`: aplica una secuencia de `ParamInjector` de forma
//! determinista y devuelve los params resultantes.

use crate::model::ExecutionContext;
use serde_json::Value;

use super::merge::merge_json;
use super::param_injector::ParamInjector;

/// CompositeInjector aplica una serie de inyectores en orden, de forma
/// determinista. El orden de merge es: base -> injectors (en orden).
#[derive(Debug, Default)]
pub struct CompositeInjector {
    pub injectors: Vec<Box<dyn ParamInjector>>,
}

impl CompositeInjector {
    /// Crea un `CompositeInjector` vacío.
    pub fn new() -> Self {
        Self { injectors: vec![] }
    }

    /// Crea un `CompositeInjector` con la lista dada de inyectores.
    pub fn with_injectors(inj: Vec<Box<dyn ParamInjector>>) -> Self {
        Self { injectors: inj }
    }

    /// Aplica los inyectores sobre `base` y devuelve los params resultantes.
    pub fn apply(&self, base: &Value, ctx: &ExecutionContext) -> Value {
        Self::apply_injectors(&self.injectors, base, ctx)
    }

    /// Versión estática que aplica un slice de inyectores sin tomar
    /// ownership (útil para callers que mantienen los inyectores en el
    /// engine).
    pub fn apply_injectors(injectors: &[Box<dyn ParamInjector>], base: &Value, ctx: &ExecutionContext) -> Value {
        let mut accumulated = base.clone();
        for inj in injectors.iter() {
            let v = inj.inject(&accumulated, ctx);
            accumulated = merge_json(&accumulated, &v);
        }
        accumulated
    }
}

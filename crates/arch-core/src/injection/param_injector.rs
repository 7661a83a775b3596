//! Contrato para inyectores de parámetros.
//!
//! Un `ParamInjector` recibe los `base` params del step y el
//! `ExecutionContext` y devuelve un `Value` que será mergeado sobre los
//! params actuales.

use crate::model::ExecutionContext;
use serde_json::Value;

/// Trait para inyectores de parámetros.
pub trait ParamInjector: Send + Sync + std::fmt::Debug {
    /// Devuelve una estructura JSON que será mergeada sobre `base`.
    ///
    /// Implementaciones deben ser deterministas y rápidas.
    fn inject(&self, base: &Value, ctx: &ExecutionContext) -> Value;
}

/// Inyector constante: siempre aporta los mismos overrides. Es la forma en
/// que el composition root inyecta configuración (determinista porque los
/// valores se capturan al construirlo, no se leen del ambiente en `inject`).
#[derive(Debug, Clone)]
pub struct ConstInjector {
    pub overrides: Value,
}

impl ConstInjector {
    pub fn new(overrides: Value) -> Self {
        Self { overrides }
    }
}

impl ParamInjector for ConstInjector {
    fn inject(&self, _base: &Value, _ctx: &ExecutionContext) -> Value {
        self.overrides.clone()
    }
}

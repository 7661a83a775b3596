//! LoadBatchStep (Source)
//!
//! Parsea el arreglo JSON crudo de specs y emite un `SpecBatch` con un
//! `Value` por item, sin interpretar su contenido. Un JSON de entrada que no
//! sea un arreglo es inutilizable: falla el step (y por lo tanto el batch
//! completo), a diferencia de los errores por item que vienen después.

use arch_core::errors::CoreEngineError;
use arch_core::step::{StepKind, StepRunResultTyped, TypedStep};

use crate::artifacts::SpecBatch;

#[derive(Clone, Debug)]
pub struct LoadBatchStep {
    /// Contenido crudo del batch (el archivo JSON completo).
    pub raw: String,
}

impl LoadBatchStep {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

impl TypedStep for LoadBatchStep {
    type Params = ();
    type Input = SpecBatch; // ignorado (Source)
    type Output = SpecBatch;

    fn id(&self) -> &'static str {
        "load_batch"
    }

    fn kind(&self) -> StepKind {
        StepKind::Source
    }

    fn run_typed(&self, _input: Option<SpecBatch>, _params: ()) -> StepRunResultTyped<SpecBatch> {
        match serde_json::from_str::<Vec<serde_json::Value>>(&self.raw) {
            Ok(items) => StepRunResultTyped::Success { outputs: vec![SpecBatch { items, schema_version: 1 }] },
            Err(e) => StepRunResultTyped::Failure { error: CoreEngineError::Internal(format!("batch JSON inválido: {e}")) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_json_array() {
        let step = LoadBatchStep::new(r#"[{"class_name": "Cart"}]"#);
        match step.run_typed(None, ()) {
            StepRunResultTyped::Success { outputs } => {
                assert_eq!(outputs[0].items.len(), 1);
            }
            _ => panic!("se esperaba Success"),
        }
    }

    #[test]
    fn malformed_json_fails_the_step() {
        let step = LoadBatchStep::new("not json");
        assert!(matches!(step.run_typed(None, ()), StepRunResultTyped::Failure { .. }));
    }

    #[test]
    fn non_array_json_fails_the_step() {
        let step = LoadBatchStep::new(r#"{"class_name": "Cart"}"#);
        assert!(matches!(step.run_typed(None, ()), StepRunResultTyped::Failure { .. }));
    }
}

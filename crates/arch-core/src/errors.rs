//! Errores específicos del core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CoreEngineError {
    #[error("batch already completed")] BatchCompleted,
    #[error("invalid step index")] InvalidStepIndex,
    #[error("step already terminal")] StepAlreadyTerminal,
    #[error("missing required inputs")] MissingInputs,
    #[error("first step must be source kind")] FirstStepMustBeSource,
    #[error("batch has failed previously (stop-on-failure invariant)")] BatchHasFailed,
    #[error("internal: {0}")] Internal(String),
}

/// Clasificación gruesa para decidir reintentos en capas de persistencia.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Vale la pena reintentar (IO transitorio, contención).
    Transient,
    /// Reintentar no cambia el resultado.
    Permanent,
}

/// Clasifica un `CoreEngineError` para políticas de retry externas. El motor
/// en sí es determinista: todos sus errores son permanentes salvo los
/// internos, que pueden originarse en stores con fallas transitorias.
pub fn classify_error(err: &CoreEngineError) -> ErrorClass {
    match err {
        CoreEngineError::Internal(_) => ErrorClass::Transient,
        _ => ErrorClass::Permanent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_transient() {
        assert_eq!(classify_error(&CoreEngineError::Internal("pool".into())), ErrorClass::Transient);
    }

    #[test]
    fn contract_errors_are_permanent() {
        assert_eq!(classify_error(&CoreEngineError::MissingInputs), ErrorClass::Permanent);
        assert_eq!(classify_error(&CoreEngineError::BatchCompleted), ErrorClass::Permanent);
    }
}

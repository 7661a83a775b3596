use serde_json::Value;

use crate::{errors::CoreEngineError, model::Artifact};

/// Señal por item rechazado durante un step batch.
///
/// Un item del batch que falla validación/enrutamiento/generación no aborta
/// el step: el step la reporta como señal y el engine la registra como
/// evento `ItemRejected` (semántica de falla parcial a nivel batch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSignal {
    pub class_name: String,
    /// Error estructurado serializado (`SpecError` de la capa adapters).
    pub error: Value,
}

/// Resultado abstracto de ejecutar un step.
pub enum StepRunResult {
    Success { outputs: Vec<Artifact> },
    SuccessWithSignals { outputs: Vec<Artifact>, signals: Vec<ItemSignal> },
    Failure { error: CoreEngineError },
}

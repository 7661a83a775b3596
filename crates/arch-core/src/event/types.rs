//! Tipos de evento del batch y estructura `BatchEvent`.
//!
//! Rol en el pipeline:
//! - Cada ejecución del `BatchEngine` emite eventos a un `EventStore`
//!   append-only.
//! - Estos eventos permiten reconstruir el estado del `BatchRepository`
//!   (replay) sin depender de estructuras mutables.
//! - El enum `BatchEventKind` define el contrato observable y estable del
//!   motor; es también la superficie de auditoría de la generación.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreEngineError;

/// Tipos de eventos soportados por el motor de generación.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BatchEventKind {
    /// Emisión inicial de un batch: fija la `definition_hash` y cantidad de
    /// steps. Invariante: debe ser el primer evento de un `batch_id`.
    BatchInitialized { definition_hash: String, step_count: usize },
    /// Un step comenzó su ejecución. No implica éxito.
    StepStarted { step_index: usize, step_id: String },
    /// Un step terminó correctamente, con sus outputs (hashes) y fingerprint.
    StepFinished {
        step_index: usize,
        step_id: String,
        outputs: Vec<String>,
        fingerprint: String,
    },
    /// Un step terminó con error terminal. El batch no continúa
    /// (stop-on-failure).
    StepFailed {
        step_index: usize,
        step_id: String,
        error: CoreEngineError,
        fingerprint: String,
    },
    /// Un item del batch fue rechazado (falla parcial): el step continúa con
    /// los demás items y el error estructurado queda registrado aquí.
    ItemRejected {
        step_index: usize,
        step_id: String,
        class_name: String,
        error: serde_json::Value,
    },
    /// Evento de cierre con fingerprint agregado del batch (hash de
    /// fingerprints ordenados de steps exitosos).
    BatchCompleted { batch_fingerprint: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEvent {
    pub seq: u64, // asignado por EventStore (orden append)
    pub batch_id: Uuid,
    pub kind: BatchEventKind,
    pub ts: DateTime<Utc>, // metadato (no entra en fingerprint)
}

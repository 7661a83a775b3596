//! arch-adapters: Capa de adaptación Dominio ↔ Core
//!
//! Este crate provee:
//! - Artifacts tipados neutrales que transportan el batch por el pipeline
//!   (crudo -> validado -> generado -> salida fusionada).
//! - Los steps del pipeline de generación: `LoadBatchStep` (Source),
//!   `ValidateBatchStep` (Check), `GenerateModulesStep` (Transform) y
//!   `PublishStep` (Sink).
//! - El dispatcher por prefijo de capa y los cuatro generadores
//!   (Domain, Application, Infrastructure, Presentation) con sus plantillas
//!   TypeScript.
//!
//! Nota: el core sólo conoce `Artifact { kind, hash, payload, metadata }`.
//! Toda la semántica de specs de clase vive aquí y en `arch-domain`.

pub mod artifacts;
pub mod generators;
pub mod paths;
pub mod spec_error;
pub mod steps;

pub use artifacts::{GeneratedBatch, GeneratedItem, GeneratedModule, OutputBatch, RejectedItem, SpecBatch,
                    ValidatedBatch, ValidatedItem};
pub use generators::{route, BatchIndex, LayerGenerator};
pub use spec_error::SpecError;
pub use steps::{GenerateModulesStep, LoadBatchStep, PublishStep, ValidateBatchStep};

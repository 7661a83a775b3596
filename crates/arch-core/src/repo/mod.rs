//! Reconstrucción de estado (replay) y definición del pipeline.

pub mod types;

pub use types::{build_pipeline_definition, build_pipeline_definition_auto, BatchInstance, BatchRepository,
                InMemoryBatchRepository, PipelineDefinition, StepSlot};

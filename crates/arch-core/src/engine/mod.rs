//! Engine module for BatchEngine implementation
//!
//! Provides the core engine, builder pattern, and batch context for
//! deterministic generation-pipeline execution.

pub mod batch_ctx;
pub mod builder;
pub mod core;

pub use batch_ctx::BatchCtx;
pub use builder::{EngineBuilder, EngineBuilderInit};
pub use core::BatchEngine;

pub use crate::event::{BatchEvent, BatchEventKind, EventStore, InMemoryEventStore};
pub use crate::repo::{BatchRepository, InMemoryBatchRepository, PipelineDefinition};
pub use crate::step::{StepRunResult, StepStatus};

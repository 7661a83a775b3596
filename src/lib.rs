//! archflow-rust: raíz de composición y runtime de soporte.
//!
//! Este crate reúne las piezas de los miembros del workspace:
//! - `config`: configuración de la aplicación cargada desde .env.
//! - `store`: runtime de referencia del patrón de store optimista que
//!   emite el generador de Application (snapshot -> aplicación optimista ->
//!   pending -> confirmación | rollback).
//! - `batch`: drivers de ejecución de batches (secuencial sobre el engine de
//!   eventos, paralelo con workers rayon).
pub mod batch;
pub mod config;
pub mod store;

pub use batch::{run_batch, run_batch_parallel, DriverError};
pub use config::GenConfig;
pub use store::{MutationUseCase, OptimisticStore, StoreError};

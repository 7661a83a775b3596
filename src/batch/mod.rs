//! Drivers de ejecución de batches.

pub mod driver;

pub use driver::{run_batch, run_batch_parallel, DriverError};

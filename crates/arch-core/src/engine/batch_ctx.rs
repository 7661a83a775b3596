//! Batch context implementation

use crate::engine::BatchEngine;
use crate::errors::CoreEngineError;
use crate::event::EventStore;
use crate::repo::BatchRepository;
use crate::PipelineDefinition;
use uuid::Uuid;

/// Contexto de ejecución para un batch específico
///
/// Proporciona una API ergonómica para ejecutar pasos y gestionar el estado
/// de un batch dentro de un BatchEngine
pub struct BatchCtx<'a, E: EventStore, R: BatchRepository> {
    pub engine: &'a mut BatchEngine<E, R>,
    pub batch_id: Uuid,
    pub definition: &'a PipelineDefinition,
}

impl<'a, E: EventStore, R: BatchRepository> BatchCtx<'a, E, R> {
    /// Crea un nuevo contexto de batch
    #[inline]
    pub fn new(engine: &'a mut BatchEngine<E, R>, batch_id: Uuid, definition: &'a PipelineDefinition) -> Self {
        Self { engine,
               batch_id,
               definition }
    }

    /// Ejecuta el siguiente paso del batch
    #[inline]
    pub fn step(&mut self) -> Result<(), CoreEngineError> {
        self.engine.next_with(self.batch_id, self.definition)
    }

    /// Ejecuta hasta `n` pasos o hasta que ocurra un error terminal
    #[inline]
    pub fn run_n(&mut self, n: usize) -> Result<(), CoreEngineError> {
        for _ in 0..n {
            match self.step() {
                Ok(()) => continue,
                Err(CoreEngineError::BatchCompleted) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Ejecuta pasos hasta que el batch complete o ocurra un error terminal
    #[inline]
    pub fn run_to_completion(&mut self) -> Result<(), CoreEngineError> {
        loop {
            match self.step() {
                Ok(()) => continue,
                Err(CoreEngineError::BatchCompleted) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }
}

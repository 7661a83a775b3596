//! Orquestación de batches por encima del engine.
//!
//! Dos caminos con el mismo resultado observable:
//! - `run_batch`: secuencial, a través del `BatchEngine` (eventos,
//!   fingerprints, trazabilidad completa). Es el camino por defecto.
//! - `run_batch_parallel`: los items no tienen dependencias entre sí más
//!   allá del upsert al registro (exclusivo por clave porque cada
//!   `class_name` se procesa a lo sumo una vez por corrida), así que la fase
//!   de generación puede repartirse entre workers rayon. El orden de la
//!   salida sigue siendo el del batch de entrada.

use std::sync::Arc;

use arch_adapters::steps::{GenerateModulesStep, LoadBatchStep, PublishParams, PublishStep, ValidateBatchStep};
use arch_adapters::{route, BatchIndex, GeneratedBatch, GeneratedItem, OutputBatch, RejectedItem, SpecBatch,
                    ValidatedBatch};
use arch_core::errors::CoreEngineError;
use arch_core::model::ArtifactSpec;
use arch_core::registry::{ArtifactRegistry, ModuleWriter};
use arch_core::repo::BatchRepository;
use arch_core::step::{StepRunResultTyped, TypedStep};
use arch_core::{BatchEngine, BatchEvent, EventStore};
use log::debug;
use rayon::prelude::*;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("engine: {0}")]
    Engine(#[from] CoreEngineError),
    #[error("batch inválido: {0}")]
    InvalidBatch(String),
    #[error("el pipeline no produjo salida")]
    MissingOutput,
}

/// Corre el pipeline completo sobre el engine de eventos y devuelve el id
/// del batch, la salida fusionada y el event log de la corrida.
pub fn run_batch<E, R>(event_store: E,
                       repository: R,
                       registry: Arc<dyn ArtifactRegistry>,
                       writer: Option<Arc<dyn ModuleWriter>>,
                       raw: &str,
                       raw_url_base: &str)
                       -> Result<(Uuid, OutputBatch, Vec<BatchEvent>), DriverError>
    where E: EventStore,
          R: BatchRepository
{
    let publish = match writer {
        Some(w) => PublishStep::with_writer(registry, w),
        None => PublishStep::new(registry),
    };
    let mut engine = BatchEngine::builder(event_store, repository).first_step(LoadBatchStep::new(raw))
                                                                  .add_step(ValidateBatchStep::new())
                                                                  .add_step(GenerateModulesStep::new())
                                                                  .add_step(publish)
                                                                  .build();
    engine.add_injector(Box::new(arch_core::injection::ConstInjector::new(
        serde_json::json!({ "raw_url_base": raw_url_base }),
    )));

    let batch_id = engine.run()?;
    let events = engine.events_for(batch_id);
    debug!("batch {batch_id} completado con {} eventos", events.len());

    let output = engine.final_artifact()
                       .and_then(|a| OutputBatch::from_artifact(&a).ok())
                       .ok_or(DriverError::MissingOutput)?;
    Ok((batch_id, output, events))
}

/// Variante con workers: validación y publicación secuenciales, generación
/// repartida con rayon. No emite eventos (sin engine); pensada para batches
/// grandes donde la trazabilidad por evento no hace falta.
pub fn run_batch_parallel(raw: &str,
                          registry: Arc<dyn ArtifactRegistry>,
                          writer: Option<Arc<dyn ModuleWriter>>,
                          raw_url_base: &str,
                          workers: usize)
                          -> Result<OutputBatch, DriverError> {
    let items: Vec<serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| DriverError::InvalidBatch(e.to_string()))?;

    let validated = match ValidateBatchStep::new().run_typed(Some(SpecBatch { items, schema_version: 1 }), ()) {
        StepRunResultTyped::Success { mut outputs } | StepRunResultTyped::SuccessWithSignals { mut outputs, .. } => {
            outputs.remove(0)
        }
        StepRunResultTyped::Failure { error } => return Err(DriverError::Engine(error)),
    };

    let generated = generate_parallel(&validated, workers);

    let publish = match writer {
        Some(w) => PublishStep::with_writer(registry, w),
        None => PublishStep::new(registry),
    };
    let params = PublishParams { raw_url_base: raw_url_base.to_string() };
    match publish.run_typed(Some(generated), params) {
        StepRunResultTyped::Success { mut outputs } => Ok(outputs.remove(0)),
        StepRunResultTyped::SuccessWithSignals { mut outputs, .. } => Ok(outputs.remove(0)),
        StepRunResultTyped::Failure { error } => Err(DriverError::Engine(error)),
    }
}

/// Fase de generación con par_iter: cada item es independiente; el índice
/// del batch es de sólo lectura compartida.
fn generate_parallel(batch: &ValidatedBatch, workers: usize) -> GeneratedBatch {
    let index = BatchIndex::from_items(&batch.valid);

    let run = || {
        batch.valid
             .par_iter()
             .map(|item| {
                 let prefix = item.spec.layer.split('/').next().unwrap_or("");
                 route(prefix).and_then(|g| g.generate(item, &index))
                              .map(|module| GeneratedItem { index: item.index,
                                                            class_name: item.spec.class_name.clone(),
                                                            module })
                              .map_err(|error| RejectedItem { index: item.index,
                                                              class_name: item.spec.class_name.clone(),
                                                              error })
             })
             .collect::<Vec<_>>()
    };

    let results = if workers > 0 {
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                log::warn!("no se pudo crear el pool de {workers} workers ({e}); uso el global");
                run()
            }
        }
    } else {
        run()
    };

    let mut generated = Vec::new();
    let mut rejected = batch.rejected.clone();
    for r in results {
        match r {
            Ok(item) => generated.push(item),
            Err(rej) => rejected.push(rej),
        }
    }
    // Orden estable por posición original, independiente del scheduling.
    generated.sort_by_key(|g| g.index);
    rejected.sort_by_key(|r| r.index);

    GeneratedBatch { originals: batch.originals.clone(),
                     generated,
                     rejected,
                     schema_version: 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch_core::registry::InMemoryArtifactRegistry;
    use arch_core::{InMemoryBatchRepository, InMemoryEventStore};

    const DEMO_BATCH: &str = r#"[
        { "class_name": "Cart", "layer": "domain/entity", "type": "entity",
          "attributes": ["userId: str"],
          "methods": [{ "method_name": "addItem", "parameters": ["productId: str", "quantity: int"] }] },
        { "class_name": "ICartRepository", "layer": "application/interface", "type": "interface",
          "methods": [{ "method_name": "getCart", "parameters": ["userId: str"], "return_type": "json" }] },
        { "class_name": "AddToCartUseCase", "layer": "application/use_case", "type": "use_case",
          "dependencies": ["ICartRepository"],
          "methods": [{ "method_name": "addToCart", "parameters": ["userId: str"] }] }
    ]"#;

    #[test]
    fn sequential_and_parallel_drivers_agree() {
        let reg_a = Arc::new(InMemoryArtifactRegistry::new());
        let (_, out_seq, _) = run_batch(InMemoryEventStore::default(),
                                        InMemoryBatchRepository::new(),
                                        reg_a.clone(),
                                        None,
                                        DEMO_BATCH,
                                        "https://host/repo")
            .unwrap();

        let reg_b = Arc::new(InMemoryArtifactRegistry::new());
        let out_par = run_batch_parallel(DEMO_BATCH, reg_b.clone(), None, "https://host/repo", 2).unwrap();

        assert_eq!(out_seq.items, out_par.items);
        assert_eq!(reg_a.snapshot(), reg_b.snapshot());
    }

    #[test]
    fn parallel_driver_registers_every_item_once() {
        let registry = Arc::new(InMemoryArtifactRegistry::new());
        let out = run_batch_parallel(DEMO_BATCH, registry.clone(), None, "https://host/repo", 4).unwrap();
        assert_eq!(out.items.len(), 3);
        assert_eq!(registry.len(), 3);
        assert!(out.items.iter().all(|i| i.get("code_path").is_some()));
    }

    #[test]
    fn invalid_json_is_a_driver_error() {
        let registry = Arc::new(InMemoryArtifactRegistry::new());
        assert!(matches!(run_batch_parallel("nope", registry, None, "b", 1),
                         Err(DriverError::InvalidBatch(_))));
    }
}

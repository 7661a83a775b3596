//! Core BatchEngine implementation

use crate::engine::EngineBuilderInit;
use crate::errors::CoreEngineError;
use crate::event::{BatchEventKind, EventStore};
use crate::hashing::hash_value;
use crate::injection::CompositeInjector;
use crate::model::{Artifact, ExecutionContext};
use crate::repo::{BatchRepository, PipelineDefinition};
use crate::step::ItemSignal;
use crate::StepDefinition;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

/// Motor de ejecución de batches de generación deterministas.
///
/// Responsable de orquestar la ejecución de pasos, mantener el estado
/// interno y garantizar el determinismo mediante fingerprints: el mismo
/// batch con los mismos params produce los mismos hashes de artefactos y el
/// mismo fingerprint agregado (idempotencia de re-ejecución).
pub struct BatchEngine<E, R>
    where E: EventStore,
          R: BatchRepository
{
    event_store: E,
    repository: R,
    artifact_store: HashMap<String, Artifact>,
    injectors: Vec<Box<dyn crate::injection::ParamInjector>>,
    default_batch_id: Option<Uuid>,
    pub(crate) default_definition: Option<PipelineDefinition>,
}

impl<E, R> BatchEngine<E, R>
    where E: EventStore,
          R: BatchRepository
{
    /// Crea un nuevo builder para configurar el engine
    #[inline]
    pub fn builder(event_store: E, repository: R) -> EngineBuilderInit<E, R> {
        EngineBuilderInit { event_store, repository }
    }

    /// Crea un nuevo motor con los stores proporcionados
    pub fn new_with_stores(event_store: E, repository: R) -> Self {
        Self { event_store,
               repository,
               artifact_store: HashMap::new(),
               injectors: Vec::new(),
               default_batch_id: None,
               default_definition: None }
    }

    /// Añade un inyector de parámetros (configuración del composition root).
    pub fn add_injector(&mut self, injector: Box<dyn crate::injection::ParamInjector>) {
        self.injectors.push(injector);
    }

    /// Recupera un artifact por su hash
    pub fn get_artifact(&self, hash: &str) -> Option<&Artifact> {
        self.artifact_store.get(hash)
    }

    /// Almacena un artifact en la cache local
    pub fn store_artifact(&mut self, artifact: Artifact) {
        self.artifact_store.insert(artifact.hash.clone(), artifact);
    }

    /// Ensure a BatchInitialized event exists and return the current events
    /// for the batch (including the possibly newly appended one).
    fn load_or_init(&mut self, batch_id: Uuid, definition: &PipelineDefinition) -> Vec<crate::event::BatchEvent> {
        let mut events = self.event_store.list(batch_id);
        let has_init = events.iter().any(|e| matches!(e.kind, BatchEventKind::BatchInitialized { .. }));
        if !has_init {
            let ev = self.event_store
                         .append_kind(batch_id,
                                      BatchEventKind::BatchInitialized { definition_hash: definition.definition_hash.clone(),
                                                                         step_count: definition.len() });
            events.push(ev);
        }
        self.default_batch_id = Some(batch_id);
        events
    }

    /// Define/genera un `batch_id` por defecto si no existe aún y lo retorna.
    pub fn ensure_default_batch_id(&mut self) -> Uuid {
        if self.default_batch_id.is_none() {
            self.default_batch_id = Some(Uuid::new_v4());
        }
        self.default_batch_id.unwrap()
    }

    /// Fija explícitamente un `batch_id` por defecto.
    pub fn set_default_batch_id(&mut self, batch_id: Uuid) {
        self.default_batch_id = Some(batch_id);
    }

    /// Obtiene el `batch_id` por defecto si está configurado.
    pub fn default_batch_id(&self) -> Option<Uuid> {
        self.default_batch_id
    }

    fn hash_and_store_outputs(&mut self, outputs: &mut [Artifact]) -> Vec<String> {
        let mut hashes: Vec<String> = Vec::with_capacity(outputs.len());
        for o in outputs.iter_mut() {
            let h = hash_value(&o.payload);
            o.hash = h.clone();
            self.store_artifact(o.clone());
            hashes.push(h);
        }
        hashes
    }

    /// Ejecuta el batch completo y retorna su ID.
    pub fn run(&mut self) -> Result<Uuid, CoreEngineError> {
        self.run_to_completion()
    }

    /// Avanza un paso en la ejecución del batch.
    pub fn step(&mut self) -> Result<(), CoreEngineError> {
        self.next()
    }

    /// Configura la definición por defecto del pipeline.
    pub fn set_default_definition(&mut self, definition: PipelineDefinition) {
        self.default_definition = Some(definition);
    }

    /// Obtiene los eventos del batch actual.
    pub fn get_events(&self) -> Option<Vec<crate::event::BatchEvent>> {
        self.events()
    }

    /// Lista eventos de un batch arbitrario.
    pub fn events_for(&self, batch_id: Uuid) -> Vec<crate::event::BatchEvent> {
        self.event_store.list(batch_id)
    }

    /// Ejecuta el batch completo usando la definición por defecto.
    pub fn run_to_completion(&mut self) -> Result<Uuid, CoreEngineError> {
        let batch_id = self.ensure_default_batch_id();
        let def = self.default_definition
                      .take()
                      .ok_or_else(|| CoreEngineError::Internal("no default definition configured".into()))?;

        let result = self.run_batch_to_completion(batch_id, &def);
        self.default_definition = Some(def);
        result
    }

    /// Ejecuta un batch específico hasta su finalización.
    pub fn run_batch_to_completion(&mut self, batch_id: Uuid, definition: &PipelineDefinition) -> Result<Uuid, CoreEngineError> {
        loop {
            match self.next_with(batch_id, definition) {
                Ok(()) => continue,
                Err(CoreEngineError::BatchCompleted) => return Ok(batch_id),
                Err(e) => return Err(e),
            }
        }
    }

    /// Ejecuta un paso específico del batch.
    pub fn next_with(&mut self, batch_id: Uuid, definition: &PipelineDefinition) -> Result<(), CoreEngineError> {
        let events = self.load_or_init(batch_id, definition);
        let instance = self.repository.load(batch_id, &events, definition);

        if instance.completed {
            return Err(CoreEngineError::BatchCompleted);
        }
        if instance.steps.iter().any(|s| matches!(s.status, crate::step::StepStatus::Failed)) {
            return Err(CoreEngineError::BatchHasFailed);
        }

        let cursor = instance.cursor;
        if cursor >= definition.len() {
            return Err(CoreEngineError::BatchCompleted);
        }

        let step_def = &definition.steps[cursor];
        let input = if cursor == 0 {
            None
        } else {
            instance.steps
                    .get(cursor - 1)
                    .and_then(|s| s.outputs.first())
                    .and_then(|h| self.artifact_store.get(h).cloned())
        };

        // Params efectivos: base del step + inyectores del composition root.
        let base_ctx = ExecutionContext { input,
                                          params: step_def.base_params() };
        let params = CompositeInjector::apply_injectors(&self.injectors, &base_ctx.params, &base_ctx);
        let ctx = ExecutionContext { input: base_ctx.input,
                                     params };

        let _started = self.event_store.append_kind(batch_id,
                                                    BatchEventKind::StepStarted { step_index: cursor,
                                                                                  step_id: step_def.id().to_string() });

        let run_res = step_def.run(&ctx);

        match run_res {
            crate::step::StepRunResult::Success { outputs } => {
                self.handle_step_success(batch_id, cursor, step_def.as_ref(), outputs, Vec::new(), &ctx.params, definition)
            }
            crate::step::StepRunResult::SuccessWithSignals { outputs, signals } => {
                self.handle_step_success(batch_id, cursor, step_def.as_ref(), outputs, signals, &ctx.params, definition)
            }
            crate::step::StepRunResult::Failure { error } => {
                self.handle_step_failure(batch_id, cursor, step_def.as_ref(), &ctx.params, error)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_step_success(&mut self,
                           batch_id: Uuid,
                           cursor: usize,
                           step_def: &dyn StepDefinition,
                           mut outputs: Vec<Artifact>,
                           signals: Vec<ItemSignal>,
                           params: &serde_json::Value,
                           definition: &PipelineDefinition)
                           -> Result<(), CoreEngineError> {
        let output_hashes = self.hash_and_store_outputs(&mut outputs);

        // Items rechazados: falla parcial registrada, el batch continúa.
        for s in signals {
            let _ = self.event_store.append_kind(batch_id,
                                                 BatchEventKind::ItemRejected { step_index: cursor,
                                                                                step_id: step_def.id().to_string(),
                                                                                class_name: s.class_name,
                                                                                error: s.error });
        }

        let fp = self.calculate_step_fingerprint(cursor, step_def, &output_hashes, params, definition);

        let _finished = self.event_store.append_kind(batch_id,
                                                     BatchEventKind::StepFinished { step_index: cursor,
                                                                                    step_id: step_def.id().to_string(),
                                                                                    outputs: output_hashes.clone(),
                                                                                    fingerprint: fp.clone() });

        if cursor + 1 == definition.len() {
            self.complete_batch(batch_id, definition);
        }

        Ok(())
    }

    fn handle_step_failure(&mut self,
                           batch_id: Uuid,
                           cursor: usize,
                           step_def: &dyn StepDefinition,
                           params: &serde_json::Value,
                           error: CoreEngineError)
                           -> Result<(), CoreEngineError> {
        let fp_json = json!({
            "engine_version": crate::constants::ENGINE_VERSION,
            "definition_hash": step_def.definition_hash(),
            "step_index": cursor,
            "params": params,
        });
        let fp = hash_value(&fp_json);

        let _ = self.event_store.append_kind(batch_id,
                                             BatchEventKind::StepFailed { step_index: cursor,
                                                                          step_id: step_def.id().to_string(),
                                                                          error: error.clone(),
                                                                          fingerprint: fp });

        Err(error)
    }

    fn calculate_step_fingerprint(&self,
                                  _cursor: usize,
                                  step_def: &dyn StepDefinition,
                                  output_hashes: &[String],
                                  params: &serde_json::Value,
                                  definition: &PipelineDefinition)
                                  -> String {
        let fp_input = crate::model::StepFingerprintInput { engine_version: crate::constants::ENGINE_VERSION,
                                                            step_id: step_def.id(),
                                                            output_hashes,
                                                            params,
                                                            definition_hash: &definition.definition_hash };
        let fp_json = serde_json::to_value(&fp_input).expect("serialize fingerprint input");
        hash_value(&fp_json)
    }

    fn complete_batch(&mut self, batch_id: Uuid, definition: &PipelineDefinition) {
        let events = self.event_store.list(batch_id);
        let step_fps: Vec<String> = events.iter()
                                          .filter_map(|e| match &e.kind {
                                              BatchEventKind::StepFinished { fingerprint, .. } => Some(fingerprint.clone()),
                                              _ => None,
                                          })
                                          .collect();

        let batch_fp = hash_value(&json!({
                                      "engine_version": crate::constants::ENGINE_VERSION,
                                      "definition_hash": definition.definition_hash,
                                      "step_fingerprints": step_fps
                                  }));

        let _ = self.event_store
                    .append_kind(batch_id, BatchEventKind::BatchCompleted { batch_fingerprint: batch_fp });
    }

    /// Avanza un paso en el batch por defecto.
    pub fn next(&mut self) -> Result<(), CoreEngineError> {
        let batch_id = self.ensure_default_batch_id();
        let def = self.default_definition
                      .take()
                      .ok_or_else(|| CoreEngineError::Internal("no default definition configured".into()))?;

        let res = self.next_with(batch_id, &def);
        self.default_definition = Some(def);
        res
    }

    /// Lista eventos del batch por defecto.
    pub fn events(&self) -> Option<Vec<crate::event::BatchEvent>> {
        self.default_batch_id.map(|bid| self.event_store.list(bid))
    }

    /// Variante compacta de eventos para el batch por defecto.
    pub fn event_variants(&self) -> Option<Vec<&'static str>> {
        self.events().map(|events| {
                         events.iter()
                               .map(|e| match e.kind {
                                   BatchEventKind::BatchInitialized { .. } => "I",
                                   BatchEventKind::StepStarted { .. } => "S",
                                   BatchEventKind::StepFinished { .. } => "F",
                                   BatchEventKind::StepFailed { .. } => "X",
                                   BatchEventKind::ItemRejected { .. } => "R",
                                   BatchEventKind::BatchCompleted { .. } => "C",
                               })
                               .collect()
                     })
    }

    /// Fingerprint del batch por defecto si está presente.
    pub fn batch_fingerprint(&self) -> Option<String> {
        let evs = self.events()?;
        evs.iter().rev().find_map(|e| match &e.kind {
                            BatchEventKind::BatchCompleted { batch_fingerprint } => Some(batch_fingerprint.clone()),
                            _ => None,
                        })
    }

    /// Artefacto final del batch por defecto (output del último step), si el
    /// batch completó.
    pub fn final_artifact(&self) -> Option<Artifact> {
        let evs = self.events()?;
        let last_outputs = evs.iter().rev().find_map(|e| match &e.kind {
                                               BatchEventKind::StepFinished { outputs, .. } => Some(outputs.clone()),
                                               _ => None,
                                           })?;
        last_outputs.first().and_then(|h| self.artifact_store.get(h).cloned())
    }
}

impl BatchEngine<crate::event::InMemoryEventStore, crate::repo::InMemoryBatchRepository> {
    /// Crea un nuevo engine con stores en memoria
    #[inline]
    pub fn new() -> EngineBuilderInit<crate::event::InMemoryEventStore, crate::repo::InMemoryBatchRepository> {
        EngineBuilderInit { event_store: crate::event::InMemoryEventStore::default(),
                            repository: crate::repo::InMemoryBatchRepository::new() }
    }
}

impl Default for BatchEngine<crate::event::InMemoryEventStore, crate::repo::InMemoryBatchRepository> {
    fn default() -> Self {
        Self::new_with_stores(crate::event::InMemoryEventStore::default(),
                              crate::repo::InMemoryBatchRepository::new())
    }
}

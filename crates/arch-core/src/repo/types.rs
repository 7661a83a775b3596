//! Tipos de repositorio: estado reconstruido (BatchInstance) y definición
//! (PipelineDefinition).
//!
//! El repositorio aplica un replay lineal: consume eventos en orden y
//! actualiza un `BatchInstance` inmutable por evento. No almacena artifacts
//! completos (sólo hashes) para mantener neutralidad.
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::event::{BatchEvent, BatchEventKind};
use crate::step::{StepDefinition, StepStatus};

pub struct BatchInstance {
    pub id: Uuid,
    pub steps: Vec<StepSlot>,
    pub cursor: usize,
    pub completed: bool,
    /// Items rechazados acumulados durante el replay (class_name por step).
    pub rejected_items: Vec<String>,
}

/// Estado de un step en la instancia.
pub struct StepSlot {
    pub step_id: String,
    pub status: StepStatus,
    pub fingerprint: Option<String>,
    pub outputs: Vec<String>, // sólo hashes (los Artifacts viven en el engine)
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub attempts: u32,
}

/// Trait para reconstruir (`replay`) estado de un batch a partir de eventos.
pub trait BatchRepository {
    fn load(&self, batch_id: Uuid, events: &[BatchEvent], definition: &PipelineDefinition) -> BatchInstance;
}

/// Definición inmutable del pipeline de generación.
pub struct PipelineDefinition {
    pub steps: Vec<Box<dyn StepDefinition>>,
    pub definition_hash: String,
}

impl PipelineDefinition {
    pub fn new(steps: Vec<Box<dyn StepDefinition>>, definition_hash: String) -> Self {
        Self { steps, definition_hash }
    }
    pub fn len(&self) -> usize {
        self.steps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

pub struct InMemoryBatchRepository;
impl InMemoryBatchRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InMemoryBatchRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchRepository for InMemoryBatchRepository {
    fn load(&self, batch_id: Uuid, events: &[BatchEvent], definition: &PipelineDefinition) -> BatchInstance {
        let mut steps: Vec<StepSlot> = definition.steps
                                                 .iter()
                                                 .map(|s| StepSlot { step_id: s.id().to_string(),
                                                                     status: StepStatus::Pending,
                                                                     fingerprint: None,
                                                                     outputs: vec![],
                                                                     started_at: None,
                                                                     finished_at: None,
                                                                     attempts: 0 })
                                                 .collect();
        let mut completed = false;
        let mut rejected_items: Vec<String> = Vec::new();
        for ev in events {
            match &ev.kind {
                BatchEventKind::BatchInitialized { .. } => {}
                BatchEventKind::StepStarted { step_index, .. } => {
                    if let Some(slot) = steps.get_mut(*step_index) {
                        slot.status = StepStatus::Running;
                        slot.started_at = Some(ev.ts);
                        slot.attempts += 1;
                    }
                }
                BatchEventKind::StepFinished { step_index,
                                               fingerprint,
                                               outputs,
                                               .. } => {
                    if let Some(slot) = steps.get_mut(*step_index) {
                        slot.status = StepStatus::FinishedOk;
                        slot.fingerprint = Some(fingerprint.clone());
                        slot.outputs = outputs.clone();
                        slot.finished_at = Some(ev.ts);
                    }
                }
                BatchEventKind::StepFailed { step_index, fingerprint, .. } => {
                    if let Some(slot) = steps.get_mut(*step_index) {
                        slot.status = StepStatus::Failed;
                        slot.fingerprint = Some(fingerprint.clone());
                        slot.finished_at = Some(ev.ts);
                    }
                }
                BatchEventKind::ItemRejected { class_name, .. } => {
                    rejected_items.push(class_name.clone());
                }
                BatchEventKind::BatchCompleted { .. } => completed = true,
            }
        }
        let cursor = steps.iter()
                          .position(|s| matches!(s.status, StepStatus::Pending))
                          .unwrap_or(steps.len());
        BatchInstance { id: batch_id,
                        steps,
                        cursor,
                        completed,
                        rejected_items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ev(seq: u64, batch_id: Uuid, kind: BatchEventKind) -> BatchEvent {
        BatchEvent { seq,
                     batch_id,
                     kind,
                     ts: Utc::now() }
    }

    #[derive(Debug)]
    struct NoopStep(&'static str);
    impl StepDefinition for NoopStep {
        fn id(&self) -> &str {
            self.0
        }
        fn base_params(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
        fn run(&self, _ctx: &crate::model::ExecutionContext) -> crate::step::StepRunResult {
            crate::step::StepRunResult::Success { outputs: vec![] }
        }
        fn kind(&self) -> crate::step::StepKind {
            crate::step::StepKind::Transform
        }
    }

    #[test]
    fn replay_reconstructs_cursor_and_rejections() {
        let batch_id = Uuid::new_v4();
        let def = build_pipeline_definition(&["a", "b"],
                                            vec![Box::new(NoopStep("a")), Box::new(NoopStep("b"))]);
        let events = vec![ev(0, batch_id, BatchEventKind::BatchInitialized { definition_hash: def.definition_hash.clone(), step_count: 2 }),
                          ev(1, batch_id, BatchEventKind::StepStarted { step_index: 0, step_id: "a".into() }),
                          ev(2, batch_id, BatchEventKind::ItemRejected { step_index: 0,
                                                                         step_id: "a".into(),
                                                                         class_name: "Broken".into(),
                                                                         error: serde_json::json!({"kind": "schema"}) }),
                          ev(3, batch_id, BatchEventKind::StepFinished { step_index: 0,
                                                                        step_id: "a".into(),
                                                                        outputs: vec!["h1".into()],
                                                                        fingerprint: "fp1".into() })];

        let instance = InMemoryBatchRepository::new().load(batch_id, &events, &def);
        assert_eq!(instance.cursor, 1, "el siguiente step pendiente es 'b'");
        assert!(!instance.completed);
        assert_eq!(instance.steps[0].status, StepStatus::FinishedOk);
        assert_eq!(instance.steps[0].outputs, vec!["h1".to_string()]);
        assert_eq!(instance.rejected_items, vec!["Broken".to_string()]);
    }
}

pub fn build_pipeline_definition(step_ids: &[&str], steps: Vec<Box<dyn StepDefinition>>) -> PipelineDefinition {
    use crate::hashing::{hash_str, to_canonical_json};
    use serde_json::json;
    let ids_json = json!(step_ids);
    let canonical = to_canonical_json(&ids_json);
    let definition_hash = hash_str(&canonical);
    PipelineDefinition::new(steps, definition_hash)
}

/// Builder alternativo: recibe directamente los steps y extrae sus ids en
/// orden. Evita mantener a mano el arreglo `step_ids`.
pub fn build_pipeline_definition_auto(steps: Vec<Box<dyn StepDefinition>>) -> PipelineDefinition {
    let ids: Vec<String> = steps.iter().map(|s| s.id().to_string()).collect();
    let id_refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
    build_pipeline_definition(&id_refs, steps)
}

//! El estado durable (event log + registro) debe sobrevivir entre procesos
//! manteniendo la contabilidad de idempotencia.

use std::sync::Arc;

use arch_core::registry::ArtifactRegistry;
use arch_core::InMemoryBatchRepository;
use arch_persistence::{FileArtifactRegistry, FileEventStore};
use archflow_rust::run_batch;
use serde_json::json;

#[test]
fn registry_survives_across_runs_without_duplication() {
    let dir = tempfile::tempdir().unwrap();
    let raw = json!([
        { "class_name": "Cart", "layer": "domain/entity", "type": "entity",
          "attributes": ["userId: str"] },
    ]).to_string();

    for _ in 0..2 {
        let event_store = FileEventStore::open(dir.path()).unwrap();
        let registry: Arc<dyn ArtifactRegistry> = Arc::new(FileArtifactRegistry::open(dir.path()).unwrap());
        run_batch(event_store,
                  InMemoryBatchRepository::new(),
                  registry,
                  None,
                  &raw,
                  "https://host/repo").expect("corrida");
    }

    let reopened = FileArtifactRegistry::open(dir.path()).unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.get("Cart").unwrap().code_path.as_deref(),
               Some("src/domain/entities/cart.ts"));
}

#[test]
fn event_log_accumulates_batches_in_append_order() {
    let dir = tempfile::tempdir().unwrap();
    let raw = json!([
        { "class_name": "Order", "layer": "domain/entity", "type": "entity" },
    ]).to_string();

    let mut batch_ids = Vec::new();
    for _ in 0..2 {
        let event_store = FileEventStore::open(dir.path()).unwrap();
        let registry: Arc<dyn ArtifactRegistry> = Arc::new(FileArtifactRegistry::open(dir.path()).unwrap());
        let (batch_id, _, _) = run_batch(event_store,
                                         InMemoryBatchRepository::new(),
                                         registry,
                                         None,
                                         &raw,
                                         "https://host/repo").expect("corrida");
        batch_ids.push(batch_id);
    }

    let store = FileEventStore::open(dir.path()).unwrap();
    for id in batch_ids {
        let events = arch_core::EventStore::list(&store, id);
        assert!(!events.is_empty(), "cada batch conserva su event log");
        assert!(events.windows(2).all(|w| w[0].seq < w[1].seq), "orden por seq");
    }
}

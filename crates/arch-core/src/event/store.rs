use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use super::{BatchEvent, BatchEventKind};

/// Almacenamiento de eventos append-only.
pub trait EventStore {
    /// Agrega un evento a partir de su kind y devuelve el evento completo
    /// (con seq y ts).
    fn append_kind(&mut self, batch_id: Uuid, kind: BatchEventKind) -> BatchEvent;
    /// Lista eventos de un batch (orden ascendente por seq).
    fn list(&self, batch_id: Uuid) -> Vec<BatchEvent>;
}

pub struct InMemoryEventStore { pub inner: HashMap<Uuid, Vec<BatchEvent>> }

impl Default for InMemoryEventStore { fn default() -> Self { Self { inner: HashMap::new() } } }

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, batch_id: Uuid, kind: BatchEventKind) -> BatchEvent {
        let vec = self.inner.entry(batch_id).or_insert_with(Vec::new);
        let seq = vec.len() as u64;
        let ev = BatchEvent { seq, batch_id, kind, ts: Utc::now() };
        vec.push(ev.clone());
        ev
    }
    fn list(&self, batch_id: Uuid) -> Vec<BatchEvent> { self.inner.get(&batch_id).cloned().unwrap_or_default() }
}

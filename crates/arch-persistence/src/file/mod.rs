//! Stores sobre filesystem.
//!
//! - `FileEventStore`: event log append-only en JSONL (`events.jsonl`), un
//!   evento serializado por línea. Al abrir se hace replay completo del
//!   archivo a cache; `append_kind` escribe la línea y actualiza la cache.
//!   Paridad con el backend en memoria: `list` devuelve el mismo orden.
//! - `FileArtifactRegistry`: registro `class_name -> rutas` en
//!   `registry.json`, persistido con reemplazo atómico (archivo temporal +
//!   rename) en cada upsert. Sobrevive entre batches sólo para la
//!   contabilidad de idempotencia.
//! - `FsModuleWriter`: colaborador `(path, content)` que materializa los
//!   módulos generados bajo una raíz de salida.

use chrono::Utc;
use indexmap::IndexMap;
use log::{error, warn};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

use arch_core::event::{BatchEvent, BatchEventKind, EventStore};
use arch_core::registry::{ArtifactPaths, ArtifactRegistry, ModuleWriter};

use crate::error::PersistenceError;

const EVENTS_FILE: &str = "events.jsonl";
const REGISTRY_FILE: &str = "registry.json";

/// Escritura atómica: archivo temporal en el mismo directorio + rename.
fn atomic_write(path: &Path, content: &str) -> Result<(), PersistenceError> {
    let tmp = path.with_extension("tmp");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(content.as_bytes())?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

// ---------------------------------------------------------------
// Event log
// ---------------------------------------------------------------

pub struct FileEventStore {
    path: PathBuf,
    cache: HashMap<Uuid, Vec<BatchEvent>>,
    next_seq: HashMap<Uuid, u64>,
}

impl FileEventStore {
    /// Abre (o crea) el event log bajo `state_dir` y reconstruye la cache.
    pub fn open(state_dir: &Path) -> Result<Self, PersistenceError> {
        fs::create_dir_all(state_dir)?;
        let path = state_dir.join(EVENTS_FILE);
        let mut cache: HashMap<Uuid, Vec<BatchEvent>> = HashMap::new();
        let mut next_seq: HashMap<Uuid, u64> = HashMap::new();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            for (n, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let ev: BatchEvent = serde_json::from_str(line)
                    .map_err(|e| PersistenceError::Corrupt(format!("events.jsonl línea {}: {e}", n + 1)))?;
                let seq = next_seq.entry(ev.batch_id).or_insert(0);
                *seq = (*seq).max(ev.seq + 1);
                cache.entry(ev.batch_id).or_default().push(ev);
            }
        }
        Ok(Self { path, cache, next_seq })
    }

    fn persist_line(&self, ev: &BatchEvent) {
        let line = match serde_json::to_string(ev) {
            Ok(l) => l,
            Err(e) => {
                error!("event serialize failed: {e}");
                return;
            }
        };
        let result = fs::OpenOptions::new().create(true)
                                           .append(true)
                                           .open(&self.path)
                                           .and_then(|mut f| writeln!(f, "{line}"));
        if let Err(e) = result {
            // El evento queda en cache; el próximo append volverá a intentar
            // abrir el archivo. Durabilidad best-effort con registro del
            // problema.
            warn!("event append failed (kept in memory): {e}");
        }
    }
}

impl EventStore for FileEventStore {
    fn append_kind(&mut self, batch_id: Uuid, kind: BatchEventKind) -> BatchEvent {
        let seq_ref = self.next_seq.entry(batch_id).or_insert(0);
        let ev = BatchEvent { seq: *seq_ref,
                              batch_id,
                              kind,
                              ts: Utc::now() };
        *seq_ref += 1;
        self.persist_line(&ev);
        self.cache.entry(batch_id).or_default().push(ev.clone());
        ev
    }

    fn list(&self, batch_id: Uuid) -> Vec<BatchEvent> {
        self.cache.get(&batch_id).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------
// Registro de artefactos
// ---------------------------------------------------------------

pub struct FileArtifactRegistry {
    path: PathBuf,
    inner: Mutex<IndexMap<String, ArtifactPaths>>,
}

impl FileArtifactRegistry {
    /// Abre (o crea) el registro bajo `state_dir`.
    pub fn open(state_dir: &Path) -> Result<Self, PersistenceError> {
        fs::create_dir_all(state_dir)?;
        let path = state_dir.join(REGISTRY_FILE);
        let inner: IndexMap<String, ArtifactPaths> = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                IndexMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            IndexMap::new()
        };
        Ok(Self { path,
                  inner: Mutex::new(inner) })
    }

    fn persist(&self, map: &IndexMap<String, ArtifactPaths>) {
        match serde_json::to_string_pretty(map) {
            Ok(content) => {
                if let Err(e) = atomic_write(&self.path, &content) {
                    warn!("registry persist failed (kept in memory): {e}");
                }
            }
            Err(e) => error!("registry serialize failed: {e}"),
        }
    }
}

impl ArtifactRegistry for FileArtifactRegistry {
    fn upsert(&self, class_name: &str, paths: ArtifactPaths) {
        let mut map = self.inner.lock().expect("registry lock");
        map.insert(class_name.to_string(), paths);
        self.persist(&map);
    }

    fn get(&self, class_name: &str) -> Option<ArtifactPaths> {
        self.inner.lock().expect("registry lock").get(class_name).cloned()
    }

    fn snapshot(&self) -> Vec<(String, ArtifactPaths)> {
        self.inner
            .lock()
            .expect("registry lock")
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------
// Escritor de módulos
// ---------------------------------------------------------------

pub struct FsModuleWriter {
    root: PathBuf,
}

impl FsModuleWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ModuleWriter for FsModuleWriter {
    fn write(&self, path: &str, content: &str) -> Result<(), std::io::Error> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch_core::event::BatchEventKind;

    #[test]
    fn event_store_survives_reopen_with_same_order() {
        let dir = tempfile::tempdir().unwrap();
        let batch_id = Uuid::new_v4();
        {
            let mut store = FileEventStore::open(dir.path()).unwrap();
            store.append_kind(batch_id,
                              BatchEventKind::BatchInitialized { definition_hash: "h".into(),
                                                                 step_count: 2 });
            store.append_kind(batch_id,
                              BatchEventKind::StepStarted { step_index: 0,
                                                            step_id: "load_batch".into() });
        }
        let store = FileEventStore::open(dir.path()).unwrap();
        let events = store.list(batch_id);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].seq, 0);
        assert_eq!(events[1].seq, 1);
        assert!(matches!(events[0].kind, BatchEventKind::BatchInitialized { .. }));
    }

    #[test]
    fn registry_round_trips_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let reg = FileArtifactRegistry::open(dir.path()).unwrap();
            reg.upsert("Cart",
                       ArtifactPaths { code_path: Some("src/domain/entities/cart.ts".into()),
                                       ..Default::default() });
        }
        let reg = FileArtifactRegistry::open(dir.path()).unwrap();
        assert_eq!(reg.get("Cart").unwrap().code_path.as_deref(), Some("src/domain/entities/cart.ts"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn registry_upsert_is_idempotent_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let reg = FileArtifactRegistry::open(dir.path()).unwrap();
        let paths = ArtifactPaths { code_path: Some("a.ts".into()), ..Default::default() };
        reg.upsert("Cart", paths.clone());
        reg.upsert("Cart", paths);
        drop(reg);
        let reopened = FileArtifactRegistry::open(dir.path()).unwrap();
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn corrupt_registry_is_reported_not_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(REGISTRY_FILE), "{ not json").unwrap();
        match FileArtifactRegistry::open(dir.path()) {
            Err(PersistenceError::Corrupt(_)) => {}
            Err(e) => panic!("se esperaba Corrupt, llegó {e:?}"),
            Ok(_) => panic!("un registro corrupto no debe abrir"),
        }
    }

    #[test]
    fn module_writer_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FsModuleWriter::new(dir.path());
        writer.write("src/domain/entities/cart.ts", "// cart").unwrap();
        let content = fs::read_to_string(dir.path().join("src/domain/entities/cart.ts")).unwrap();
        assert_eq!(content, "// cart");
    }
}

//! Puertos de salida del pipeline: registro de artefactos y escritor de
//! módulos.
//!
//! El registro mapea `class_name` -> rutas emitidas y es idempotente por
//! diseño: reenviar el mismo batch sobreescribe entradas, nunca duplica.
//! Persistir el registro entre batches (implementación en
//! `arch-persistence`) sólo sirve para esta contabilidad de idempotencia; el
//! core no guarda más estado mutable de larga vida.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Rutas/URLs emitidas para una clase generada.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactPaths {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_raw_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_raw_url: Option<String>,
}

/// Registro idempotente de artefactos generados.
///
/// Contrato:
/// - `upsert` sobreescribe por clave (`class_name`); una clave se procesa a
///   lo sumo una vez por batch, así que no hay carreras read-modify-write.
/// - `snapshot` devuelve las entradas en orden de primera inserción
///   (determinista entre re-ejecuciones idénticas).
pub trait ArtifactRegistry: Send + Sync {
    fn upsert(&self, class_name: &str, paths: ArtifactPaths);
    fn get(&self, class_name: &str) -> Option<ArtifactPaths>;
    fn snapshot(&self) -> Vec<(String, ArtifactPaths)>;
    fn len(&self) -> usize {
        self.snapshot().len()
    }
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Implementación en memoria sobre `IndexMap` (orden de inserción estable).
#[derive(Default)]
pub struct InMemoryArtifactRegistry {
    inner: Mutex<IndexMap<String, ArtifactPaths>>,
}

impl InMemoryArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactRegistry for InMemoryArtifactRegistry {
    fn upsert(&self, class_name: &str, paths: ArtifactPaths) {
        let mut map = self.inner.lock().expect("registry lock");
        map.insert(class_name.to_string(), paths);
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

/// Puerto del colaborador de escritura de módulos: `(path, content)`.
/// La implementación sobre filesystem vive en `arch-persistence`; el core y
/// los generadores sólo conocen este contrato.
pub trait ModuleWriter: Send + Sync {
    fn write(&self, path: &str, content: &str) -> Result<(), std::io::Error>;
}

/// Escritor en memoria para tests y dry-runs.
#[derive(Default)]
pub struct MemoryModuleWriter {
    pub written: Mutex<IndexMap<String, String>>,
}

impl MemoryModuleWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModuleWriter for MemoryModuleWriter {
    fn write(&self, path: &str, content: &str) -> Result<(), std::io::Error> {
        self.written
            .lock()
            .expect("writer lock")
            .insert(path.to_string(), content.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_overwrites_without_duplicating() {
        let reg = InMemoryArtifactRegistry::new();
        reg.upsert("Cart", ArtifactPaths { code_path: Some("a.ts".into()), ..Default::default() });
        reg.upsert("Cart", ArtifactPaths { code_path: Some("b.ts".into()), ..Default::default() });
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("Cart").unwrap().code_path.as_deref(), Some("b.ts"));
    }

    #[test]
    fn snapshot_preserves_first_insertion_order() {
        let reg = InMemoryArtifactRegistry::new();
        reg.upsert("B", ArtifactPaths::default());
        reg.upsert("A", ArtifactPaths::default());
        reg.upsert("B", ArtifactPaths::default()); // re-upsert no reordena
        let keys: Vec<String> = reg.snapshot().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["B".to_string(), "A".to_string()]);
    }
}

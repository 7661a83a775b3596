//! Artifacts tipados neutrales usados por los steps del pipeline.
//!
//! Estos tipos no introducen semántica en el core; sólo definen la forma del
//! `payload` JSON que se serializa a `arch_core::Artifact` con
//! `ArtifactKind::GenericJson` y un `schema_version` estable. El hash lo
//! calcula el engine a partir del payload canónico, lo que da idempotencia
//! de re-ejecución sin lógica extra aquí.

use arch_core::typed_artifact;
use arch_domain::{ClassSpec, NameSet};
use arch_policies::Violation;
use serde::{Deserialize, Serialize};

use crate::spec_error::SpecError;

// Batch crudo tal como llegó (un Value por item, sin interpretar).
typed_artifact!(SpecBatch { items: Vec<serde_json::Value> });

/// Item que superó validación de forma, políticas y resolución de nombres.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ValidatedItem {
    /// Posición original dentro del batch (para la fusión de salida).
    pub index: usize,
    pub spec: ClassSpec,
    pub names: NameSet,
    /// Violaciones advisorias (lint); nunca bloquean la generación.
    pub warnings: Vec<Violation>,
}

/// Item rechazado con su error estructurado.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RejectedItem {
    pub index: usize,
    /// Nombre de clase si pudo extraerse (para el log contra `class_name`).
    pub class_name: String,
    pub error: SpecError,
}

// Batch validado: originales + items válidos + rechazados.
typed_artifact!(ValidatedBatch {
    originals: Vec<serde_json::Value>,
    valid: Vec<ValidatedItem>,
    rejected: Vec<RejectedItem>,
});

/// Módulo generado para una clase: ruta + contenido de código y de test.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedModule {
    pub code_path: String,
    pub code: String,
    pub test_path: String,
    pub test: String,
}

/// Resultado de generación para un item.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeneratedItem {
    pub index: usize,
    pub class_name: String,
    pub module: GeneratedModule,
}

// Batch generado: originales + módulos + rechazados acumulados.
typed_artifact!(GeneratedBatch {
    originals: Vec<serde_json::Value>,
    generated: Vec<GeneratedItem>,
    rejected: Vec<RejectedItem>,
});

// Salida fusionada: el arreglo de entrada con campos de artefacto (o `error`)
// anexados por item.
typed_artifact!(OutputBatch { items: Vec<serde_json::Value> });

//! PublishStep (Sink)
//!
//! Cierra el pipeline:
//! - upsert idempotente de cada módulo generado en el `ArtifactRegistry`
//!   (clave: `class_name`; re-ejecutar el mismo batch sobreescribe, nunca
//!   duplica);
//! - derivación de raw URLs por templating puro (`{base}/{path}`);
//! - escritura opcional de los módulos a través del `ModuleWriter`
//!   inyectado (colaborador externo de IO);
//! - fusión de salida: el arreglo de entrada con los campos `code_path`,
//!   `code_raw_url`, `test_path`, `test_raw_url` anexados por item generado,
//!   o un objeto `error` estructurado para los rechazados.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arch_core::registry::{ArtifactPaths, ArtifactRegistry, ModuleWriter};
use arch_core::step::{StepKind, StepRunResultTyped, TypedStep};
use serde::{Deserialize, Serialize};

use crate::artifacts::{GeneratedBatch, OutputBatch};

/// Base por defecto del host de publicación de raw URLs.
pub const DEFAULT_RAW_URL_BASE: &str = "https://raw.githubusercontent.com/acme/shop-clean-arch/main";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublishParams {
    /// Base de las raw URLs; el composition root la inyecta desde config.
    pub raw_url_base: String,
}

impl Default for PublishParams {
    fn default() -> Self {
        Self { raw_url_base: DEFAULT_RAW_URL_BASE.to_string() }
    }
}

pub struct PublishStep {
    registry: Arc<dyn ArtifactRegistry>,
    writer: Option<Arc<dyn ModuleWriter>>,
}

impl PublishStep {
    pub fn new(registry: Arc<dyn ArtifactRegistry>) -> Self {
        Self { registry, writer: None }
    }

    /// Conecta el colaborador de escritura de módulos (composition root).
    pub fn with_writer(registry: Arc<dyn ArtifactRegistry>, writer: Arc<dyn ModuleWriter>) -> Self {
        Self { registry,
               writer: Some(writer) }
    }
}

impl fmt::Debug for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishStep")
         .field("registry_len", &self.registry.len())
         .field("has_writer", &self.writer.is_some())
         .finish()
    }
}

/// Templating puro de raw URL.
fn raw_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

impl TypedStep for PublishStep {
    type Params = PublishParams;
    type Input = GeneratedBatch;
    type Output = OutputBatch;

    fn id(&self) -> &'static str {
        "publish_batch"
    }

    fn kind(&self) -> StepKind {
        StepKind::Sink
    }

    fn run_typed(&self, input: Option<GeneratedBatch>, params: PublishParams) -> StepRunResultTyped<OutputBatch> {
        let batch = match input {
            Some(b) => b,
            None => {
                return StepRunResultTyped::Failure { error: arch_core::errors::CoreEngineError::MissingInputs }
            }
        };

        // 1) Registro idempotente + escritura opcional de módulos.
        let mut paths_by_class: HashMap<String, ArtifactPaths> = HashMap::new();
        for item in &batch.generated {
            let paths = ArtifactPaths { code_path: Some(item.module.code_path.clone()),
                                        code_raw_url: Some(raw_url(&params.raw_url_base, &item.module.code_path)),
                                        test_path: Some(item.module.test_path.clone()),
                                        test_raw_url: Some(raw_url(&params.raw_url_base, &item.module.test_path)) };
            self.registry.upsert(&item.class_name, paths.clone());
            paths_by_class.insert(item.class_name.clone(), paths);

            if let Some(writer) = &self.writer {
                if let Err(e) = writer.write(&item.module.code_path, &item.module.code) {
                    return StepRunResultTyped::Failure { error: arch_core::errors::CoreEngineError::Internal(format!("module write failed: {e}")) };
                }
                if let Err(e) = writer.write(&item.module.test_path, &item.module.test) {
                    return StepRunResultTyped::Failure { error: arch_core::errors::CoreEngineError::Internal(format!("test write failed: {e}")) };
                }
            }
        }

        // 2) Fusión de salida preservando el orden del batch de entrada.
        let mut errors_by_index: HashMap<usize, serde_json::Value> = HashMap::new();
        for r in &batch.rejected {
            errors_by_index.insert(r.index, serde_json::to_value(&r.error).unwrap_or_default());
        }

        let mut items = Vec::with_capacity(batch.originals.len());
        for (idx, original) in batch.originals.iter().enumerate() {
            let mut merged = original.clone();
            if let Some(err) = errors_by_index.get(&idx) {
                if let Some(obj) = merged.as_object_mut() {
                    obj.insert("error".to_string(), err.clone());
                }
            } else if let Some(class_name) = original.get("class_name").and_then(|v| v.as_str()) {
                if let Some(paths) = paths_by_class.get(class_name) {
                    if let Some(obj) = merged.as_object_mut() {
                        obj.insert("code_path".into(), paths.code_path.clone().into());
                        obj.insert("code_raw_url".into(), paths.code_raw_url.clone().into());
                        obj.insert("test_path".into(), paths.test_path.clone().into());
                        obj.insert("test_raw_url".into(), paths.test_raw_url.clone().into());
                    }
                }
            }
            items.push(merged);
        }

        StepRunResultTyped::Success { outputs: vec![OutputBatch { items, schema_version: 1 }] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{GeneratedItem, GeneratedModule, RejectedItem};
    use crate::spec_error::SpecError;
    use arch_core::registry::InMemoryArtifactRegistry;
    use serde_json::json;

    fn module(stem: &str) -> GeneratedModule {
        GeneratedModule { code_path: format!("src/domain/entities/{stem}.ts"),
                          code: format!("// {stem}"),
                          test_path: format!("tests/domain/entities/{stem}.test.ts"),
                          test: format!("// {stem} test") }
    }

    fn run(step: &PublishStep, batch: GeneratedBatch) -> OutputBatch {
        match step.run_typed(Some(batch), PublishParams::default()) {
            StepRunResultTyped::Success { mut outputs } => outputs.remove(0),
            _ => panic!("se esperaba Success"),
        }
    }

    #[test]
    fn merges_paths_and_urls_into_the_original_items() {
        let registry = Arc::new(InMemoryArtifactRegistry::new());
        let step = PublishStep::new(registry.clone());
        let out = run(&step,
                      GeneratedBatch { originals: vec![json!({ "class_name": "Cart", "layer": "domain/entity" })],
                                       generated: vec![GeneratedItem { index: 0,
                                                                       class_name: "Cart".into(),
                                                                       module: module("cart") }],
                                       rejected: vec![],
                                       schema_version: 1 });
        let item = &out.items[0];
        assert_eq!(item["code_path"], "src/domain/entities/cart.ts");
        assert_eq!(item["code_raw_url"],
                   format!("{DEFAULT_RAW_URL_BASE}/src/domain/entities/cart.ts"));
        assert_eq!(registry.get("Cart").unwrap().test_path.as_deref(),
                   Some("tests/domain/entities/cart.test.ts"));
    }

    #[test]
    fn rejected_items_carry_error_instead_of_paths() {
        let step = PublishStep::new(Arc::new(InMemoryArtifactRegistry::new()));
        let out = run(&step,
                      GeneratedBatch { originals: vec![json!({ "class_name": "Broken", "layer": "nope" })],
                                       generated: vec![],
                                       rejected: vec![RejectedItem { index: 0,
                                                                     class_name: "Broken".into(),
                                                                     error: SpecError::schema("layer desconocido", "layer") }],
                                       schema_version: 1 });
        let item = &out.items[0];
        assert!(item.get("error").is_some());
        assert!(item.get("code_path").is_none());
    }

    #[test]
    fn writer_receives_code_and_test_contents() {
        let registry = Arc::new(InMemoryArtifactRegistry::new());
        let writer = Arc::new(arch_core::registry::MemoryModuleWriter::new());
        let step = PublishStep::with_writer(registry, writer.clone());
        run(&step,
            GeneratedBatch { originals: vec![json!({ "class_name": "Cart" })],
                             generated: vec![GeneratedItem { index: 0,
                                                             class_name: "Cart".into(),
                                                             module: module("cart") }],
                             rejected: vec![],
                             schema_version: 1 });
        let written = writer.written.lock().unwrap();
        assert_eq!(written.len(), 2);
        assert!(written.contains_key("src/domain/entities/cart.ts"));
    }

    #[test]
    fn reruns_overwrite_registry_entries() {
        let registry = Arc::new(InMemoryArtifactRegistry::new());
        let step = PublishStep::new(registry.clone());
        let batch = GeneratedBatch { originals: vec![json!({ "class_name": "Cart" })],
                                     generated: vec![GeneratedItem { index: 0,
                                                                     class_name: "Cart".into(),
                                                                     module: module("cart") }],
                                     rejected: vec![],
                                     schema_version: 1 };
        run(&step, batch.clone());
        run(&step, batch);
        assert_eq!(registry.len(), 1);
    }
}

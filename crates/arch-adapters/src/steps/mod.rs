//! Steps del pipeline de generación: carga -> validación -> generación ->
//! publicación.
//!
//! Cada step es determinista respecto a input + params. Las fallas por item
//! (schema, naming, routing) se reportan como señales y quedan en el
//! artifact del batch; sólo un batch inutilizable (JSON de entrada
//! malformado) falla el step completo (stop-on-failure).

pub mod generate;
pub mod load;
pub mod publish;
pub mod validate;

pub use generate::GenerateModulesStep;
pub use load::LoadBatchStep;
pub use publish::{PublishParams, PublishStep, DEFAULT_RAW_URL_BASE};
pub use validate::ValidateBatchStep;

use std::sync::Arc;

use arch_core::registry::{ArtifactRegistry, ModuleWriter};
use arch_core::repo::PipelineDefinition;
use arch_core::Pipe;

/// Definición del pipeline estándar de generación, encadenada con chequeo
/// de compatibilidad de tipos en compilación:
/// load -> validate -> generate -> publish.
pub fn standard_pipeline(raw: &str,
                         registry: Arc<dyn ArtifactRegistry>,
                         writer: Option<Arc<dyn ModuleWriter>>)
                         -> PipelineDefinition {
    let publish = match writer {
        Some(w) => PublishStep::with_writer(registry, w),
        None => PublishStep::new(registry),
    };
    Pipe::new(LoadBatchStep::new(raw)).then(ValidateBatchStep::new())
                                      .then(GenerateModulesStep::new())
                                      .then(publish)
                                      .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch_core::registry::InMemoryArtifactRegistry;

    #[test]
    fn standard_pipeline_has_four_steps_in_order() {
        let registry: Arc<dyn ArtifactRegistry> = Arc::new(InMemoryArtifactRegistry::new());
        let def = standard_pipeline("[]", registry, None);
        let ids: Vec<&str> = def.steps.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["load_batch", "validate_batch", "generate_modules", "publish_batch"]);
        assert!(!def.definition_hash.is_empty());
    }
}

//! ValidateBatchStep (Check)
//!
//! Puerta de validación pura por item:
//! - campos requeridos (`class_name`, `layer`, `type`) y pertenencia de
//!   `layer` al conjunto enumerado;
//! - políticas de capas (convención de puertos, dirección de dependencias):
//!   las violaciones Error son fatales para el item, las Warning quedan como
//!   lint adjunto;
//! - resolución de nombres (NamingError si el base queda vacío).
//!
//! Los items rechazados se reportan como señales (-> eventos `ItemRejected`)
//! y viajan en el artifact para la fusión de salida; el batch continúa.
//! Cuando el mismo `class_name` aparece más de una vez, gana el spec más
//! reciente (upsert idempotente, nunca variantes paralelas).

use arch_core::step::{ItemSignal, StepKind, StepRunResultTyped, TypedStep};
use arch_domain::{resolve, ClassSpec, Layer};
use std::collections::HashMap;

use crate::artifacts::{RejectedItem, SpecBatch, ValidatedBatch, ValidatedItem};
use crate::spec_error::SpecError;

#[derive(Clone, Debug)]
pub struct ValidateBatchStep;

impl ValidateBatchStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ValidateBatchStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Valida un item individual ya deserializado a `Value`.
fn validate_item(index: usize, raw: &serde_json::Value) -> Result<ValidatedItem, (String, SpecError)> {
    let spec: ClassSpec = serde_json::from_value(raw.clone())
        .map_err(|e| (display_name(raw, index), SpecError::schema(format!("item no deserializable: {e}"), format!("[{index}]"))))?;

    let class_name = if spec.class_name.trim().is_empty() {
        display_name(raw, index)
    } else {
        spec.class_name.clone()
    };

    if spec.class_name.trim().is_empty() {
        return Err((class_name, SpecError::schema("class_name requerido y no vacío", "class_name")));
    }
    if spec.layer.trim().is_empty() {
        return Err((class_name, SpecError::schema("layer requerido", "layer")));
    }
    Layer::parse(&spec.layer).map_err(|e| (class_name.clone(), SpecError::schema(e.to_string(), "layer")))?;
    if spec.type_tag.trim().is_empty() {
        return Err((class_name, SpecError::schema("type requerido", "type")));
    }

    let violations = arch_policies::evaluate(&spec);
    let (errors, warnings): (Vec<_>, Vec<_>) = violations.into_iter()
                                                         .partition(|v| v.severity == arch_policies::Severity::Error);
    if let Some(first) = errors.first() {
        return Err((class_name, SpecError::schema(first.message.clone(), first.location.clone())));
    }

    let names = resolve(&spec.class_name).map_err(|e| (class_name.clone(), SpecError::naming(e.to_string())))?;

    Ok(ValidatedItem { index,
                       spec,
                       names,
                       warnings })
}

/// Nombre para el log cuando el item no aporta `class_name`.
fn display_name(raw: &serde_json::Value, index: usize) -> String {
    raw.get("class_name")
       .and_then(|v| v.as_str())
       .filter(|s| !s.trim().is_empty())
       .map(|s| s.to_string())
       .unwrap_or_else(|| format!("item[{index}]"))
}

impl TypedStep for ValidateBatchStep {
    type Params = ();
    type Input = SpecBatch;
    type Output = ValidatedBatch;

    fn id(&self) -> &'static str {
        "validate_batch"
    }

    fn kind(&self) -> StepKind {
        StepKind::Check
    }

    fn run_typed(&self, input: Option<SpecBatch>, _params: ()) -> StepRunResultTyped<ValidatedBatch> {
        let batch = match input {
            Some(b) => b,
            None => {
                return StepRunResultTyped::Failure { error: arch_core::errors::CoreEngineError::MissingInputs }
            }
        };

        let mut valid: Vec<ValidatedItem> = Vec::new();
        let mut rejected: Vec<RejectedItem> = Vec::new();
        let mut signals: Vec<ItemSignal> = Vec::new();

        for (index, raw) in batch.items.iter().enumerate() {
            match validate_item(index, raw) {
                Ok(item) => valid.push(item),
                Err((class_name, error)) => {
                    signals.push(ItemSignal { class_name: class_name.clone(),
                                              error: error.to_value() });
                    rejected.push(RejectedItem { index,
                                                 class_name,
                                                 error });
                }
            }
        }

        // Specs duplicados: el más reciente gana (idempotencia por clave).
        let mut last_by_class: HashMap<String, usize> = HashMap::new();
        for item in &valid {
            last_by_class.insert(item.spec.class_name.clone(), item.index);
        }
        valid.retain(|item| last_by_class.get(&item.spec.class_name) == Some(&item.index));

        let out = ValidatedBatch { originals: batch.items,
                                   valid,
                                   rejected,
                                   schema_version: 1 };
        if signals.is_empty() {
            StepRunResultTyped::Success { outputs: vec![out] }
        } else {
            StepRunResultTyped::SuccessWithSignals { outputs: vec![out], signals }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(items: Vec<serde_json::Value>) -> ValidatedBatch {
        let step = ValidateBatchStep::new();
        match step.run_typed(Some(SpecBatch { items, schema_version: 1 }), ()) {
            StepRunResultTyped::Success { mut outputs } | StepRunResultTyped::SuccessWithSignals { mut outputs, .. } => {
                outputs.remove(0)
            }
            StepRunResultTyped::Failure { error } => panic!("step no debía fallar: {error}"),
        }
    }

    #[test]
    fn valid_item_resolves_names() {
        let out = run(vec![json!({
            "class_name": "CreateProductUseCase",
            "layer": "application/use_case",
            "type": "use_case",
            "dependencies": ["IProductRepository"],
        })]);
        assert_eq!(out.valid.len(), 1);
        assert_eq!(out.valid[0].names.snake_base, "product");
        assert!(out.rejected.is_empty());
    }

    #[test]
    fn missing_layer_is_rejected() {
        let out = run(vec![json!({ "class_name": "Cart", "type": "entity" })]);
        assert!(out.valid.is_empty());
        assert_eq!(out.rejected.len(), 1);
        assert!(matches!(out.rejected[0].error, SpecError::Schema { .. }));
    }

    #[test]
    fn unknown_layer_value_is_rejected() {
        let out = run(vec![json!({ "class_name": "Cart", "layer": "domain/aggregate", "type": "entity" })]);
        assert_eq!(out.rejected.len(), 1);
    }

    #[test]
    fn concrete_dependency_is_rejected_with_offender_named() {
        let out = run(vec![json!({
            "class_name": "AddToCartUseCase",
            "layer": "application/use_case",
            "type": "use_case",
            "dependencies": ["CartRepo"],
        })]);
        assert_eq!(out.rejected.len(), 1);
        match &out.rejected[0].error {
            SpecError::Schema { message, location } => {
                assert!(message.contains("CartRepo"));
                assert_eq!(location, "dependencies[0]");
            }
            other => panic!("se esperaba Schema, llegó {other:?}"),
        }
    }

    #[test]
    fn affix_only_name_is_a_naming_error() {
        let out = run(vec![json!({ "class_name": "Request", "layer": "domain/entity", "type": "entity" })]);
        assert!(matches!(out.rejected[0].error, SpecError::Naming { .. }));
    }

    #[test]
    fn interface_without_prefix_passes_with_warning() {
        let out = run(vec![json!({
            "class_name": "CartRepository",
            "layer": "application/interface",
            "type": "interface",
        })]);
        assert_eq!(out.valid.len(), 1);
        assert_eq!(out.valid[0].warnings.len(), 1);
    }

    #[test]
    fn middle_invalid_item_does_not_affect_neighbours() {
        let out = run(vec![json!({ "class_name": "Cart", "layer": "domain/entity", "type": "entity" }),
                           json!({ "class_name": "Broken", "layer": "nope", "type": "x" }),
                           json!({ "class_name": "Order", "layer": "domain/entity", "type": "entity" })]);
        assert_eq!(out.valid.len(), 2);
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].index, 1);
    }

    #[test]
    fn most_recent_duplicate_wins() {
        let out = run(vec![json!({ "class_name": "Cart", "layer": "domain/entity", "type": "entity", "attributes": ["userId: str"] }),
                           json!({ "class_name": "Cart", "layer": "domain/entity", "type": "entity", "attributes": ["userId: str", "total: float"] })]);
        assert_eq!(out.valid.len(), 1);
        assert_eq!(out.valid[0].index, 1);
        assert_eq!(out.valid[0].spec.attributes.len(), 2);
    }
}

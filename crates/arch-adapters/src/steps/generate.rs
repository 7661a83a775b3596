//! GenerateModulesStep (Transform)
//!
//! Enruta cada item validado al generador de su capa (función pura del
//! prefijo de `layer`) y acumula los módulos producidos. Un item que no se
//! puede enrutar o generar se rechaza con su error estructurado; los demás
//! items no se ven afectados.

use arch_core::step::{ItemSignal, StepKind, StepRunResultTyped, TypedStep};

use crate::artifacts::{GeneratedBatch, GeneratedItem, RejectedItem, ValidatedBatch};
use crate::generators::{route, BatchIndex};

#[derive(Clone, Debug)]
pub struct GenerateModulesStep;

impl GenerateModulesStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GenerateModulesStep {
    fn default() -> Self {
        Self::new()
    }
}

impl TypedStep for GenerateModulesStep {
    type Params = ();
    type Input = ValidatedBatch;
    type Output = GeneratedBatch;

    fn id(&self) -> &'static str {
        "generate_modules"
    }

    fn kind(&self) -> StepKind {
        StepKind::Transform
    }

    fn run_typed(&self, input: Option<ValidatedBatch>, _params: ()) -> StepRunResultTyped<GeneratedBatch> {
        let batch = match input {
            Some(b) => b,
            None => {
                return StepRunResultTyped::Failure { error: arch_core::errors::CoreEngineError::MissingInputs }
            }
        };

        // Índice de nombres del batch para resolver referencias cruzadas (o
        // degradar a placeholders).
        let index = BatchIndex::from_items(&batch.valid);

        let mut generated: Vec<GeneratedItem> = Vec::new();
        let mut rejected = batch.rejected.clone();
        let mut signals: Vec<ItemSignal> = Vec::new();

        for item in &batch.valid {
            let prefix = item.spec.layer.split('/').next().unwrap_or("");
            let outcome = route(prefix).and_then(|generator| generator.generate(item, &index));
            match outcome {
                Ok(module) => generated.push(GeneratedItem { index: item.index,
                                                             class_name: item.spec.class_name.clone(),
                                                             module }),
                Err(error) => {
                    signals.push(ItemSignal { class_name: item.spec.class_name.clone(),
                                              error: error.to_value() });
                    rejected.push(RejectedItem { index: item.index,
                                                 class_name: item.spec.class_name.clone(),
                                                 error });
                }
            }
        }

        let out = GeneratedBatch { originals: batch.originals,
                                   generated,
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
    use crate::artifacts::ValidatedItem;
    use arch_domain::resolve;
    use serde_json::json;

    fn validated(class_name: &str, layer: &str, extra: serde_json::Value) -> ValidatedItem {
        let mut body = json!({ "class_name": class_name, "layer": layer, "type": layer.split('/').nth(1).unwrap() });
        if let (Some(obj), Some(extra_obj)) = (body.as_object_mut(), extra.as_object()) {
            for (k, v) in extra_obj {
                obj.insert(k.clone(), v.clone());
            }
        }
        ValidatedItem { index: 0,
                        spec: serde_json::from_value(body).unwrap(),
                        names: resolve(class_name).unwrap(),
                        warnings: vec![] }
    }

    fn run(batch: ValidatedBatch) -> GeneratedBatch {
        let step = GenerateModulesStep::new();
        match step.run_typed(Some(batch), ()) {
            StepRunResultTyped::Success { mut outputs } | StepRunResultTyped::SuccessWithSignals { mut outputs, .. } => {
                outputs.remove(0)
            }
            StepRunResultTyped::Failure { error } => panic!("step no debía fallar: {error}"),
        }
    }

    #[test]
    fn entity_item_produces_code_and_test_modules() {
        let item = validated("Cart",
                             "domain/entity",
                             json!({
                                 "attributes": ["userId: str"],
                                 "methods": [{ "method_name": "addItem", "parameters": ["productId: str", "quantity: int"] }],
                             }));
        let out = run(ValidatedBatch { originals: vec![], valid: vec![item], rejected: vec![], schema_version: 1 });
        assert_eq!(out.generated.len(), 1);
        let module = &out.generated[0].module;
        assert_eq!(module.code_path, "src/domain/entities/cart.ts");
        assert_eq!(module.test_path, "tests/domain/entities/cart.test.ts");
        assert!(module.code.contains("existing.quantity += quantity"), "addItem debe fusionar por clave:\n{}", module.code);
        assert!(module.test.contains("rejects zero quantity"));
    }

    #[test]
    fn malformed_attribute_rejects_only_that_item() {
        let bad = validated("Cart", "domain/entity", json!({ "attributes": ["rota"] }));
        let good = validated("Order", "domain/entity", json!({ "attributes": ["total: float"] }));
        let out = run(ValidatedBatch { originals: vec![], valid: vec![bad, good], rejected: vec![], schema_version: 1 });
        assert_eq!(out.generated.len(), 1);
        assert_eq!(out.generated[0].class_name, "Order");
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].class_name, "Cart");
    }

    #[test]
    fn unresolved_dependency_degrades_to_placeholder() {
        let item = validated("AddToCartUseCase",
                             "application/use_case",
                             json!({
                                 "dependencies": ["ICartRepository"],
                                 "methods": [{ "method_name": "addToCart", "parameters": ["userId: str"] }],
                             }));
        let out = run(ValidatedBatch { originals: vec![], valid: vec![item], rejected: vec![], schema_version: 1 });
        let code = &out.generated[0].module.code;
        assert!(code.contains("AUTO-GENERATED PLACEHOLDER"), "sin la interface en el batch debe emitir stand-in:\n{code}");
        assert!(code.contains("NotImplementedError"));
    }

    #[test]
    fn resolved_dependency_imports_instead_of_placeholder() {
        let iface = validated("ICartRepository", "application/interface", json!({ "methods": [] }));
        let use_case = validated("AddToCartUseCase",
                                 "application/use_case",
                                 json!({
                                     "dependencies": ["ICartRepository"],
                                     "methods": [{ "method_name": "addToCart", "parameters": ["userId: str"] }],
                                 }));
        let out = run(ValidatedBatch { originals: vec![],
                                       valid: vec![iface, use_case],
                                       rejected: vec![],
                                       schema_version: 1 });
        let code = &out.generated[1].module.code;
        assert!(code.contains("import { ICartRepository }"));
        assert!(!code.contains("AUTO-GENERATED PLACEHOLDER"));
    }

    #[test]
    fn adapter_module_carries_retry_policy_constants() {
        let item = validated("PaymentGatewayAdapter",
                             "infrastructure/adapter",
                             json!({
                                 "dependencies": ["IPaymentGateway"],
                                 "methods": [{ "method_name": "charge", "parameters": ["amount: int"] }],
                             }));
        let out = run(ValidatedBatch { originals: vec![], valid: vec![item], rejected: vec![], schema_version: 1 });
        let code = &out.generated[0].module.code;
        assert!(code.contains("DEFAULT_TIMEOUT_MS = 5000"));
        assert!(code.contains("MAX_RETRIES = 2"));
        assert!(code.contains("BACKOFF_BASE_MS = 300"));
        assert!(code.contains("RateLimitedError"));
    }

    #[test]
    fn store_module_implements_rollback() {
        let item = validated("CartStore", "application/store", json!({ "dependencies": ["IAddToCartUseCase"] }));
        let out = run(ValidatedBatch { originals: vec![], valid: vec![item], rejected: vec![], schema_version: 1 });
        let code = &out.generated[0].module.code;
        assert!(code.contains("const snapshot"));
        assert!(code.contains("this.states.set(ownerId, snapshot)"), "rollback debe restaurar el snapshot:\n{code}");
        assert!(code.contains("throw err"));
    }
}

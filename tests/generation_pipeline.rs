//! Tests de extremo a extremo del pipeline de generación: enrutamiento
//! determinista, falla parcial por item, idempotencia de re-ejecución y la
//! convención de puertos, corriendo el batch completo por el engine.

use std::sync::Arc;

use arch_core::registry::{ArtifactRegistry, InMemoryArtifactRegistry};
use arch_core::{BatchEventKind, InMemoryBatchRepository, InMemoryEventStore};
use archflow_rust::run_batch;
use serde_json::json;

const RAW_BASE: &str = "https://raw.example.test/repo/main";

fn run(raw: &str) -> (Vec<serde_json::Value>, Vec<BatchEventKind>, Arc<InMemoryArtifactRegistry>) {
    let registry = Arc::new(InMemoryArtifactRegistry::new());
    let (_, output, events) = run_batch(InMemoryEventStore::default(),
                                        InMemoryBatchRepository::new(),
                                        registry.clone(),
                                        None,
                                        raw,
                                        RAW_BASE).expect("el batch debe completar");
    (output.items, events.into_iter().map(|e| e.kind).collect(), registry)
}

#[test]
fn mixed_layers_route_independently() {
    let raw = json!([
        { "class_name": "Cart", "layer": "domain/entity", "type": "entity",
          "attributes": ["userId: str"] },
        { "class_name": "ICartRepository", "layer": "application/interface", "type": "interface" },
        { "class_name": "CartRepository", "layer": "infrastructure/repository", "type": "repository",
          "attributes": ["session: json"] },
        { "class_name": "CartRouter", "layer": "presentation/router", "type": "router",
          "dependencies": ["IAddToCartUseCase"],
          "methods": [{ "method_name": "getCart", "parameters": ["userId: str"] }] },
    ]).to_string();

    let (items, _, _) = run(&raw);
    let paths: Vec<&str> = items.iter().filter_map(|i| i["code_path"].as_str()).collect();
    assert_eq!(paths,
               vec!["src/domain/entities/cart.ts",
                    "src/application/interfaces/i_cart_repository.ts",
                    "src/infrastructure/repositories/cart_repository.ts",
                    "src/presentation/routers/carts_router.ts"]);
}

#[test]
fn partial_failure_leaves_neighbours_untouched() {
    let raw = json!([
        { "class_name": "Cart", "layer": "domain/entity", "type": "entity" },
        { "class_name": "Broken", "layer": "not/a/layer", "type": "x" },
        { "class_name": "Order", "layer": "domain/entity", "type": "entity" },
    ]).to_string();

    let (items, events, _) = run(&raw);
    assert!(items[0].get("code_path").is_some(), "item 1 genera normalmente");
    assert!(items[1].get("error").is_some(), "item 2 registra su error");
    assert!(items[1].get("code_path").is_none());
    assert!(items[2].get("code_path").is_some(), "item 3 no se ve afectado");

    let rejected: Vec<String> = events.iter()
                                      .filter_map(|k| match k {
                                          BatchEventKind::ItemRejected { class_name, .. } => Some(class_name.clone()),
                                          _ => None,
                                      })
                                      .collect();
    assert_eq!(rejected, vec!["Broken".to_string()]);
}

#[test]
fn resubmission_is_idempotent() {
    let raw = json!([
        { "class_name": "Category", "layer": "domain/entity", "type": "entity",
          "attributes": ["name: str"] },
    ]).to_string();

    let (items_a, events_a, registry_a) = run(&raw);
    let (items_b, events_b, registry_b) = run(&raw);

    assert_eq!(items_a, items_b, "mismas rutas en ambas corridas");
    assert_eq!(registry_a.snapshot(), registry_b.snapshot());

    // Los fingerprints de steps también deben coincidir corrida a corrida.
    let fps = |events: &[BatchEventKind]| -> Vec<String> {
        events.iter()
              .filter_map(|k| match k {
                  BatchEventKind::StepFinished { fingerprint, .. } => Some(fingerprint.clone()),
                  _ => None,
              })
              .collect()
    };
    assert_eq!(fps(&events_a), fps(&events_b));
}

#[test]
fn rerun_on_shared_registry_overwrites_instead_of_duplicating() {
    let raw = json!([
        { "class_name": "Cart", "layer": "domain/entity", "type": "entity" },
    ]).to_string();

    let registry: Arc<dyn ArtifactRegistry> = Arc::new(InMemoryArtifactRegistry::new());
    for _ in 0..2 {
        run_batch(InMemoryEventStore::default(),
                  InMemoryBatchRepository::new(),
                  registry.clone(),
                  None,
                  &raw,
                  RAW_BASE).expect("corrida");
    }
    assert_eq!(registry.len(), 1);
}

#[test]
fn port_naming_rule_gates_use_cases() {
    let bad = json!([
        { "class_name": "AddToCartUseCase", "layer": "application/use_case", "type": "use_case",
          "dependencies": ["CartRepo"],
          "methods": [{ "method_name": "addToCart", "parameters": ["userId: str"] }] },
    ]).to_string();
    let (items, _, _) = run(&bad);
    assert!(items[0].get("error").is_some(), "dependencia sin prefijo I debe fallar");

    let good = bad.replace("CartRepo", "ICartRepo");
    let (items, _, _) = run(&good);
    assert!(items[0].get("code_path").is_some(), "dependencia con prefijo I debe pasar");
}

#[test]
fn raw_urls_are_templated_from_the_code_paths() {
    let raw = json!([
        { "class_name": "Person", "layer": "presentation/router", "type": "router",
          "methods": [{ "method_name": "getPerson", "parameters": ["id: str"] }] },
    ]).to_string();
    let (items, _, _) = run(&raw);
    assert_eq!(items[0]["code_path"], "src/presentation/routers/people_router.ts");
    assert_eq!(items[0]["code_raw_url"],
               format!("{RAW_BASE}/src/presentation/routers/people_router.ts"));
    assert_eq!(items[0]["test_raw_url"],
               format!("{RAW_BASE}/tests/presentation/routers/people_router.test.ts"));
}

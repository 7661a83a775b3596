//! Demo de la raíz de composición: arma el pipeline con inyección explícita
//! de dependencias (registro + escritor construidos una vez aquí y pasados
//! hacia abajo), corre un batch de ejemplo y muestra el protocolo optimista
//! del runtime de stores.

use std::sync::Arc;

use arch_core::registry::{ArtifactRegistry, InMemoryArtifactRegistry, MemoryModuleWriter};
use arch_core::{BatchEventKind, InMemoryBatchRepository, InMemoryEventStore};
use arch_domain::KeyedQuantityCollection;
use archflow_rust::store::{MutationUseCase, OptimisticStore, StoreError};
use archflow_rust::{run_batch, run_batch_parallel, GenConfig};
use async_trait::async_trait;

const DEMO_BATCH: &str = r#"[
    { "class_name": "Cart", "layer": "domain/entity", "type": "entity",
      "attributes": ["userId: str", "items: list"],
      "methods": [{ "method_name": "addItem", "parameters": ["productId: str", "quantity: int"] }] },
    { "class_name": "ICartRepository", "layer": "application/interface", "type": "interface",
      "methods": [{ "method_name": "getCart", "parameters": ["userId: str"], "return_type": "json" },
                   { "method_name": "saveCart", "parameters": ["cart: json"] }] },
    { "class_name": "AddToCartUseCase", "layer": "application/use_case", "type": "use_case",
      "dependencies": ["ICartRepository"],
      "methods": [{ "method_name": "addToCart", "parameters": ["userId: str", "productId: str", "quantity: int"], "return_type": "json" }] },
    { "class_name": "CartStore", "layer": "application/store", "type": "store",
      "dependencies": ["IAddToCartUseCase"] },
    { "class_name": "CartModel", "layer": "infrastructure/model", "type": "model",
      "attributes": ["id: int", "user_id: int", "created_at: datetime", "notes?: str"] },
    { "class_name": "CartRepository", "layer": "infrastructure/repository", "type": "repository",
      "attributes": ["session: json"],
      "methods": [{ "method_name": "getCart", "parameters": ["userId: str"], "return_type": "json" },
                   { "method_name": "saveCart", "parameters": ["cart: json"] }] },
    { "class_name": "PaymentGatewayAdapter", "layer": "infrastructure/adapter", "type": "adapter",
      "dependencies": ["IPaymentGateway"],
      "methods": [{ "method_name": "charge", "parameters": ["amount: int"], "return_type": "json" }] },
    { "class_name": "CartSchemas", "layer": "presentation/schema", "type": "schema",
      "attributes": ["productId: str", "quantity: int"] },
    { "class_name": "CartDependencies", "layer": "presentation/dependency", "type": "dependency",
      "dependencies": ["ICartRepository"] },
    { "class_name": "CartRouter", "layer": "presentation/router", "type": "router",
      "dependencies": ["IAddToCartUseCase"],
      "methods": [{ "method_name": "addToCart", "parameters": ["userId: str"] },
                   { "method_name": "getCart", "parameters": ["userId: str"], "return_type": "json" }] },
    { "class_name": "CartHook", "layer": "presentation/hook", "type": "hook" },
    { "class_name": "CartView", "layer": "presentation/component", "type": "component" },
    { "class_name": "Broken", "layer": "unknown/thing", "type": "x" }
]"#;

/// Demo 1: batch mixto por el engine secuencial (eventos + fingerprints).
fn run_generation_demo(config: &GenConfig) {
    println!("== Generación (engine secuencial) ==");
    let registry: Arc<dyn ArtifactRegistry> = Arc::new(InMemoryArtifactRegistry::new());
    let writer = Arc::new(MemoryModuleWriter::new());
    let (batch_id, output, events) = run_batch(InMemoryEventStore::default(),
                                               InMemoryBatchRepository::new(),
                                               registry.clone(),
                                               Some(writer.clone()),
                                               DEMO_BATCH,
                                               &config.raw_url_base).expect("el batch demo debe completar");

    println!("batch: {batch_id}");
    let trace: Vec<&str> = events.iter()
                                 .map(|e| match e.kind {
                                     BatchEventKind::BatchInitialized { .. } => "I",
                                     BatchEventKind::StepStarted { .. } => "S",
                                     BatchEventKind::StepFinished { .. } => "F",
                                     BatchEventKind::StepFailed { .. } => "X",
                                     BatchEventKind::ItemRejected { .. } => "R",
                                     BatchEventKind::BatchCompleted { .. } => "C",
                                 })
                                 .collect();
    println!("eventos: {}", trace.join(""));

    let generated = output.items.iter().filter(|i| i.get("code_path").is_some()).count();
    let rejected = output.items.iter().filter(|i| i.get("error").is_some()).count();
    println!("items generados: {generated}, rechazados: {rejected}");
    assert_eq!(generated, 12, "todos los items válidos del demo deben generar");
    assert_eq!(rejected, 1, "el item con layer desconocido queda registrado");

    for (class_name, paths) in registry.snapshot() {
        println!("  {class_name} -> {}", paths.code_path.unwrap_or_default());
    }
    let written = writer.written.lock().expect("writer lock");
    println!("módulos escritos (memoria): {}", written.len());
    assert_eq!(written.len(), 24, "un módulo de código y uno de test por item generado");
}

/// Demo 2: idempotencia — re-ejecutar el mismo batch no duplica rutas.
fn run_idempotency_demo(config: &GenConfig) {
    println!("\n== Idempotencia (re-ejecución) ==");
    let registry: Arc<dyn ArtifactRegistry> = Arc::new(InMemoryArtifactRegistry::new());
    let first = run_batch_parallel(DEMO_BATCH, registry.clone(), None, &config.raw_url_base, config.workers)
        .expect("primera corrida");
    let second = run_batch_parallel(DEMO_BATCH, registry.clone(), None, &config.raw_url_base, config.workers)
        .expect("segunda corrida");
    assert_eq!(first.items, second.items, "misma entrada => misma salida");
    println!("entradas de registro tras dos corridas: {} (sin duplicados)", registry.len());
}

struct FlakyCartUseCase {
    fail_next: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl MutationUseCase<KeyedQuantityCollection> for FlakyCartUseCase {
    async fn execute(&self,
                     _key: &str,
                     optimistic: &KeyedQuantityCollection)
                     -> Result<KeyedQuantityCollection, StoreError> {
        if self.fail_next.swap(false, std::sync::atomic::Ordering::SeqCst) {
            Err(StoreError::UseCase("servicio de carrito no disponible".to_string()))
        } else {
            Ok(optimistic.clone())
        }
    }
}

/// Demo 3: protocolo optimista (confirmación y rollback) del runtime.
async fn run_store_demo() {
    println!("\n== Store optimista ==");
    let store: OptimisticStore<KeyedQuantityCollection> = OptimisticStore::new();
    let use_case = FlakyCartUseCase { fail_next: std::sync::atomic::AtomicBool::new(true) };

    // Primera mutación: el use case falla -> rollback al carrito vacío.
    let err = store.mutate("u1", &use_case, |c| Ok(c.add("p1", 1)?))
                   .await
                   .expect_err("la primera llamada debe fallar");
    println!("mutación 1: error relanzado -> {err}");
    assert!(store.get("u1").is_empty(), "rollback al snapshot vacío");

    // Segunda mutación: confirma y el estado autoritativo queda visible.
    let cart = store.mutate("u1", &use_case, |c| Ok(c.add("p1", 1)?))
                    .await
                    .expect("la segunda llamada confirma");
    println!("mutación 2: carrito = {:?}", cart.items());
    assert_eq!(store.get("u1").items()[0].quantity, 1);
}

#[tokio::main]
async fn main() {
    let config = GenConfig::from_env();
    run_generation_demo(&config);
    run_idempotency_demo(&config);
    run_store_demo().await;
    println!("\ndemo ok");
}

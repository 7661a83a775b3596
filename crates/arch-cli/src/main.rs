use std::sync::Arc;

use arch_adapters::steps::standard_pipeline;
use arch_adapters::OutputBatch;
use arch_core::injection::ConstInjector;
use arch_core::model::ArtifactSpec;
use arch_core::registry::{ArtifactRegistry, InMemoryArtifactRegistry, ModuleWriter};
use arch_core::repo::BatchRepository;
use arch_core::{BatchEngine, BatchEventKind, EventStore, InMemoryBatchRepository, InMemoryEventStore};
use arch_persistence::{FileArtifactRegistry, FileEventStore, FsModuleWriter, StateConfig};

fn usage() -> ! {
    eprintln!("Uso: arch-cli run --batch <specs.json> [--out <salida.json>] [--write-modules]");
    eprintln!("     arch-cli registry");
    std::process::exit(2);
}

fn main() {
    // Cargar .env si existe (ARCHFLOW_STATE_DIR, ARCHFLOW_RAW_URL_BASE, ...)
    let _ = dotenvy::dotenv();
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage();
    }

    match args[1].as_str() {
        "run" => {
            let mut batch_path: Option<String> = None;
            let mut out_path: Option<String> = None;
            let mut write_modules = false;
            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--batch" => {
                        i += 1;
                        if i < args.len() { batch_path = Some(args[i].clone()); }
                    }
                    "--out" => {
                        i += 1;
                        if i < args.len() { out_path = Some(args[i].clone()); }
                    }
                    "--write-modules" => {
                        write_modules = true;
                    }
                    _ => {}
                }
                i += 1;
            }
            let batch_path = match batch_path {
                Some(p) => p,
                None => usage(),
            };
            let raw = match std::fs::read_to_string(&batch_path) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("[arch run] no se pudo leer '{batch_path}': {e}");
                    std::process::exit(4);
                }
            };

            let writer: Option<Arc<dyn ModuleWriter>> = if write_modules {
                let root = std::env::var("ARCHFLOW_OUTPUT_ROOT").unwrap_or_else(|_| "generated".to_string());
                Some(Arc::new(FsModuleWriter::new(root)))
            } else {
                None
            };

            // Backend de estado: directorio durable si ARCHFLOW_STATE_DIR está
            // definido; en memoria en caso contrario.
            let state = StateConfig::from_env();
            let exit = match state.state_dir {
                Some(dir) => {
                    let event_store = match FileEventStore::open(&dir) {
                        Ok(s) => s,
                        Err(e) => {
                            eprintln!("[arch run] event store: {e}");
                            std::process::exit(4);
                        }
                    };
                    let registry: Arc<dyn ArtifactRegistry> = match FileArtifactRegistry::open(&dir) {
                        Ok(r) => Arc::new(r),
                        Err(e) => {
                            eprintln!("[arch run] registro: {e}");
                            std::process::exit(4);
                        }
                    };
                    run_batch(event_store, InMemoryBatchRepository::new(), registry, writer, &raw, out_path.as_deref())
                }
                None => {
                    let registry: Arc<dyn ArtifactRegistry> = Arc::new(InMemoryArtifactRegistry::new());
                    run_batch(InMemoryEventStore::default(),
                              InMemoryBatchRepository::new(),
                              registry,
                              writer,
                              &raw,
                              out_path.as_deref())
                }
            };
            std::process::exit(exit);
        }
        "registry" => {
            let state = StateConfig::from_env();
            match state.state_dir {
                Some(dir) => match FileArtifactRegistry::open(&dir) {
                    Ok(reg) => {
                        for (class_name, paths) in reg.snapshot() {
                            println!("{class_name}\t{}", paths.code_path.unwrap_or_default());
                        }
                        std::process::exit(0);
                    }
                    Err(e) => {
                        eprintln!("[arch registry] {e}");
                        std::process::exit(4);
                    }
                },
                None => {
                    eprintln!("[arch registry] requiere ARCHFLOW_STATE_DIR");
                    std::process::exit(4);
                }
            }
        }
        _ => usage(),
    }
}

/// Arma el pipeline completo sobre las stores dadas, lo ejecuta y escribe la
/// salida fusionada.
fn run_batch<E, R>(event_store: E,
                   repository: R,
                   registry: Arc<dyn ArtifactRegistry>,
                   writer: Option<Arc<dyn ModuleWriter>>,
                   raw: &str,
                   out_path: Option<&str>)
                   -> i32
    where E: EventStore,
          R: BatchRepository
{
    let mut engine = BatchEngine::new_with_stores(event_store, repository);
    engine.set_default_definition(standard_pipeline(raw, registry, writer));

    if let Ok(base) = std::env::var("ARCHFLOW_RAW_URL_BASE") {
        engine.add_injector(Box::new(ConstInjector::new(serde_json::json!({ "raw_url_base": base }))));
    }

    let batch_id = match engine.run() {
        Ok(id) => id,
        Err(e) => {
            eprintln!("[arch run] pipeline: {e}");
            return 5;
        }
    };

    // Resumen por stderr: items rechazados registrados contra su class_name.
    let events = engine.events_for(batch_id);
    for ev in &events {
        if let BatchEventKind::ItemRejected { class_name, error, .. } = &ev.kind {
            eprintln!("[arch run] item rechazado '{class_name}': {error}");
        }
    }

    let output = match engine.final_artifact().and_then(|a| OutputBatch::from_artifact(&a).ok()) {
        Some(o) => o,
        None => {
            eprintln!("[arch run] el pipeline no produjo salida");
            return 5;
        }
    };
    let rendered = match serde_json::to_string_pretty(&output.items) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("[arch run] serialización de salida: {e}");
            return 5;
        }
    };

    match out_path {
        Some(p) => {
            if let Err(e) = std::fs::write(p, rendered) {
                eprintln!("[arch run] no se pudo escribir '{p}': {e}");
                return 4;
            }
            println!("batch={batch_id} items={} ok", output.items.len());
        }
        None => println!("{rendered}"),
    }
    0
}

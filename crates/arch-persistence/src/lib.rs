//! arch-persistence
//!
//! Implementaciones durables (archivos JSON en un directorio de estado) de
//! los contratos del core: `EventStore` append-only, `ArtifactRegistry`
//! idempotente y el colaborador `ModuleWriter` sobre filesystem. Paridad de
//! comportamiento con los backends en memoria: el replay de eventos debe
//! reconstruir el mismo estado y fingerprints.
//!
//! Módulos:
//! - `file`: stores sobre filesystem (event log JSONL, registro JSON con
//!   reemplazo atómico, escritor de módulos).
//! - `config`: carga de configuración desde .env / variables de entorno.
//! - `error`: errores semánticos de la capa de persistencia.

pub mod config;
pub mod error;
pub mod file;

pub use config::{init_dotenv, StateConfig};
pub use error::PersistenceError;
pub use file::{FileArtifactRegistry, FileEventStore, FsModuleWriter};

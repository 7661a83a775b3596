//! Carga de configuración de persistencia desde variables de entorno.
//! Convención: `ARCHFLOW_STATE_DIR` apunta al directorio de estado (event
//! log + registro); si no está definida, el caller usa stores en memoria.

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone)]
pub struct StateConfig {
    pub state_dir: Option<PathBuf>,
}

impl StateConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let state_dir = env::var("ARCHFLOW_STATE_DIR").ok().map(PathBuf::from);
        Self { state_dir }
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

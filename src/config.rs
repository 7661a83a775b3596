//! Configuración central de la aplicación.
//!
//! Carga variables de entorno (.env vía dotenvy) y expone una estructura
//! inmutable. La configuración se construye explícitamente en el composition
//! root y se pasa hacia abajo; no hay instancia global materializada en el
//! primer acceso.
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

// Carga perezosa del archivo .env una sola vez por proceso.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

/// Configuración del pipeline de generación.
#[derive(Debug, Clone)]
pub struct GenConfig {
    /// Directorio de estado durable (event log + registro); None = memoria.
    pub state_dir: Option<PathBuf>,
    /// Raíz donde el escritor materializa los módulos generados.
    pub output_root: PathBuf,
    /// Base para el templating de raw URLs.
    pub raw_url_base: String,
    /// Workers del driver paralelo (0 = elegir según cores).
    pub workers: usize,
}

impl GenConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let state_dir = env::var("ARCHFLOW_STATE_DIR").ok().map(PathBuf::from);
        let output_root = env::var("ARCHFLOW_OUTPUT_ROOT").map(PathBuf::from)
                                                          .unwrap_or_else(|_| PathBuf::from("generated"));
        let raw_url_base = env::var("ARCHFLOW_RAW_URL_BASE")
            .unwrap_or_else(|_| arch_adapters::steps::DEFAULT_RAW_URL_BASE.to_string());
        let workers = env::var("ARCHFLOW_WORKERS").ok().and_then(|v| v.parse().ok()).unwrap_or(0);
        Self { state_dir,
               output_root,
               raw_url_base,
               workers }
    }
}

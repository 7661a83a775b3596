//! Constantes del motor core.
//!
//! Valores estáticos que participan en el cálculo de fingerprints y en la
//! compatibilidad entre versiones del motor. `ENGINE_VERSION` entra al
//! hashing por diseño: un cambio de versión invalida determinísticamente los
//! fingerprints aunque la definición del pipeline y los datos no cambien.

/// Versión lógica del motor de generación (G1). Mantener estable mientras no
/// haya cambios incompatibles en el contrato de eventos o fingerprints.
pub const ENGINE_VERSION: &str = "G1.0";

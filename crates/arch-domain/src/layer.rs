// layer.rs
use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Valores de capa admitidos por el pipeline de generación.
///
/// El segmento antes de `/` (layer prefix) decide el generador; el segmento
/// posterior es la variante concreta dentro de la capa.
pub const KNOWN_LAYERS: &[&str] = &["domain/entity",
                                    "domain/service",
                                    "application/interface",
                                    "application/use_case",
                                    "application/store",
                                    "infrastructure/model",
                                    "infrastructure/repository",
                                    "infrastructure/adapter",
                                    "presentation/schema",
                                    "presentation/dependency",
                                    "presentation/router",
                                    "presentation/component",
                                    "presentation/hook"];

/// Valor de capa validado (`domain/entity`, `application/use_case`, ...).
///
/// Se conserva la forma textual original: el dispatcher enruta por
/// `prefix()` y los generadores ramifican por `kind()`. Inmutable una vez
/// construido.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Layer(String);

impl Layer {
    /// Valida pertenencia al conjunto enumerado y construye el valor.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();
        if !KNOWN_LAYERS.contains(&raw) {
            return Err(DomainError::ValidationError(format!("layer desconocido: '{raw}'")));
        }
        Ok(Layer(raw.to_string()))
    }

    /// Construye sin validar pertenencia (para rutas de test y specs
    /// provenientes de versiones futuras del contrato). El dispatcher sigue
    /// siendo quien decide si el prefijo es enrutables.
    pub fn unchecked(raw: &str) -> Self {
        Layer(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segmento antes de `/` (clave de enrutamiento).
    pub fn prefix(&self) -> &str {
        self.0.split('/').next().unwrap_or("")
    }

    /// Segmento después de `/` (variante dentro de la capa).
    pub fn kind(&self) -> &str {
        self.0.split('/').nth(1).unwrap_or("")
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Errores estructurados por item del batch.
//!
//! Un `SpecError` es fatal para su item (el batch continúa con los demás):
//! queda registrado como evento `ItemRejected` y aparece como campo `error`
//! en la salida fusionada en lugar de las rutas de artefacto.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpecError {
    /// Spec malformado: campo requerido ausente, layer fuera del conjunto,
    /// atributo no parseable o violación dura de política.
    Schema { message: String, location: String },
    /// No se pudo derivar un nombre base no vacío.
    Naming { message: String },
    /// Prefijo de capa no enrutable.
    Routing { prefix: String },
}

impl SpecError {
    pub fn schema(message: impl Into<String>, location: impl Into<String>) -> Self {
        SpecError::Schema { message: message.into(),
                            location: location.into() }
    }

    pub fn naming(message: impl Into<String>) -> Self {
        SpecError::Naming { message: message.into() }
    }

    pub fn routing(prefix: impl Into<String>) -> Self {
        SpecError::Routing { prefix: prefix.into() }
    }

    /// Forma JSON estable para eventos y salida.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("serialize spec error")
    }
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::Schema { message, location } => write!(f, "schema@{location}: {message}"),
            SpecError::Naming { message } => write!(f, "naming: {message}"),
            SpecError::Routing { prefix } => write!(f, "routing: prefijo '{prefix}' no enrutable"),
        }
    }
}

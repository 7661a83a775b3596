//! Infraestructura opcional de tipado fuerte para `Artifact` manteniendo el
//! núcleo agnóstico. Permite describir artefactos con un tipo de datos
//! concreto y validaciones, sin introducir semántica de dominio en el core.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::{Artifact, ArtifactKind};

/// Errores posibles al decodificar un artifact tipado.
#[derive(Debug)]
pub enum ArtifactDecodeError {
    KindMismatch { expected: ArtifactKind, found: ArtifactKind },
    VersionMismatch { expected: u32, found: Option<u32> },
    Deserialize(String),
    Validation(String),
}

/// Especificación abstracta de un artifact tipado.
/// Implementado por los tipos de datos que quieren exponerse como artifacts
/// seguros (batch crudo, batch validado, batch generado, ...).
pub trait ArtifactSpec: Sized + Serialize + DeserializeOwned + Clone {
    /// Kind asociado (permite distinguir en runtime).
    const KIND: ArtifactKind;
    /// Versión de esquema (incrementar en cambios incompatibles).
    const SCHEMA_VERSION: u32 = 1;

    /// Validación semántica ligera (sin efectos secundarios). Opcional.
    fn validate(&self) -> Result<(), String> { Ok(()) }

    /// Nombre de campo que lleva la versión dentro del payload.
    fn version_field_name() -> &'static str { "schema_version" }

    /// Serializa a `Artifact` sin hash (lo añadirá el engine).
    fn into_artifact(self) -> Artifact {
        let mut value = serde_json::to_value(&self).expect("serialize artifact spec");
        if let Value::Object(map) = &mut value {
            map.entry(Self::version_field_name().to_string()).or_insert(Value::from(Self::SCHEMA_VERSION));
        }
        Artifact::new_unhashed(Self::KIND, value, None)
    }

    /// Decodifica desde artifact neutro verificando kind, versión y
    /// validación.
    fn from_artifact(a: &Artifact) -> Result<Self, ArtifactDecodeError> {
        if a.kind != Self::KIND {
            return Err(ArtifactDecodeError::KindMismatch { expected: Self::KIND, found: a.kind.clone() });
        }
        let found_version = a.payload.get(Self::version_field_name()).and_then(|v| v.as_u64()).map(|v| v as u32);
        match found_version {
            Some(v) if v == Self::SCHEMA_VERSION => {}
            other => {
                return Err(ArtifactDecodeError::VersionMismatch { expected: Self::SCHEMA_VERSION, found: other });
            }
        }
        let decoded: Self = serde_json::from_value(a.payload.clone())
            .map_err(|e| ArtifactDecodeError::Deserialize(e.to_string()))?;
        decoded.validate().map_err(ArtifactDecodeError::Validation)?;
        Ok(decoded)
    }
}

/// Adaptador genérico para un artifact tipado ya decodificado (útil en
/// runtimes polimórficos).
pub struct TypedArtifact<T: ArtifactSpec> {
    pub inner: T,
    pub raw: Artifact, // mantiene representación original (hash incluido cuando se calcule)
}

impl<T: ArtifactSpec + Clone> TypedArtifact<T> {
    pub fn new(inner: T) -> Self { Self { raw: inner.clone().into_artifact(), inner } }

    pub fn decode(raw: &Artifact) -> Result<Self, ArtifactDecodeError> {
        let inner = T::from_artifact(raw)?;
        Ok(Self { inner, raw: raw.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
    struct Probe {
        label: String,
    }

    impl ArtifactSpec for Probe {
        const KIND: ArtifactKind = ArtifactKind::GenericJson;

        fn validate(&self) -> Result<(), String> {
            if self.label.is_empty() {
                return Err("label vacío".to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn encode_then_decode_preserves_payload_and_version() {
        let typed = TypedArtifact::new(Probe { label: "x".into() });
        assert_eq!(typed.raw.payload["schema_version"], 1);
        let decoded = TypedArtifact::<Probe>::decode(&typed.raw).unwrap();
        assert_eq!(decoded.inner, typed.inner);
    }

    #[test]
    fn missing_version_is_a_decode_error() {
        let mut art = Probe { label: "x".into() }.into_artifact();
        if let Value::Object(map) = &mut art.payload {
            map.remove("schema_version");
        }
        assert!(matches!(Probe::from_artifact(&art), Err(ArtifactDecodeError::VersionMismatch { .. })));
    }

    #[test]
    fn semantic_validation_gates_decoding() {
        let art = Probe { label: String::new() }.into_artifact();
        assert!(matches!(Probe::from_artifact(&art), Err(ArtifactDecodeError::Validation(_))));
    }
}

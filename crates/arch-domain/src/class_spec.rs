// class_spec.rs
use crate::{Attribute, DomainError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Declaración de método dentro de una especificación de clase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MethodSpec {
    pub method_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parámetros como strings `"name: type"`, en orden de declaración.
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Tipo de retorno; ausente equivale a `void`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

impl MethodSpec {
    /// Parsea la lista de parámetros con la misma gramática de atributos.
    pub fn parsed_parameters(&self) -> Result<Vec<Attribute>, DomainError> {
        Attribute::parse_all(&self.parameters)
    }

    /// Tipo de retorno efectivo (`void` por defecto).
    pub fn return_type_or_void(&self) -> &str {
        self.return_type.as_deref().unwrap_or("void")
    }
}

/// Unidad de trabajo del pipeline: una especificación de clase cruda tal
/// como llega en el batch JSON.
///
/// Los campos opcionales se normalizan a contenedores vacíos al
/// deserializar (`#[serde(default)]`); la validación de forma (campos
/// requeridos, pertenencia de `layer`, convención de puertos) ocurre en el
/// paso de validación del pipeline, no aquí.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClassSpec {
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub layer: String,
    #[serde(default, rename = "type")]
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Payload de extensión (hints de shapes de entrada/salida, valores
    /// permitidos, nombres de hook/use-case enlazados, ...).
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl ClassSpec {
    /// Atributos parseados en orden de declaración. Una entrada malformada
    /// invalida el item completo.
    pub fn parsed_attributes(&self) -> Result<Vec<Attribute>, DomainError> {
        Attribute::parse_all(&self.attributes)
    }

    /// Lista de valores permitidos para un campo, si `metadata` la provee
    /// bajo `allowed_values: { "<campo>": [...] }`.
    pub fn allowed_values(&self, field: &str) -> Option<Vec<String>> {
        let allowed = self.metadata.get("allowed_values")?;
        let list = allowed.get(field)?.as_array()?;
        Some(list.iter()
                 .filter_map(|v| v.as_str().map(|s| s.to_string()))
                 .collect())
    }

    /// Hash de identidad de la especificación (SHA-256 sobre la forma
    /// serializada estable). Sirve como verificación de integridad y
    /// trazabilidad en metadatos de artefactos; no participa del fingerprint
    /// del engine.
    pub fn spec_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.class_name.as_bytes());
        hasher.update(self.layer.as_bytes());
        hasher.update(self.type_tag.as_bytes());
        for a in &self.attributes {
            hasher.update(a.as_bytes());
        }
        for m in &self.methods {
            hasher.update(m.method_name.as_bytes());
            for p in &m.parameters {
                hasher.update(p.as_bytes());
            }
            hasher.update(m.return_type_or_void().as_bytes());
        }
        for d in &self.dependencies {
            hasher.update(d.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cart_spec() -> ClassSpec {
        serde_json::from_value(json!({
            "class_name": "Cart",
            "layer": "domain/entity",
            "type": "entity",
            "attributes": ["userId: str", "items: list"],
            "methods": [
                { "method_name": "addItem", "parameters": ["productId: str", "quantity: int"] }
            ]
        })).unwrap()
    }

    #[test]
    fn optional_fields_normalize_to_empty_containers() {
        let spec: ClassSpec = serde_json::from_value(json!({
            "class_name": "Cart",
            "layer": "domain/entity",
            "type": "entity"
        })).unwrap();
        assert!(spec.attributes.is_empty());
        assert!(spec.methods.is_empty());
        assert!(spec.dependencies.is_empty());
        assert!(spec.metadata.is_empty());
    }

    #[test]
    fn parsed_attributes_keep_declaration_order() {
        let attrs = cart_spec().parsed_attributes().unwrap();
        assert_eq!(attrs[0].name, "userId");
        assert_eq!(attrs[1].name, "items");
    }

    #[test]
    fn method_return_type_defaults_to_void() {
        let m = &cart_spec().methods[0];
        assert_eq!(m.return_type_or_void(), "void");
    }

    #[test]
    fn allowed_values_read_from_metadata() {
        let spec: ClassSpec = serde_json::from_value(json!({
            "class_name": "Order",
            "layer": "domain/entity",
            "type": "entity",
            "metadata": { "allowed_values": { "status": ["pending", "paid"] } }
        })).unwrap();
        assert_eq!(spec.allowed_values("status").unwrap(), vec!["pending", "paid"]);
        assert!(spec.allowed_values("total").is_none());
    }

    #[test]
    fn spec_hash_is_stable_and_sensitive() {
        let a = cart_spec();
        let b = cart_spec();
        assert_eq!(a.spec_hash(), b.spec_hash());

        let mut c = cart_spec();
        c.attributes.push("total: float".to_string());
        assert_ne!(a.spec_hash(), c.spec_hash());
    }
}

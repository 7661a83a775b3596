// attribute.rs
use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tipos de atributo reconocidos en declaraciones `"name: type"`.
///
/// El mapeo a tipos de almacenamiento (generador de Infrastructure) y las
/// reglas de validación implicadas (generador de Domain) ramifican sobre
/// este enum; los tipos no reconocidos se conservan como `Custom` para
/// referencias cruzadas entre artefactos.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttrType {
    Str,
    Int,
    Float,
    Bool,
    Datetime,
    Date,
    Time,
    Json,
    Bytes,
    Decimal,
    Uuid,
    Custom(String),
}

impl AttrType {
    /// Normaliza el token textual de tipo. Acepta sinónimos frecuentes del
    /// contrato de entrada (`string`/`str`, `number`/`int`, `dict`/`list`).
    pub fn parse(token: &str) -> AttrType {
        match token.trim().to_ascii_lowercase().as_str() {
            "str" | "string" => AttrType::Str,
            "int" | "integer" | "number" => AttrType::Int,
            "float" | "double" => AttrType::Float,
            "bool" | "boolean" => AttrType::Bool,
            "datetime" => AttrType::Datetime,
            "date" => AttrType::Date,
            "time" => AttrType::Time,
            "list" | "dict" | "json" | "object" | "array" => AttrType::Json,
            "bytes" => AttrType::Bytes,
            "decimal" => AttrType::Decimal,
            "uuid" => AttrType::Uuid,
            _ => AttrType::Custom(token.trim().to_string()),
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttrType::Str => "str",
            AttrType::Int => "int",
            AttrType::Float => "float",
            AttrType::Bool => "bool",
            AttrType::Datetime => "datetime",
            AttrType::Date => "date",
            AttrType::Time => "time",
            AttrType::Json => "json",
            AttrType::Bytes => "bytes",
            AttrType::Decimal => "decimal",
            AttrType::Uuid => "uuid",
            AttrType::Custom(c) => c.as_str(),
        };
        write!(f, "{s}")
    }
}

/// Declaración de campo parseada desde un string `"name: type"`.
///
/// El marcador de opcionalidad se acepta como sufijo `?` en el nombre
/// (`deleted_at?: datetime`) o como sufijo `| optional` en el tipo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub ty: AttrType,
    pub optional: bool,
}

impl Attribute {
    /// Parsea una entrada de `attributes`. Una entrada sin `:` o con nombre
    /// vacío es malformada y falla el item completo (sin artefacto parcial).
    pub fn parse(raw: &str) -> Result<Attribute, DomainError> {
        let (name_part, type_part) = raw.split_once(':')
                                        .ok_or_else(|| DomainError::ValidationError(format!(
                                            "atributo malformado (se espera \"name: type\"): '{raw}'"
                                        )))?;
        let mut name = name_part.trim().to_string();
        let mut optional = false;
        if let Some(stripped) = name.strip_suffix('?') {
            name = stripped.trim().to_string();
            optional = true;
        }
        if name.is_empty() {
            return Err(DomainError::ValidationError(format!("atributo con nombre vacío: '{raw}'")));
        }
        let mut type_token = type_part.trim().to_string();
        if let Some(stripped) = type_token.strip_suffix("| optional").or_else(|| type_token.strip_suffix("|optional")) {
            type_token = stripped.trim().to_string();
            optional = true;
        }
        if type_token.is_empty() {
            return Err(DomainError::ValidationError(format!("atributo sin tipo: '{raw}'")));
        }
        Ok(Attribute { name,
                       ty: AttrType::parse(&type_token),
                       optional })
    }

    /// Parsea una secuencia completa preservando el orden de declaración.
    pub fn parse_all(raws: &[String]) -> Result<Vec<Attribute>, DomainError> {
        raws.iter().map(|r| Attribute::parse(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_type() {
        let a = Attribute::parse("quantity: int").unwrap();
        assert_eq!(a.name, "quantity");
        assert_eq!(a.ty, AttrType::Int);
        assert!(!a.optional);
    }

    #[test]
    fn optional_marker_via_question_suffix() {
        let a = Attribute::parse("deleted_at?: datetime").unwrap();
        assert!(a.optional);
        assert_eq!(a.ty, AttrType::Datetime);
    }

    #[test]
    fn optional_marker_via_pipe() {
        let a = Attribute::parse("nickname: str | optional").unwrap();
        assert!(a.optional);
        assert_eq!(a.ty, AttrType::Str);
    }

    #[test]
    fn unknown_type_preserved_as_custom() {
        let a = Attribute::parse("owner: Customer").unwrap();
        assert_eq!(a.ty, AttrType::Custom("Customer".to_string()));
    }

    #[test]
    fn malformed_entry_fails() {
        assert!(Attribute::parse("no_colon_here").is_err());
        assert!(Attribute::parse(": int").is_err());
        assert!(Attribute::parse("name:").is_err());
    }

    #[test]
    fn parse_all_preserves_order_and_fails_fast() {
        let raws = vec!["a: int".to_string(), "b: str".to_string()];
        let parsed = Attribute::parse_all(&raws).unwrap();
        assert_eq!(parsed[0].name, "a");
        assert_eq!(parsed[1].name, "b");

        let bad = vec!["a: int".to_string(), "rota".to_string()];
        assert!(Attribute::parse_all(&bad).is_err());
    }
}

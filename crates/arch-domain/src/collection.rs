// collection.rs
use crate::DomainError;
use serde::{Deserialize, Serialize};

/// Renglón de una colección con cantidad (`productId` + `quantity` en el
/// caso canónico del carrito).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub key: String,
    pub quantity: u32,
}

/// Modelo de referencia de la semántica de colección con merge por clave
/// que el generador de Domain emite para métodos `add*` sobre colecciones
/// de items.
///
/// Reglas:
/// - Agregar una clave existente suma cantidades (merge-by-key), nunca
///   duplica renglones.
/// - Cantidad cero o clave vacía fallan con `DomainError::ValidationError`
///   indicando el campo ofensor.
/// - Las operaciones devuelven una nueva instancia; la colección original
///   no se muta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyedQuantityCollection {
    items: Vec<LineItem>,
}

impl KeyedQuantityCollection {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Agrega `quantity` unidades bajo `key`, fusionando con un renglón
    /// existente si lo hay. El orden de primeras apariciones se preserva.
    pub fn add(&self, key: &str, quantity: u32) -> Result<Self, DomainError> {
        if key.trim().is_empty() {
            return Err(DomainError::ValidationError("key: no puede estar vacío".to_string()));
        }
        if quantity == 0 {
            return Err(DomainError::ValidationError("quantity: debe ser mayor que cero".to_string()));
        }
        let mut items = self.items.clone();
        match items.iter_mut().find(|i| i.key == key) {
            Some(existing) => existing.quantity += quantity,
            None => items.push(LineItem { key: key.to_string(), quantity }),
        }
        Ok(Self { items })
    }

    /// Elimina el renglón de `key`. Falla si la clave no existe.
    pub fn remove(&self, key: &str) -> Result<Self, DomainError> {
        if !self.items.iter().any(|i| i.key == key) {
            return Err(DomainError::ValidationError(format!("key: '{key}' no existe en la colección")));
        }
        let items = self.items.iter().filter(|i| i.key != key).cloned().collect();
        Ok(Self { items })
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_read_round_trip() {
        let c = KeyedQuantityCollection::new().add("p1", 2).unwrap();
        assert_eq!(c.items(), &[LineItem { key: "p1".into(), quantity: 2 }]);
    }

    #[test]
    fn add_same_key_merges_quantities() {
        let c = KeyedQuantityCollection::new().add("p1", 2)
                                              .unwrap()
                                              .add("p1", 3)
                                              .unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.items()[0].quantity, 5);
    }

    #[test]
    fn add_zero_quantity_fails_with_validation_error() {
        let err = KeyedQuantityCollection::new().add("p1", 0).unwrap_err();
        match err {
            DomainError::ValidationError(msg) => assert!(msg.contains("quantity")),
            other => panic!("error inesperado: {other:?}"),
        }
    }

    #[test]
    fn add_does_not_mutate_original() {
        let base = KeyedQuantityCollection::new().add("p1", 1).unwrap();
        let _bigger = base.add("p2", 1).unwrap();
        assert_eq!(base.len(), 1);
    }

    #[test]
    fn remove_missing_key_fails() {
        let c = KeyedQuantityCollection::new();
        assert!(c.remove("ghost").is_err());
    }
}

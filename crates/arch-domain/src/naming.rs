// naming.rs
use crate::DomainError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Prefijos CRUD que se descartan al derivar el nombre base.
const CRUD_PREFIXES: &[&str] = &["Create", "Update", "Delete", "Get", "List"];

/// Sufijos de rol que se descartan al derivar el nombre base.
const ROLE_SUFFIXES: &[&str] = &["Request", "Response", "UseCase", "Repository", "Service"];

/// Tabla de plurales irregulares (consultada antes de las reglas regulares).
/// La clave es la forma snake_case singular.
static IRREGULAR_PLURALS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("person", "people");
    m.insert("child", "children");
    m.insert("foot", "feet");
    m.insert("tooth", "teeth");
    m.insert("mouse", "mice");
    m.insert("goose", "geese");
    m.insert("man", "men");
    m.insert("woman", "women");
    m
});

/// Conjunto de identificadores canónicos derivados de un `class_name`.
///
/// Todas las formas son función pura del nombre de entrada: el mismo
/// `class_name` produce siempre el mismo `NameSet` (sin estado oculto ni
/// aleatoriedad). Los generadores de cada capa consumen estas formas para
/// construir rutas de archivo y referencias cruzadas consistentes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameSet {
    /// Nombre base sin afijos CRUD/rol (ej. `Product` de `CreateProductUseCase`).
    pub base: String,
    /// Forma snake_case del base.
    pub snake_base: String,
    /// Forma PascalCase del base.
    pub pascal_base: String,
    /// Plural snake_case del base (tabla irregular primero, luego reglas).
    pub plural_snake_base: String,
    /// Forma snake_case del class_name completo (sin stripping).
    pub snake_class: String,
}

/// Deriva el `NameSet` canónico de un nombre de clase crudo.
///
/// Descarta repetidamente prefijos CRUD y sufijos de rol hasta alcanzar un
/// punto fijo. Falla con `DomainError::NamingError` únicamente si el nombre
/// queda vacío tras el stripping (ej. `class_name == "Request"`).
pub fn resolve(class_name: &str) -> Result<NameSet, DomainError> {
    let trimmed = class_name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::NamingError("class_name vacío".to_string()));
    }
    let base = strip_affixes(trimmed);
    if base.is_empty() {
        return Err(DomainError::NamingError(format!(
            "el nombre '{trimmed}' queda vacío tras descartar afijos"
        )));
    }
    let snake_base = to_snake_case(&base);
    let pascal_base = to_pascal_case(&snake_base);
    let plural_snake_base = pluralize_snake(&snake_base);
    Ok(NameSet { base: base.clone(),
                 snake_base,
                 pascal_base,
                 plural_snake_base,
                 snake_class: to_snake_case(trimmed) })
}

/// Descarta afijos hasta punto fijo. El orden es prefijos primero y luego
/// sufijos en cada pasada, de modo que `CreateProductUseCase` -> `Product`.
fn strip_affixes(name: &str) -> String {
    let mut current = name.to_string();
    loop {
        let before = current.clone();
        for p in CRUD_PREFIXES {
            if current.len() > p.len() && current.starts_with(p) {
                // Solo descartar si lo que sigue inicia palabra nueva (mayúscula),
                // para no mutilar nombres como "Getaway".
                let rest = &current[p.len()..];
                if rest.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
                    current = rest.to_string();
                }
            }
        }
        for s in ROLE_SUFFIXES {
            if current.len() >= s.len() && current.ends_with(s) {
                current = current[..current.len() - s.len()].to_string();
            }
        }
        if current == before {
            break;
        }
    }
    current
}

/// Convierte a snake_case detectando transiciones de mayúsculas, incluyendo
/// corridas de acrónimos: `HTTPServer` -> `http_server`, `CartItem` ->
/// `cart_item`.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' {
            out.push('_');
            continue;
        }
        if c.is_uppercase() {
            let prev_lower = i > 0 && chars[i - 1].is_lowercase();
            let next_lower = i + 1 < chars.len() && chars[i + 1].is_lowercase();
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if i > 0 && (prev_lower || (prev_upper && next_lower)) && !out.ends_with('_') {
                out.push('_');
            }
            for lc in c.to_lowercase() {
                out.push(lc);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Convierte snake_case (o kebab-case) a PascalCase.
pub fn to_pascal_case(s: &str) -> String {
    s.split(['_', '-'])
     .map(|part| {
         let mut chars = part.chars();
         match chars.next() {
             None => String::new(),
             Some(first) => {
                 let upper: String = first.to_uppercase().collect();
                 upper + chars.as_str()
             }
         }
     })
     .collect()
}

/// Pluraliza el último segmento de una forma snake_case.
///
/// Reglas: tabla irregular, luego `y` precedida de consonante -> `ies`,
/// terminaciones sibilantes (`s|x|z|ch|sh`) -> `es`, resto -> `s`.
pub fn pluralize_snake(snake: &str) -> String {
    let (head, last) = match snake.rfind('_') {
        Some(idx) => (&snake[..=idx], &snake[idx + 1..]),
        None => ("", snake),
    };
    if let Some(p) = IRREGULAR_PLURALS.get(last) {
        return format!("{head}{p}");
    }
    let plural = if let Some(stem) = last.strip_suffix('y') {
        let penult = stem.chars().last();
        let is_vowel = matches!(penult, Some('a' | 'e' | 'i' | 'o' | 'u'));
        if is_vowel || stem.is_empty() {
            format!("{last}s")
        } else {
            format!("{stem}ies")
        }
    } else if last.ends_with('s')
              || last.ends_with('x')
              || last.ends_with('z')
              || last.ends_with("ch")
              || last.ends_with("sh")
    {
        format!("{last}es")
    } else {
        format!("{last}s")
    };
    format!("{head}{plural}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_crud_prefix_and_role_suffix() {
        let n = resolve("CreateProductUseCase").unwrap();
        assert_eq!(n.base, "Product");
        assert_eq!(n.snake_base, "product");
        assert_eq!(n.pascal_base, "Product");
        assert_eq!(n.snake_class, "create_product_use_case");
    }

    #[test]
    fn strips_nested_affixes_to_fixed_point() {
        // Prefijo + dos sufijos encadenados.
        let n = resolve("GetCartItemRequest").unwrap();
        assert_eq!(n.base, "CartItem");
        assert_eq!(n.snake_base, "cart_item");
    }

    #[test]
    fn name_equal_to_affix_fails_with_naming_error() {
        let err = resolve("Request").unwrap_err();
        assert!(matches!(err, DomainError::NamingError(_)));
    }

    #[test]
    fn resolve_is_deterministic() {
        let a = resolve("UpdateOrderRepository").unwrap();
        let b = resolve("UpdateOrderRepository").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn snake_case_handles_acronym_runs() {
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("CartItemDTO"), "cart_item_dto");
    }

    #[test]
    fn prefix_not_stripped_mid_word() {
        // "Getaway" no debe perder "Get" porque lo que sigue no inicia palabra.
        let n = resolve("Getaway").unwrap();
        assert_eq!(n.base, "Getaway");
    }

    #[test]
    fn plural_regular_and_irregular() {
        assert_eq!(resolve("Category").unwrap().plural_snake_base, "categories");
        assert_eq!(resolve("Order").unwrap().plural_snake_base, "orders");
        assert_eq!(resolve("Person").unwrap().plural_snake_base, "people");
        assert_eq!(resolve("Box").unwrap().plural_snake_base, "boxes");
        assert_eq!(resolve("Dish").unwrap().plural_snake_base, "dishes");
        assert_eq!(resolve("Day").unwrap().plural_snake_base, "days");
    }

    #[test]
    fn plural_applies_to_last_segment_only() {
        assert_eq!(pluralize_snake("cart_item"), "cart_items");
        assert_eq!(pluralize_snake("sales_person"), "sales_people");
    }
}

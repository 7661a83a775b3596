//! Layout canónico de rutas de artefactos.
//!
//! Todas las rutas son función determinista del `NameSet` resuelto y la
//! variante de capa; el prefijo de namespace del router se aplica únicamente
//! aquí (nunca duplicado entre declaración y registro).
//!
//! Un token de rol ya presente en el nombre (`CartModel`, `CartStore`,
//! `CartRouter`, ...) se descarta antes de derivar el stem para no
//! duplicarlo en la ruta (`cart_model.ts`, no `cart_model_model.ts`).

use arch_domain::{naming, Layer, NameSet};

/// Descarta el primer token de rol que matchee al final del stem snake.
fn trim_snake(snake: &str, tokens: &[&str]) -> String {
    for t in tokens {
        if let Some(stripped) = snake.strip_suffix(t) {
            let stripped = stripped.trim_end_matches('_');
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    snake.to_string()
}

/// Stem snake del feature para una variante de capa (rol descartado).
pub fn feature_stem(layer: &Layer, names: &NameSet) -> String {
    let tokens: &[&str] = match layer.kind() {
        "store" => &["store"],
        "model" => &["model"],
        "schema" => &["schemas", "schema"],
        "dependency" => &["dependencies", "dependency"],
        "router" => &["router", "routers"],
        "hook" => &["hook"],
        "component" => &["view", "component"],
        _ => &[],
    };
    trim_snake(&names.snake_base, tokens)
}

/// Stem PascalCase del feature (rol descartado), para nombres de clase
/// emitidos (`CartStore` -> base `Cart` -> clase `CartStore`).
pub fn feature_pascal(layer: &Layer, names: &NameSet) -> String {
    naming::to_pascal_case(&feature_stem(layer, names))
}

/// Ruta de código para una variante de capa dada.
pub fn code_path(layer: &Layer, names: &NameSet) -> String {
    let stem = feature_stem(layer, names);
    match layer.as_str() {
        "domain/entity" => format!("src/domain/entities/{}.ts", names.snake_base),
        "domain/service" => format!("src/domain/services/{}.ts", names.snake_class),
        "application/interface" => format!("src/application/interfaces/{}.ts", names.snake_class),
        "application/use_case" => format!("src/application/use_cases/{}.ts", names.snake_class),
        "application/store" => format!("src/application/stores/{stem}_store.ts"),
        "infrastructure/model" => format!("src/infrastructure/models/{stem}_model.ts"),
        "infrastructure/repository" => format!("src/infrastructure/repositories/{}.ts", names.snake_class),
        "infrastructure/adapter" => format!("src/infrastructure/adapters/{}.ts", names.snake_class),
        "presentation/schema" => format!("src/presentation/schemas/{stem}_schemas.ts"),
        "presentation/dependency" => format!("src/presentation/dependencies/{stem}_dependencies.ts"),
        "presentation/router" => {
            format!("src/presentation/routers/{}_router.ts", naming::pluralize_snake(&stem))
        }
        "presentation/component" => format!("src/presentation/components/{}.tsx", names.pascal_base),
        "presentation/hook" => format!("src/presentation/hooks/use_{stem}.ts"),
        other => format!("src/{}/{}.ts", other, names.snake_class),
    }
}

/// Ruta de test espejo bajo `tests/`, con sufijo `.test` antes de la
/// extensión.
pub fn test_path(layer: &Layer, names: &NameSet) -> String {
    let code = code_path(layer, names);
    let mirrored = code.replacen("src/", "tests/", 1);
    if let Some(stem) = mirrored.strip_suffix(".tsx") {
        format!("{stem}.test.tsx")
    } else if let Some(stem) = mirrored.strip_suffix(".ts") {
        format!("{stem}.test.ts")
    } else {
        format!("{mirrored}.test")
    }
}

/// Prefijo de namespace del router (plural snake del stem del feature,
/// tabla de irregulares consultada antes de las reglas regulares).
pub fn router_prefix(layer: &Layer, names: &NameSet) -> String {
    format!("/{}", naming::pluralize_snake(&feature_stem(layer, names)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch_domain::resolve;

    fn layer(s: &str) -> Layer {
        Layer::parse(s).unwrap()
    }

    #[test]
    fn entity_paths_use_snake_base() {
        let names = resolve("Cart").unwrap();
        assert_eq!(code_path(&layer("domain/entity"), &names), "src/domain/entities/cart.ts");
        assert_eq!(test_path(&layer("domain/entity"), &names), "tests/domain/entities/cart.test.ts");
    }

    #[test]
    fn use_case_paths_use_full_class_name() {
        let names = resolve("AddToCartUseCase").unwrap();
        assert_eq!(code_path(&layer("application/use_case"), &names),
                   "src/application/use_cases/add_to_cart_use_case.ts");
    }

    #[test]
    fn role_token_is_not_duplicated() {
        let model = resolve("CartModel").unwrap();
        assert_eq!(code_path(&layer("infrastructure/model"), &model),
                   "src/infrastructure/models/cart_model.ts");

        let store = resolve("CartStore").unwrap();
        assert_eq!(code_path(&layer("application/store"), &store),
                   "src/application/stores/cart_store.ts");
    }

    #[test]
    fn router_paths_pluralize_the_feature_stem() {
        let names = resolve("CategoryRouter").unwrap();
        assert_eq!(code_path(&layer("presentation/router"), &names),
                   "src/presentation/routers/categories_router.ts");
        assert_eq!(router_prefix(&layer("presentation/router"), &names), "/categories");

        let person = resolve("PersonRouter").unwrap();
        assert_eq!(router_prefix(&layer("presentation/router"), &person), "/people");
    }

    #[test]
    fn hook_and_component_stems_align() {
        let hook = resolve("CartHook").unwrap();
        assert_eq!(code_path(&layer("presentation/hook"), &hook), "src/presentation/hooks/use_cart.ts");

        let view = resolve("CartView").unwrap();
        // El archivo del componente conserva el nombre Pascal completo, pero
        // su stem de feature coincide con el del hook.
        assert_eq!(code_path(&layer("presentation/component"), &view),
                   "src/presentation/components/CartView.tsx");
        assert_eq!(feature_stem(&layer("presentation/component"), &view), "cart");
    }

    #[test]
    fn component_test_path_keeps_tsx() {
        let names = resolve("Cart").unwrap();
        assert_eq!(test_path(&layer("presentation/component"), &names),
                   "tests/presentation/components/Cart.test.tsx");
    }
}

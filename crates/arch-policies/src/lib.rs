//! arch-policies – Reglas de capas y convenciones de puertos
//!
//! Provee contratos y implementaciones deterministas para las reglas
//! estáticas del pipeline de generación:
//! - convención de nombres de puertos (`I` + mayúscula) en dependencias,
//! - dirección de dependencias entre capas (Presentation -> Application ->
//!   Domain; Infrastructure implementa puertos de Application).
//!
//! Las políticas no tienen efectos secundarios: devuelven violaciones
//! tipadas con severidad, y el paso de validación decide si son fatales para
//! el item (Error) o sólo lint (Warning).

use arch_domain::ClassSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severidad de una violación de política.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    /// Bloquea la generación del item.
    Error,
    /// Advisoria: la generación continúa, la violación queda registrada.
    Warning,
}

/// Una violación puntual detectada por una política.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    /// Id estático de la política que detectó el problema.
    pub policy_id: String,
    pub severity: Severity,
    /// Descripción del problema, nombrando al ofensor concreto.
    pub message: String,
    /// Ubicación dentro del spec (ej. `dependencies[1]`).
    pub location: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        };
        write!(f, "[{}] {} ({}): {}", tag, self.location, self.policy_id, self.message)
    }
}

/// Contrato de políticas estáticas sobre specs de clase.
pub trait SpecPolicy {
    fn id(&self) -> &'static str;
    fn check(&self, spec: &ClassSpec) -> Vec<Violation>;
}

/// ¿El nombre cumple la convención de puerto (`I` seguida de mayúscula)?
pub fn is_port_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some('I'), Some(c)) if c.is_uppercase())
}

/// Política: las dependencias de `application/use_case` e
/// `infrastructure/adapter` deben nombrar puertos (`I` + mayúscula), nunca
/// clases concretas. Es el único chequeo estático que impide que
/// Presentation/Infrastructure dependan silenciosamente de implementaciones
/// en lugar de contratos.
pub struct PortNamingPolicy;

impl PortNamingPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Capas cuyas dependencias se validan en forma estricta.
    fn applies_to(layer: &str) -> bool {
        layer == "application/use_case" || layer == "infrastructure/adapter"
    }
}

impl Default for PortNamingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecPolicy for PortNamingPolicy {
    fn id(&self) -> &'static str {
        "port_naming"
    }

    fn check(&self, spec: &ClassSpec) -> Vec<Violation> {
        let mut out = Vec::new();
        if Self::applies_to(&spec.layer) {
            for (idx, dep) in spec.dependencies.iter().enumerate() {
                if !is_port_name(dep) {
                    out.push(Violation { policy_id: self.id().to_string(),
                                         severity: Severity::Error,
                                         message: format!("la dependencia '{dep}' no cumple la convención de puerto (I + Mayúscula)"),
                                         location: format!("dependencies[{idx}]") });
                }
            }
        }
        // Asimetría resuelta como lint: una interface declarada sin prefijo I
        // se reporta como advertencia, nunca como falla dura.
        if spec.layer == "application/interface" && !is_port_name(&spec.class_name) {
            out.push(Violation { policy_id: self.id().to_string(),
                                 severity: Severity::Warning,
                                 message: format!("la interface '{}' no lleva prefijo I", spec.class_name),
                                 location: "class_name".to_string() });
        }
        out
    }
}

/// Política: dirección de dependencias entre capas.
///
/// - Specs de Domain no declaran dependencias (el dominio no depende de
///   nadie).
/// - Specs de Presentation sólo pueden depender de puertos de Application
///   (misma forma `I` + mayúscula); el cableado a adapters concretos ocurre
///   únicamente en los providers generados.
pub struct LayerDirectionPolicy;

impl LayerDirectionPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LayerDirectionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecPolicy for LayerDirectionPolicy {
    fn id(&self) -> &'static str {
        "layer_direction"
    }

    fn check(&self, spec: &ClassSpec) -> Vec<Violation> {
        let mut out = Vec::new();
        let prefix = spec.layer.split('/').next().unwrap_or("");
        match prefix {
            "domain" => {
                for (idx, dep) in spec.dependencies.iter().enumerate() {
                    out.push(Violation { policy_id: self.id().to_string(),
                                         severity: Severity::Error,
                                         message: format!("la capa domain no puede declarar dependencias ('{dep}')"),
                                         location: format!("dependencies[{idx}]") });
                }
            }
            "presentation" => {
                for (idx, dep) in spec.dependencies.iter().enumerate() {
                    if !is_port_name(dep) {
                        out.push(Violation { policy_id: self.id().to_string(),
                                             severity: Severity::Error,
                                             message: format!("presentation debe depender de puertos de application, no de '{dep}'"),
                                             location: format!("dependencies[{idx}]") });
                    }
                }
            }
            _ => {}
        }
        out
    }
}

/// Evalúa el conjunto estándar de políticas sobre un spec y concatena las
/// violaciones en orden estable (orden de política, luego orden de campo).
pub fn evaluate(spec: &ClassSpec) -> Vec<Violation> {
    let policies: Vec<Box<dyn SpecPolicy>> = vec![Box::new(PortNamingPolicy::new()),
                                                  Box::new(LayerDirectionPolicy::new())];
    policies.iter().flat_map(|p| p.check(spec)).collect()
}

/// ¿Alguna violación con severidad `Error`?
pub fn has_errors(violations: &[Violation]) -> bool {
    violations.iter().any(|v| v.severity == Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn use_case_spec(deps: &[&str]) -> ClassSpec {
        serde_json::from_value(json!({
            "class_name": "AddToCartUseCase",
            "layer": "application/use_case",
            "type": "use_case",
            "dependencies": deps,
        })).unwrap()
    }

    #[test]
    fn concrete_dependency_name_is_an_error() {
        let violations = evaluate(&use_case_spec(&["CartRepo"]));
        assert!(has_errors(&violations));
        assert!(violations[0].message.contains("CartRepo"));
        assert_eq!(violations[0].location, "dependencies[0]");
    }

    #[test]
    fn port_dependency_name_passes() {
        let violations = evaluate(&use_case_spec(&["ICartRepo"]));
        assert!(violations.is_empty());
    }

    #[test]
    fn lowercase_after_i_is_not_a_port() {
        // "Inventory" arranca con I pero la segunda letra es minúscula.
        assert!(is_port_name("ICartRepo"));
        assert!(!is_port_name("Inventory"));
        assert!(!is_port_name("cartRepo"));
        assert!(!is_port_name("I"));
    }

    #[test]
    fn interface_without_prefix_is_warning_only() {
        let spec: ClassSpec = serde_json::from_value(json!({
            "class_name": "CartRepository",
            "layer": "application/interface",
            "type": "interface",
        })).unwrap();
        let violations = evaluate(&spec);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Warning);
        assert!(!has_errors(&violations));
    }

    #[test]
    fn domain_with_dependencies_is_an_error() {
        let spec: ClassSpec = serde_json::from_value(json!({
            "class_name": "Cart",
            "layer": "domain/entity",
            "type": "entity",
            "dependencies": ["ICartRepo"],
        })).unwrap();
        assert!(has_errors(&evaluate(&spec)));
    }

    #[test]
    fn adapter_dependencies_checked_strictly() {
        let spec: ClassSpec = serde_json::from_value(json!({
            "class_name": "StripePaymentAdapter",
            "layer": "infrastructure/adapter",
            "type": "adapter",
            "dependencies": ["PaymentGateway"],
        })).unwrap();
        assert!(has_errors(&evaluate(&spec)));
    }
}

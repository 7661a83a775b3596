//! Dispatcher por prefijo de capa y contrato de generadores.
//!
//! El router es una máquina de estados de cuatro ramas terminales sobre el
//! segmento antes de `/` en `layer`. No contiene lógica de negocio: su única
//! responsabilidad es seleccionar la rama y pasar el `ValidatedItem`
//! completo, sin transformar campos. Un prefijo desconocido produce
//! `SpecError::Routing` (fatal para el item, el batch continúa).

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

use arch_domain::{AttrType, Attribute};
use std::collections::BTreeSet;

use crate::artifacts::{GeneratedModule, ValidatedItem};
use crate::spec_error::SpecError;

pub use application::ApplicationGenerator;
pub use domain::DomainGenerator;
pub use infrastructure::InfrastructureGenerator;
pub use presentation::PresentationGenerator;

/// Índice de nombres presentes en el batch actual.
///
/// Los generadores lo consultan para decidir si una referencia cruzada se
/// resuelve contra un artefacto del mismo batch o degrada a un stand-in
/// local (regla de placeholder: la generación nunca se bloquea por
/// información parcial).
#[derive(Debug, Clone, Default)]
pub struct BatchIndex {
    class_names: BTreeSet<String>,
}

impl BatchIndex {
    pub fn from_items(items: &[ValidatedItem]) -> Self {
        let class_names = items.iter().map(|i| i.spec.class_name.clone()).collect();
        Self { class_names }
    }

    /// ¿La clase (interface, entidad, ...) está declarada en este batch?
    pub fn contains(&self, class_name: &str) -> bool {
        self.class_names.contains(class_name)
    }
}

/// Estrategia de generación de una capa completa.
pub trait LayerGenerator: Sync + std::fmt::Debug {
    /// Prefijo de capa que esta estrategia atiende.
    fn layer_prefix(&self) -> &'static str;

    /// Genera el módulo (código + test) para un item validado.
    fn generate(&self, item: &ValidatedItem, index: &BatchIndex) -> Result<GeneratedModule, SpecError>;
}

static DOMAIN_GEN: DomainGenerator = DomainGenerator;
static APPLICATION_GEN: ApplicationGenerator = ApplicationGenerator;
static INFRASTRUCTURE_GEN: InfrastructureGenerator = InfrastructureGenerator;
static PRESENTATION_GEN: PresentationGenerator = PresentationGenerator;

/// Selecciona el generador para un prefijo de capa. Función pura del
/// prefijo: la misma entrada elige siempre la misma rama.
pub fn route(prefix: &str) -> Result<&'static dyn LayerGenerator, SpecError> {
    match prefix {
        "domain" => Ok(&DOMAIN_GEN),
        "application" => Ok(&APPLICATION_GEN),
        "infrastructure" => Ok(&INFRASTRUCTURE_GEN),
        "presentation" => Ok(&PRESENTATION_GEN),
        other => Err(SpecError::routing(other)),
    }
}

// ---------------------------------------------------------------
// Helpers de render compartidos por los generadores.
// ---------------------------------------------------------------

/// Mapeo de tipo de atributo a tipo TypeScript.
pub(crate) fn ts_type(ty: &AttrType) -> String {
    match ty {
        AttrType::Str | AttrType::Uuid => "string".to_string(),
        AttrType::Int | AttrType::Float | AttrType::Decimal => "number".to_string(),
        AttrType::Bool => "boolean".to_string(),
        AttrType::Datetime | AttrType::Date | AttrType::Time => "Date".to_string(),
        AttrType::Json => "Record<string, unknown>".to_string(),
        AttrType::Bytes => "Uint8Array".to_string(),
        AttrType::Custom(name) => name.clone(),
    }
}

/// Firma TypeScript de una lista de parámetros ya parseados.
pub(crate) fn ts_params(params: &[Attribute]) -> String {
    params.iter()
          .map(|p| {
              let opt = if p.optional { "?" } else { "" };
              format!("{}{}: {}", p.name, opt, ts_type(&p.ty))
          })
          .collect::<Vec<_>>()
          .join(", ")
}

/// Encabezado común de los módulos emitidos. Incluye un prefijo del hash de
/// identidad del spec como marca de procedencia: re-generar desde el mismo
/// spec produce el mismo encabezado.
pub(crate) fn module_header(spec: &arch_domain::ClassSpec) -> String {
    let hash = spec.spec_hash();
    let short = &hash[..hash.len().min(12)];
    format!("// {} — {} artifact (spec {short}).\n// Auto-generated module: regenerate via the class-spec batch instead of editing.\n\n",
            spec.class_name, spec.layer)
}

/// Declaración (una por módulo) del error que lanzan los stand-ins.
pub(crate) fn not_implemented_error_block() -> &'static str {
    "export class NotImplementedError extends Error {\n\
     \x20 constructor(op: string) { super(`${op} is not implemented`); this.name = \"NotImplementedError\"; }\n\
     }\n\n"
}

/// Stand-in local para un tipo referenciado ausente del batch actual.
/// Marcado como auto-generado y seguro de borrar cuando exista el tipo real.
/// Requiere `not_implemented_error_block` emitido antes en el mismo módulo.
pub(crate) fn placeholder_type(name: &str) -> String {
    format!("// AUTO-GENERATED PLACEHOLDER for missing type '{name}'.\n\
             // Safe to delete once the real declaration joins a batch.\n\
             export class {name} {{\n\
             \x20 constructor() {{ throw new NotImplementedError(\"{name}\"); }}\n\
             }}\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_is_total_over_known_prefixes() {
        for p in ["domain", "application", "infrastructure", "presentation"] {
            assert_eq!(route(p).unwrap().layer_prefix(), p);
        }
    }

    #[test]
    fn route_rejects_unknown_prefix() {
        let err = route("persistence").unwrap_err();
        assert_eq!(err, SpecError::routing("persistence"));
    }

    #[test]
    fn ts_type_mapping_is_fixed() {
        assert_eq!(ts_type(&AttrType::Str), "string");
        assert_eq!(ts_type(&AttrType::Int), "number");
        assert_eq!(ts_type(&AttrType::Bool), "boolean");
        assert_eq!(ts_type(&AttrType::Custom("Money".into())), "Money");
    }
}

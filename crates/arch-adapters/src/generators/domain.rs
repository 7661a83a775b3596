//! Generador de la capa Domain (`domain/entity`, `domain/service`).
//!
//! Entidades: estructura de datos con exactamente los campos declarados en
//! `attributes`, validación implicada por los tipos (strings no vacíos,
//! números no negativos, pertenencia a enum cuando `metadata` aporta
//! `allowed_values`) y los métodos declarados con su firma exacta. Un método
//! `add*` sobre una colección de items recibe la semántica canónica de merge
//! por clave (modelo de referencia: `arch_domain::KeyedQuantityCollection`).
//!
//! Servicios: colección sin estado de operaciones; la pureza de cada
//! operación es disciplina del implementador final, no se chequea en
//! runtime.

use arch_domain::{AttrType, Attribute};

use super::{module_header, ts_params, ts_type, BatchIndex, LayerGenerator};
use crate::artifacts::{GeneratedModule, ValidatedItem};
use crate::paths;
use crate::spec_error::SpecError;

#[derive(Debug)]
pub struct DomainGenerator;

impl LayerGenerator for DomainGenerator {
    fn layer_prefix(&self) -> &'static str {
        "domain"
    }

    fn generate(&self, item: &ValidatedItem, _index: &BatchIndex) -> Result<GeneratedModule, SpecError> {
        let layer = arch_domain::Layer::unchecked(&item.spec.layer);
        let attrs = item.spec
                        .parsed_attributes()
                        .map_err(|e| SpecError::schema(e.to_string(), "attributes"))?;
        let code = match layer.kind() {
            "entity" => render_entity(item, &attrs)?,
            "service" => render_service(item)?,
            other => return Err(SpecError::schema(format!("variante de capa domain no soportada: '{other}'"), "layer")),
        };
        let test = match layer.kind() {
            "entity" => render_entity_test(item, &attrs),
            _ => render_service_test(item),
        };
        Ok(GeneratedModule { code_path: paths::code_path(&layer, &item.names),
                             code,
                             test_path: paths::test_path(&layer, &item.names),
                             test })
    }
}

/// Regla de validación por campo implicada por su tipo declarado.
/// `accessor` es la expresión que lee el valor (ej. `props.userId`).
fn field_validation(attr: &Attribute, allowed: Option<&Vec<String>>, accessor: &str) -> Option<String> {
    if attr.optional {
        return None;
    }
    let name = &attr.name;
    if let Some(values) = allowed {
        let list = values.iter().map(|v| format!("\"{v}\"")).collect::<Vec<_>>().join(", ");
        return Some(format!(
            "    if (![{list}].includes({accessor} as string)) {{\n      throw new ValidationError(\"{name}\", `{name} must be one of: {list}`);\n    }}\n"
        ));
    }
    match attr.ty {
        AttrType::Str | AttrType::Uuid => Some(format!(
            "    if (!{accessor} || {accessor}.trim().length === 0) {{\n      throw new ValidationError(\"{name}\", \"{name} must not be empty\");\n    }}\n"
        )),
        AttrType::Int | AttrType::Float | AttrType::Decimal => Some(format!(
            "    if ({accessor} < 0) {{\n      throw new ValidationError(\"{name}\", \"{name} must not be negative\");\n    }}\n"
        )),
        _ => None,
    }
}

/// ¿El método es un `add*` con forma (clave: string, cantidad: number)?
fn is_keyed_add(method: &arch_domain::MethodSpec, params: &[Attribute]) -> bool {
    method.method_name.starts_with("add")
    && params.len() == 2
    && matches!(params[0].ty, AttrType::Str | AttrType::Uuid | AttrType::Custom(_))
    && matches!(params[1].ty, AttrType::Int)
}

fn render_entity(item: &ValidatedItem, attrs: &[Attribute]) -> Result<String, SpecError> {
    let spec = &item.spec;
    let class = &item.names.pascal_base;
    let mut out = module_header(spec);

    out.push_str("export class ValidationError extends Error {\n  constructor(public readonly field: string, message: string) {\n    super(message);\n    this.name = \"ValidationError\";\n  }\n}\n\n");
    out.push_str("export interface LineItem {\n  key: string;\n  quantity: number;\n}\n\n");

    // Props tipadas con exactamente los campos declarados.
    out.push_str(&format!("export interface {class}Props {{\n"));
    for a in attrs {
        let opt = if a.optional { "?" } else { "" };
        out.push_str(&format!("  {}{}: {};\n", a.name, opt, ts_type(&a.ty)));
    }
    out.push_str("}\n\n");

    out.push_str(&format!("export class {class} {{\n"));
    // `lineItems` para no chocar con un atributo declarado llamado `items`.
    out.push_str("  private lineItems: LineItem[] = [];\n\n");
    out.push_str(&format!("  constructor(private readonly props: {class}Props) {{\n"));
    for a in attrs {
        let allowed = spec.allowed_values(&a.name);
        let accessor = format!("props.{}", a.name);
        if let Some(rule) = field_validation(a, allowed.as_ref(), &accessor) {
            out.push_str(&rule);
        }
    }
    out.push_str("  }\n\n");

    for a in attrs {
        out.push_str(&format!("  get {name}(): {ty} {{\n    return this.props.{name};\n  }}\n\n",
                              name = a.name,
                              ty = format!("{}{}", ts_type(&a.ty), if a.optional { " | undefined" } else { "" })));
    }

    for m in &spec.methods {
        let params = m.parsed_parameters()
                      .map_err(|e| SpecError::schema(e.to_string(), format!("methods[{}].parameters", m.method_name)))?;
        if is_keyed_add(m, &params) {
            let key = &params[0].name;
            let qty = &params[1].name;
            out.push_str(&format!(
                "  {name}({sig}): LineItem[] {{\n\
                 \x20   if ({qty} <= 0) {{\n      throw new ValidationError(\"{qty}\", \"{qty} must be greater than zero\");\n    }}\n\
                 \x20   const existing = this.lineItems.find((i) => i.key === {key});\n\
                 \x20   if (existing) {{\n      existing.quantity += {qty};\n    }} else {{\n      this.lineItems.push({{ key: {key}, quantity: {qty} }});\n    }}\n\
                 \x20   return this.lineItems;\n\
                 \x20 }}\n\n",
                name = m.method_name,
                sig = ts_params(&params)
            ));
        } else {
            let ret = ts_return(m);
            out.push_str(&format!(
                "  {name}({sig}): {ret} {{\n    throw new Error(\"{name} requires a concrete business rule\");\n  }}\n\n",
                name = m.method_name,
                sig = ts_params(&params),
            ));
        }
    }
    out.push_str("  getItems(): LineItem[] {\n    return [...this.lineItems];\n  }\n}\n");
    Ok(out)
}

fn render_service(item: &ValidatedItem) -> Result<String, SpecError> {
    let spec = &item.spec;
    let mut out = module_header(spec);
    out.push_str("// Stateless operation set: every operation must stay pure\n// (same inputs -> same outputs; no IO, no randomness, no ambient time).\n\n");
    for m in &spec.methods {
        let params = m.parsed_parameters()
                      .map_err(|e| SpecError::schema(e.to_string(), format!("methods[{}].parameters", m.method_name)))?;
        let ret = ts_return(m);
        if let Some(desc) = &m.description {
            out.push_str(&format!("/** {desc} */\n"));
        }
        out.push_str(&format!("export function {name}({sig}): {ret} {{\n  throw new Error(\"{name} requires a concrete business rule\");\n}}\n\n",
                              name = m.method_name,
                              sig = ts_params(&params)));
    }
    Ok(out)
}

fn ts_return(m: &arch_domain::MethodSpec) -> String {
    let raw = m.return_type_or_void();
    if raw == "void" {
        "void".to_string()
    } else {
        ts_type(&AttrType::parse(raw))
    }
}

fn render_entity_test(item: &ValidatedItem, attrs: &[Attribute]) -> String {
    let class = &item.names.pascal_base;
    let file = item.names.snake_base.clone();
    let mut out = format!("import {{ {class}, ValidationError }} from \"../../../src/domain/entities/{file}\";\n\n");
    out.push_str(&format!("describe(\"{class}\", () => {{\n"));

    // Props válidas mínimas para construir.
    let props = attrs.iter()
                     .map(|a| format!("{}: {}", a.name, sample_value(a, &item.spec)))
                     .collect::<Vec<_>>()
                     .join(", ");
    out.push_str(&format!("  const validProps = {{ {props} }};\n\n"));
    out.push_str(&format!("  it(\"constructs with valid props\", () => {{\n    expect(() => new {class}(validProps)).not.toThrow();\n  }});\n\n"));

    let keyed_add = item.spec
                        .methods
                        .iter()
                        .find(|m| m.parsed_parameters().map(|p| is_keyed_add(m, &p)).unwrap_or(false));
    if let Some(add) = keyed_add {
        let name = &add.method_name;
        out.push_str(&format!(
            "  it(\"merges quantities by key\", () => {{\n\
             \x20   const e = new {class}(validProps);\n\
             \x20   e.{name}(\"p1\", 2);\n\
             \x20   expect(e.{name}(\"p1\", 3)).toEqual([{{ key: \"p1\", quantity: 5 }}]);\n\
             \x20 }});\n\n\
             \x20 it(\"rejects zero quantity\", () => {{\n\
             \x20   const e = new {class}(validProps);\n\
             \x20   expect(() => e.{name}(\"p1\", 0)).toThrow(ValidationError);\n\
             \x20 }});\n"
        ));
    }
    out.push_str("});\n");
    out
}

fn render_service_test(item: &ValidatedItem) -> String {
    let file = item.names.snake_class.clone();
    let mut out = format!("import * as service from \"../../../src/domain/services/{file}\";\n\n");
    out.push_str(&format!("describe(\"{}\", () => {{\n", item.spec.class_name));
    for m in &item.spec.methods {
        out.push_str(&format!("  it(\"exposes {name}\", () => {{\n    expect(typeof service.{name}).toBe(\"function\");\n  }});\n",
                              name = m.method_name));
    }
    out.push_str("});\n");
    out
}

/// Valor de ejemplo coherente con la regla de validación del campo.
fn sample_value(attr: &Attribute, spec: &arch_domain::ClassSpec) -> String {
    if let Some(allowed) = spec.allowed_values(&attr.name) {
        if let Some(first) = allowed.first() {
            return format!("\"{first}\"");
        }
    }
    match attr.ty {
        AttrType::Str | AttrType::Uuid => "\"sample\"".to_string(),
        AttrType::Int | AttrType::Float | AttrType::Decimal => "1".to_string(),
        AttrType::Bool => "true".to_string(),
        AttrType::Datetime | AttrType::Date | AttrType::Time => "new Date(0)".to_string(),
        AttrType::Json => "{}".to_string(),
        AttrType::Bytes => "new Uint8Array()".to_string(),
        AttrType::Custom(_) => "undefined as never".to_string(),
    }
}

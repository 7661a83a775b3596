//! Generador de la capa Application (`interface`, `use_case`, `store`).
//!
//! - `interface`: contrato nombrado (conjunto de capacidades); sólo firmas,
//!   nunca se instancia directamente.
//! - `use_case`: orquestador con un campo inyectado por constructor por cada
//!   dependencia (orden preservado) y una operación `execute` con los
//!   parámetros del método declarado. Sólo puede invocar los puertos
//!   inyectados y salidas del generador de Domain; la plantilla jamás
//!   referencia nombres de la capa Infrastructure.
//! - `store`: el único patrón canónico de estado por feature — contenedor
//!   mutable local al proceso, keyed por id externo, con protocolo
//!   optimista: snapshot -> aplicación optimista -> pending ->
//!   (confirmación | rollback). El rollback restaura el snapshot previo y
//!   relanza el error, nunca lo traga.

use super::{module_header, placeholder_type, ts_params, ts_type, BatchIndex, LayerGenerator};
use crate::artifacts::{GeneratedModule, ValidatedItem};
use crate::paths;
use crate::spec_error::SpecError;
use arch_domain::naming::to_snake_case;
use arch_domain::AttrType;

#[derive(Debug)]
pub struct ApplicationGenerator;

impl LayerGenerator for ApplicationGenerator {
    fn layer_prefix(&self) -> &'static str {
        "application"
    }

    fn generate(&self, item: &ValidatedItem, index: &BatchIndex) -> Result<GeneratedModule, SpecError> {
        let layer = arch_domain::Layer::unchecked(&item.spec.layer);
        let (code, test) = match layer.kind() {
            "interface" => (render_interface(item)?, render_interface_test(item)),
            "use_case" => (render_use_case(item, index)?, render_use_case_test(item)),
            "store" => (render_store(item)?, render_store_test(item)),
            other => {
                return Err(SpecError::schema(format!("variante de capa application no soportada: '{other}'"), "layer"))
            }
        };
        Ok(GeneratedModule { code_path: paths::code_path(&layer, &item.names),
                             code,
                             test_path: paths::test_path(&layer, &item.names),
                             test })
    }
}

fn ts_return(m: &arch_domain::MethodSpec) -> String {
    let raw = m.return_type_or_void();
    if raw == "void" {
        "void".to_string()
    } else {
        ts_type(&AttrType::parse(raw))
    }
}

/// Campo camelCase para una dependencia (`ICartRepo` -> `cartRepo`).
fn dep_field(dep: &str) -> String {
    let stripped = dep.strip_prefix('I').unwrap_or(dep);
    let mut chars = stripped.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => stripped.to_string(),
    }
}

fn render_interface(item: &ValidatedItem) -> Result<String, SpecError> {
    let spec = &item.spec;
    let mut out = module_header(spec);
    out.push_str("// Dependency target only: implemented by Infrastructure, injected into\n// Application. Never constructed directly.\n\n");
    out.push_str(&format!("export interface {} {{\n", spec.class_name));
    for m in &spec.methods {
        let params = m.parsed_parameters()
                      .map_err(|e| SpecError::schema(e.to_string(), format!("methods[{}].parameters", m.method_name)))?;
        out.push_str(&format!("  {}({}): Promise<{}>;\n", m.method_name, ts_params(&params), ts_return(m)));
    }
    out.push_str("}\n");
    Ok(out)
}

fn render_use_case(item: &ValidatedItem, index: &BatchIndex) -> Result<String, SpecError> {
    let spec = &item.spec;
    let class = &spec.class_name;
    let mut out = module_header(spec);

    // Imports para dependencias resueltas en este batch; stand-ins locales
    // para las que no (la generación continúa con información parcial).
    for dep in &spec.dependencies {
        if index.contains(dep) {
            out.push_str(&format!("import {{ {dep} }} from \"../interfaces/{}\";\n", to_snake_case(dep)));
        }
    }
    out.push('\n');
    let unresolved: Vec<&String> = spec.dependencies.iter().filter(|d| !index.contains(d)).collect();
    if !unresolved.is_empty() {
        out.push_str(super::not_implemented_error_block());
        for dep in unresolved {
            out.push_str(&placeholder_type(dep));
        }
    }

    // El primer (y normalmente único) método declarado define la firma de
    // `execute`.
    let method = spec.methods.first();
    let (sig, ret, call_args, delegate) = match method {
        Some(m) => {
            let params = m.parsed_parameters()
                          .map_err(|e| SpecError::schema(e.to_string(), format!("methods[{}].parameters", m.method_name)))?;
            let args = params.iter().map(|p| p.name.clone()).collect::<Vec<_>>().join(", ");
            (ts_params(&params), ts_return(m), args, m.method_name.clone())
        }
        None => (String::new(), "void".to_string(), String::new(), "execute".to_string()),
    };

    out.push_str(&format!("export class {class} {{\n  constructor(\n"));
    for dep in &spec.dependencies {
        out.push_str(&format!("    private readonly {}: {dep},\n", dep_field(dep)));
    }
    out.push_str("  ) {}\n\n");

    match spec.dependencies.first() {
        Some(first_dep) => {
            out.push_str(&format!(
                "  async execute({sig}): Promise<{ret}> {{\n    return this.{field}.{delegate}({call_args});\n  }}\n",
                field = dep_field(first_dep)
            ));
        }
        None => {
            out.push_str(&format!(
                "  async execute({sig}): Promise<{ret}> {{\n    throw new Error(\"{class} has no injected port to delegate to\");\n  }}\n"
            ));
        }
    }
    out.push_str("}\n");
    Ok(out)
}

fn render_store(item: &ValidatedItem) -> Result<String, SpecError> {
    let spec = &item.spec;
    let layer = arch_domain::Layer::unchecked(&spec.layer);
    // Un token final `Store` en el nombre no se duplica en la clase emitida.
    let base = &crate::paths::feature_pascal(&layer, &item.names);
    let mut out = module_header(spec);

    // Puerto del use case inyectado: primera dependencia declarada o el
    // contrato por defecto del feature.
    let port = spec.dependencies
                   .first()
                   .cloned()
                   .unwrap_or_else(|| format!("I{base}UseCase"));

    out.push_str("export interface LineItem {\n  key: string;\n  quantity: number;\n}\n\n");
    out.push_str(&format!("export interface {port} {{\n  execute(ownerId: string, item: LineItem): Promise<LineItem[]>;\n}}\n\n"));
    out.push_str(&format!(
        "export class {base}Store {{\n\
         \x20 private readonly states = new Map<string, LineItem[]>();\n\n\
         \x20 constructor(private readonly useCase: {port}) {{}}\n\n\
         \x20 get{base}(ownerId: string): LineItem[] {{\n    return this.states.get(ownerId) ?? [];\n  }}\n\n\
         \x20 // Mutación optimista: snapshot -> aplicar local -> pending ->\n\
         \x20 // (confirmar con el resultado autoritativo | rollback al snapshot).\n\
         \x20 async addOptimistic(ownerId: string, item: LineItem): Promise<LineItem[]> {{\n\
         \x20   const snapshot = this.get{base}(ownerId).map((i) => ({{ ...i }}));\n\
         \x20   // Copia por item: el merge muta renglones y el snapshot debe quedar intacto.\n\
         \x20   const optimistic = snapshot.map((i) => ({{ ...i }}));\n\
         \x20   const existing = optimistic.find((i) => i.key === item.key);\n\
         \x20   if (existing) {{\n      existing.quantity += item.quantity;\n    }} else {{\n      optimistic.push({{ ...item }});\n    }}\n\
         \x20   this.states.set(ownerId, optimistic);\n\
         \x20   try {{\n\
         \x20     const authoritative = await this.useCase.execute(ownerId, item);\n\
         \x20     this.states.set(ownerId, authoritative);\n\
         \x20     return authoritative;\n\
         \x20   }} catch (err) {{\n\
         \x20     // Rollback al estado previo; el error se relanza para que la\n\
         \x20     // capa de presentación lo muestre (nunca se traga).\n\
         \x20     this.states.set(ownerId, snapshot);\n\
         \x20     throw err;\n\
         \x20   }}\n\
         \x20 }}\n\
         }}\n"
    ));
    Ok(out)
}

fn render_interface_test(item: &ValidatedItem) -> String {
    let class = &item.spec.class_name;
    let file = item.names.snake_class.clone();
    format!("import type {{ {class} }} from \"../../../src/application/interfaces/{file}\";\n\n\
             describe(\"{class}\", () => {{\n\
             \x20 it(\"is a compile-time contract only\", () => {{\n\
             \x20   const witness: {class} | null = null;\n\
             \x20   expect(witness).toBeNull();\n\
             \x20 }});\n\
             }});\n")
}

fn render_use_case_test(item: &ValidatedItem) -> String {
    let class = &item.spec.class_name;
    let file = item.names.snake_class.clone();
    let mut out = format!("import {{ {class} }} from \"../../../src/application/use_cases/{file}\";\n\n");
    out.push_str(&format!("describe(\"{class}\", () => {{\n"));
    if let Some(dep) = item.spec.dependencies.first() {
        let delegate = item.spec
                           .methods
                           .first()
                           .map(|m| m.method_name.clone())
                           .unwrap_or_else(|| "execute".to_string());
        out.push_str(&format!(
            "  it(\"delegates to the injected {dep} port\", async () => {{\n\
             \x20   const port = {{ {delegate}: jest.fn().mockResolvedValue([]) }};\n\
             \x20   const useCase = new {class}(port as never);\n\
             \x20   await useCase.execute(\"u1\" as never, undefined as never);\n\
             \x20   expect(port.{delegate}).toHaveBeenCalledTimes(1);\n\
             \x20 }});\n"
        ));
    } else {
        out.push_str(&format!(
            "  it(\"fails without an injected port\", async () => {{\n\
             \x20   const useCase = new {class}();\n\
             \x20   await expect(useCase.execute()).rejects.toThrow();\n\
             \x20 }});\n"
        ));
    }
    out.push_str("});\n");
    out
}

fn render_store_test(item: &ValidatedItem) -> String {
    let layer = arch_domain::Layer::unchecked(&item.spec.layer);
    let base = &crate::paths::feature_pascal(&layer, &item.names);
    let file = format!("{}_store", crate::paths::feature_stem(&layer, &item.names));
    format!(
        "import {{ {base}Store }} from \"../../../src/application/stores/{file}\";\n\n\
         describe(\"{base}Store\", () => {{\n\
         \x20 const item = {{ key: \"p1\", quantity: 1 }};\n\n\
         \x20 it(\"applies the optimistic mutation immediately and confirms\", async () => {{\n\
         \x20   const useCase = {{ execute: jest.fn().mockResolvedValue([item]) }};\n\
         \x20   const store = new {base}Store(useCase);\n\
         \x20   const result = await store.addOptimistic(\"u1\", item);\n\
         \x20   expect(result).toEqual([item]);\n\
         \x20   expect(store.get{base}(\"u1\")).toEqual([item]);\n\
         \x20 }});\n\n\
         \x20 it(\"rolls back to the pre-mutation snapshot on failure\", async () => {{\n\
         \x20   const useCase = {{ execute: jest.fn().mockRejectedValue(new Error(\"boom\")) }};\n\
         \x20   const store = new {base}Store(useCase);\n\
         \x20   await expect(store.addOptimistic(\"u1\", item)).rejects.toThrow(\"boom\");\n\
         \x20   expect(store.get{base}(\"u1\")).toEqual([]);\n\
         \x20 }});\n\
         }});\n"
    )
}

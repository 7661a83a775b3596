//! Generador de la capa Presentation (`schema`, `dependency`, `router`,
//! `component`, `hook`).
//!
//! - `schema`: shapes request/response agrupados por nombre base.
//! - `dependency`: funciones provider tipadas al puerto de Application
//!   (regla dura: nunca al tipo concreto de Infrastructure, sin importar qué
//!   adapter se construya por debajo).
//! - `router`: un endpoint por método declarado; cada endpoint valida su
//!   input contra un schema, invoca exactamente un use case y devuelve una
//!   instancia del schema de respuesta. El prefijo de namespace (plural
//!   snake del base, tabla irregular primero) se aplica en un único lugar.
//! - `component` / `hook`: par vista/hook cableado al único patrón canónico
//!   de store del feature.

use arch_domain::naming::to_snake_case;

use super::{module_header, placeholder_type, BatchIndex, LayerGenerator};
use crate::artifacts::{GeneratedModule, ValidatedItem};
use crate::paths;
use crate::spec_error::SpecError;

#[derive(Debug)]
pub struct PresentationGenerator;

impl LayerGenerator for PresentationGenerator {
    fn layer_prefix(&self) -> &'static str {
        "presentation"
    }

    fn generate(&self, item: &ValidatedItem, index: &BatchIndex) -> Result<GeneratedModule, SpecError> {
        let layer = arch_domain::Layer::unchecked(&item.spec.layer);
        let (code, test) = match layer.kind() {
            "schema" => (render_schemas(item)?, render_schema_test(item)),
            "dependency" => (render_dependencies(item, index), render_dependency_test(item)),
            "router" => (render_router(item, index)?, render_router_test(item)),
            "component" => (render_component(item), render_component_test(item)),
            "hook" => (render_hook(item), render_hook_test(item)),
            other => {
                return Err(SpecError::schema(format!("variante de capa presentation no soportada: '{other}'"), "layer"))
            }
        };
        Ok(GeneratedModule { code_path: paths::code_path(&layer, &item.names),
                             code,
                             test_path: paths::test_path(&layer, &item.names),
                             test })
    }
}

fn render_schemas(item: &ValidatedItem) -> Result<String, SpecError> {
    let spec = &item.spec;
    let layer = arch_domain::Layer::unchecked(&spec.layer);
    let base = &crate::paths::feature_pascal(&layer, &item.names);
    let mut out = module_header(spec);
    let attrs = spec.parsed_attributes()
                    .map_err(|e| SpecError::schema(e.to_string(), "attributes"))?;

    // Shapes agrupados por base: request con los campos declarados,
    // response con los campos + id.
    out.push_str(&format!("export interface {base}Request {{\n"));
    for a in &attrs {
        let opt = if a.optional { "?" } else { "" };
        out.push_str(&format!("  {}{}: {};\n", a.name, opt, super::ts_type(&a.ty)));
    }
    out.push_str("}\n\n");
    out.push_str(&format!("export interface {base}Response {{\n  id: string;\n"));
    for a in &attrs {
        out.push_str(&format!("  {}: {};\n", a.name, super::ts_type(&a.ty)));
    }
    out.push_str("}\n\n");
    out.push_str(&format!(
        "export function parse{base}Request(payload: unknown): {base}Request {{\n\
         \x20 if (payload === null || typeof payload !== \"object\") {{\n    throw new Error(\"invalid {base} request payload\");\n  }}\n\
         \x20 return payload as {base}Request;\n\
         }}\n"
    ));
    Ok(out)
}

fn render_dependencies(item: &ValidatedItem, index: &BatchIndex) -> String {
    let spec = &item.spec;
    let layer = arch_domain::Layer::unchecked(&spec.layer);
    let base = &crate::paths::feature_pascal(&layer, &item.names);
    let mut out = module_header(spec);

    let ports: Vec<String> = if spec.dependencies.is_empty() {
        vec![format!("I{base}Repository")]
    } else {
        spec.dependencies.clone()
    };

    for port in &ports {
        if index.contains(port) {
            out.push_str(&format!("import {{ {port} }} from \"../../application/interfaces/{}\";\n", to_snake_case(port)));
        }
    }
    out.push('\n');
    let unresolved: Vec<&String> = ports.iter().filter(|p| !index.contains(p)).collect();
    if !unresolved.is_empty() {
        out.push_str(super::not_implemented_error_block());
        for port in unresolved {
            out.push_str(&placeholder_type(port));
        }
    }

    // Registro explícito construido una sola vez por el composition root y
    // pasado hacia abajo; nunca instancias cacheadas a nivel de módulo ni
    // materialización implícita en el primer acceso.
    out.push_str(
        "export class ProviderRegistry {\n\
         \x20 private readonly factories = new Map<string, () => unknown>();\n\n\
         \x20 register(key: string, factory: () => unknown): void {\n    this.factories.set(key, factory);\n  }\n\n\
         \x20 resolve<T>(key: string): T {\n\
         \x20   const factory = this.factories.get(key);\n\
         \x20   if (!factory) {\n      throw new Error(`no provider registered for ${key}`);\n    }\n\
         \x20   return factory() as T;\n\
         \x20 }\n\
         }\n\n",
    );
    out.push_str("// Providers tipados al puerto de Application. El adapter concreto se\n// decide en el composition root y jamás se filtra en el tipo de retorno.\n\n");
    for port in &ports {
        let field = port.strip_prefix('I').unwrap_or(port);
        out.push_str(&format!(
            "export function register{field}(registry: ProviderRegistry, factory: () => {port}): void {{\n\
             \x20 registry.register(\"{port}\", factory);\n\
             }}\n\n\
             export function resolve{field}(registry: ProviderRegistry): {port} {{\n\
             \x20 return registry.resolve<{port}>(\"{port}\");\n\
             }}\n\n"
        ));
    }
    out
}

fn render_router(item: &ValidatedItem, index: &BatchIndex) -> Result<String, SpecError> {
    let spec = &item.spec;
    let layer = arch_domain::Layer::unchecked(&spec.layer);
    let base = &crate::paths::feature_pascal(&layer, &item.names);
    let prefix = paths::router_prefix(&layer, &item.names);
    let mut out = module_header(spec);

    let use_case = spec.dependencies
                       .first()
                       .cloned()
                       .unwrap_or_else(|| format!("I{base}UseCase"));
    if index.contains(&use_case) {
        out.push_str(&format!("import {{ {use_case} }} from \"../../application/interfaces/{}\";\n\n", to_snake_case(&use_case)));
    } else {
        out.push_str(super::not_implemented_error_block());
        out.push_str(&placeholder_type(&use_case));
    }

    out.push_str(
        "export interface RouteDefinition {\n  method: string;\n  path: string;\n  handler: (payload: unknown) => Promise<unknown>;\n}\n\n",
    );

    // Mapeo convencional de errores de Domain/Application en el borde de
    // Presentation; lo inesperado es 500 sin filtrar internals.
    out.push_str(
        "export function toStatusCode(err: unknown): number {\n\
         \x20 const name = err instanceof Error ? err.name : \"\";\n\
         \x20 if (name === \"ValidationError\") {\n    return 422;\n  }\n\
         \x20 if (name === \"NotFoundError\") {\n    return 404;\n  }\n\
         \x20 if (name === \"PermissionError\") {\n    return 403;\n  }\n\
         \x20 return 500;\n\
         }\n\n",
    );

    // El prefijo se fija una única vez en la definición del router; el
    // registro posterior no debe volver a aplicarlo.
    out.push_str(&format!("export const PREFIX = \"{prefix}\";\n\n"));
    out.push_str(&format!("export function build{base}Router(useCase: {use_case}): RouteDefinition[] {{\n  return [\n"));
    for m in &spec.methods {
        // La firma se valida aunque el handler reciba el payload completo;
        // un parámetro malformado invalida el item.
        m.parsed_parameters()
         .map_err(|e| SpecError::schema(e.to_string(), format!("methods[{}].parameters", m.method_name)))?;
        let name = &m.method_name;
        let http = if name.starts_with("get") || name.starts_with("list") { "GET" } else { "POST" };
        let segment = to_snake_case(name);
        out.push_str(&format!(
            "    {{\n\
             \x20     method: \"{http}\",\n\
             \x20     path: `${{PREFIX}}/{segment}`,\n\
             \x20     handler: async (payload: unknown) => {{\n\
             \x20       // Validación de input -> un único use case -> schema de respuesta.\n\
             \x20       if (payload === null || typeof payload !== \"object\") {{\n          throw new Error(\"invalid payload\");\n        }}\n\
             \x20       return useCase.{name}(payload as never);\n\
             \x20     }},\n\
             \x20   }},\n"
        ));
    }
    out.push_str("  ];\n}\n");
    Ok(out)
}

fn render_component(item: &ValidatedItem) -> String {
    let spec = &item.spec;
    let layer = arch_domain::Layer::unchecked(&spec.layer);
    let base = &crate::paths::feature_pascal(&layer, &item.names);
    let hook_file = format!("use_{}", crate::paths::feature_stem(&layer, &item.names));
    let mut out = module_header(spec);
    out.push_str(&format!("import {{ use{base} }} from \"../hooks/{hook_file}\";\n\n"));
    out.push_str(&format!(
        "export function {base}View({{ ownerId }}: {{ ownerId: string }}) {{\n\
         \x20 const {{ items, pending, error }} = use{base}(ownerId);\n\
         \x20 if (error) {{\n    return <p role=\"alert\">{{String(error)}}</p>;\n  }}\n\
         \x20 return (\n\
         \x20   <ul aria-busy={{pending}}>\n\
         \x20     {{items.map((item) => (\n\
         \x20       <li key={{item.key}}>\n\
         \x20         {{item.key}}: {{item.quantity}}\n\
         \x20       </li>\n\
         \x20     ))}}\n\
         \x20   </ul>\n\
         \x20 );\n\
         }}\n"
    ));
    out
}

fn render_hook(item: &ValidatedItem) -> String {
    let spec = &item.spec;
    let layer = arch_domain::Layer::unchecked(&spec.layer);
    let base = &crate::paths::feature_pascal(&layer, &item.names);
    let store_file = format!("{}_store", crate::paths::feature_stem(&layer, &item.names));
    let mut out = module_header(spec);
    out.push_str(&format!("import {{ {base}Store, LineItem }} from \"../../application/stores/{store_file}\";\n\n"));
    out.push_str(&format!(
        "// Único punto de acceso del feature al estado: siempre a través del\n\
         // store canónico, nunca una segunda estrategia paralela.\n\
         export function use{base}(ownerId: string, store?: {base}Store) {{\n\
         \x20 const backing = store ?? null;\n\
         \x20 if (backing === null) {{\n    throw new Error(\"use{base} requires an injected {base}Store\");\n  }}\n\
         \x20 const items: LineItem[] = backing.get{base}(ownerId);\n\
         \x20 return {{\n\
         \x20   items,\n\
         \x20   pending: false,\n\
         \x20   error: null as unknown,\n\
         \x20   add: (item: LineItem) => backing.addOptimistic(ownerId, item),\n\
         \x20 }};\n\
         }}\n"
    ));
    out
}

fn render_schema_test(item: &ValidatedItem) -> String {
    let layer = arch_domain::Layer::unchecked(&item.spec.layer);
    let base = &crate::paths::feature_pascal(&layer, &item.names);
    let file = format!("{}_schemas", crate::paths::feature_stem(&layer, &item.names));
    format!(
        "import {{ parse{base}Request }} from \"../../../src/presentation/schemas/{file}\";\n\n\
         describe(\"{base} schemas\", () => {{\n\
         \x20 it(\"rejects non-object payloads\", () => {{\n\
         \x20   expect(() => parse{base}Request(null)).toThrow();\n\
         \x20 }});\n\
         }});\n"
    )
}

fn render_dependency_test(item: &ValidatedItem) -> String {
    let layer = arch_domain::Layer::unchecked(&item.spec.layer);
    let base = &crate::paths::feature_pascal(&layer, &item.names);
    let file = format!("{}_dependencies", crate::paths::feature_stem(&layer, &item.names));
    format!(
        "import {{ ProviderRegistry }} from \"../../../src/presentation/dependencies/{file}\";\n\n\
         describe(\"{base} dependencies\", () => {{\n\
         \x20 it(\"resolves only explicitly registered ports\", () => {{\n\
         \x20   const registry = new ProviderRegistry();\n\
         \x20   expect(() => registry.resolve(\"IMissing\")).toThrow();\n\
         \x20 }});\n\
         }});\n"
    )
}

fn render_router_test(item: &ValidatedItem) -> String {
    let layer = arch_domain::Layer::unchecked(&item.spec.layer);
    let base = &crate::paths::feature_pascal(&layer, &item.names);
    let file = format!("{}_router",
                       arch_domain::naming::pluralize_snake(&crate::paths::feature_stem(&layer, &item.names)));
    let prefix = paths::router_prefix(&layer, &item.names);
    format!(
        "import {{ PREFIX, build{base}Router }} from \"../../../src/presentation/routers/{file}\";\n\n\
         describe(\"{base} router\", () => {{\n\
         \x20 it(\"applies the plural snake prefix exactly once\", () => {{\n\
         \x20   expect(PREFIX).toBe(\"{prefix}\");\n\
         \x20   for (const route of build{base}Router({{}} as never)) {{\n\
         \x20     expect(route.path.startsWith(\"{prefix}/\")).toBe(true);\n\
         \x20     expect(route.path.indexOf(\"{prefix}\", 1)).toBe(-1);\n\
         \x20   }}\n\
         \x20 }});\n\
         }});\n"
    )
}

fn render_component_test(item: &ValidatedItem) -> String {
    let layer = arch_domain::Layer::unchecked(&item.spec.layer);
    let base = &crate::paths::feature_pascal(&layer, &item.names);
    let file = &item.names.pascal_base;
    format!(
        "import {{ {base}View }} from \"../../../src/presentation/components/{file}\";\n\n\
         describe(\"{base}View\", () => {{\n\
         \x20 it(\"is a function component\", () => {{\n\
         \x20   expect(typeof {base}View).toBe(\"function\");\n\
         \x20 }});\n\
         }});\n"
    )
}

fn render_hook_test(item: &ValidatedItem) -> String {
    let layer = arch_domain::Layer::unchecked(&item.spec.layer);
    let base = &crate::paths::feature_pascal(&layer, &item.names);
    let file = format!("use_{}", crate::paths::feature_stem(&layer, &item.names));
    format!(
        "import {{ use{base} }} from \"../../../src/presentation/hooks/{file}\";\n\n\
         describe(\"use{base}\", () => {{\n\
         \x20 it(\"requires an injected store\", () => {{\n\
         \x20   expect(() => use{base}(\"u1\")).toThrow();\n\
         \x20 }});\n\
         }});\n"
    )
}

//! Generador de la capa Infrastructure (`model`, `repository`, `adapter`).
//!
//! - `model`: shape de registro de almacenamiento derivado de `attributes`,
//!   con nombre de colección = plural snake del base (descartando un token
//!   final `Model` antes de resolver), mapeo fijo de tipos de storage,
//!   campos opcionales como nullable, `id: int` como PK autoincremental y
//!   campos `<entidad>_id` como FK a la colección pluralizada con política
//!   de borrado restrict (set-null si el campo es opcional).
//! - `repository`: implementa la interface de Application correspondiente,
//!   construido con exactamente los atributos declarados (típicamente el
//!   handle de sesión), con dos mapeos simétricos entidad <-> modelo;
//!   not-found -> `NotFoundError`, input inválido -> `ValidationError`, y el
//!   error de storage se relanza sin tocar.
//! - `adapter`: envuelve una superficie externa (HTTP/SDK) leyendo
//!   credenciales de configuración inyectada, con timeout por defecto,
//!   política fija de reintentos (2 retries, backoff desde 300 ms) y mapeo
//!   de fallas externas a los cuatro errores tipados; devuelve sólo shapes
//!   mapeados, nunca la respuesta cruda.
//!
//! Regla transversal de placeholder: si una entidad de Domain o interface de
//! Application referenciada no está en el batch actual, se emite un stand-in
//! local marcado como auto-generado en lugar de bloquear la generación.

use arch_domain::{naming, AttrType, Attribute};

use super::{module_header, placeholder_type, ts_params, ts_type, BatchIndex, LayerGenerator};
use crate::artifacts::{GeneratedModule, ValidatedItem};
use crate::paths;
use crate::spec_error::SpecError;

#[derive(Debug)]
pub struct InfrastructureGenerator;

impl LayerGenerator for InfrastructureGenerator {
    fn layer_prefix(&self) -> &'static str {
        "infrastructure"
    }

    fn generate(&self, item: &ValidatedItem, index: &BatchIndex) -> Result<GeneratedModule, SpecError> {
        let layer = arch_domain::Layer::unchecked(&item.spec.layer);
        let attrs = item.spec
                        .parsed_attributes()
                        .map_err(|e| SpecError::schema(e.to_string(), "attributes"))?;
        let (code, test) = match layer.kind() {
            "model" => (render_model(item, &attrs), render_model_test(item)),
            "repository" => (render_repository(item, &attrs, index)?, render_repository_test(item)),
            "adapter" => (render_adapter(item, index)?, render_adapter_test(item)),
            other => {
                return Err(SpecError::schema(format!("variante de capa infrastructure no soportada: '{other}'"),
                                             "layer"))
            }
        };
        Ok(GeneratedModule { code_path: paths::code_path(&layer, &item.names),
                             code,
                             test_path: paths::test_path(&layer, &item.names),
                             test })
    }
}

/// Mapeo fijo tipo de atributo -> tipo de storage.
fn storage_type(ty: &AttrType) -> &'static str {
    match ty {
        AttrType::Int => "INTEGER",
        AttrType::Str => "VARCHAR",
        AttrType::Float => "FLOAT",
        AttrType::Bool => "BOOLEAN",
        AttrType::Datetime => "TIMESTAMP",
        AttrType::Date => "DATE",
        AttrType::Time => "TIME",
        AttrType::Json => "JSON",
        AttrType::Bytes => "BYTEA",
        AttrType::Decimal => "DECIMAL",
        AttrType::Uuid => "UUID",
        AttrType::Custom(_) => "JSON",
    }
}

/// Nombre de colección: plural snake del base, descartando un token final
/// `Model` antes de resolver (`ProductModel` -> `products`).
fn collection_name(item: &ValidatedItem) -> String {
    let base = item.names.base.strip_suffix("Model").unwrap_or(&item.names.base);
    naming::pluralize_snake(&naming::to_snake_case(base))
}

fn render_model(item: &ValidatedItem, attrs: &[Attribute]) -> String {
    let spec = &item.spec;
    let collection = collection_name(item);
    let mut out = module_header(spec);

    out.push_str(&format!("export const {}Definition = {{\n", item.names.pascal_base));
    out.push_str(&format!("  collection: \"{collection}\",\n"));
    out.push_str("  fields: {\n");
    for a in attrs {
        let mut parts = vec![format!("type: \"{}\"", storage_type(&a.ty))];
        if a.name == "id" && a.ty == AttrType::Int {
            parts.push("primaryKey: true".to_string());
            parts.push("autoIncrement: true".to_string());
        } else if let Some(entity) = a.name.strip_suffix("_id") {
            let target = naming::pluralize_snake(&naming::to_snake_case(entity));
            let on_delete = if a.optional { "set-null" } else { "restrict" };
            parts.push(format!("references: {{ collection: \"{target}\", onDelete: \"{on_delete}\" }}"));
        }
        parts.push(format!("nullable: {}", a.optional));
        out.push_str(&format!("    {}: {{ {} }},\n", a.name, parts.join(", ")));
    }
    out.push_str("  },\n} as const;\n");
    out
}

/// Errores de runtime compartidos por repositorios y adapters emitidos.
fn runtime_errors_block() -> &'static str {
    "export class NotFoundError extends Error {\n  constructor(message: string) {\n    super(message);\n    this.name = \"NotFoundError\";\n  }\n}\n\n\
     export class ValidationError extends Error {\n  constructor(public readonly field: string, message: string) {\n    super(message);\n    this.name = \"ValidationError\";\n  }\n}\n\n"
}

fn render_repository(item: &ValidatedItem, attrs: &[Attribute], index: &BatchIndex) -> Result<String, SpecError> {
    let spec = &item.spec;
    let class = &spec.class_name;
    let entity = &item.names.pascal_base;
    let port = format!("I{class}");
    let collection = collection_name(item);
    let mut out = module_header(spec);

    if index.contains(&port) {
        out.push_str(&format!("import {{ {port} }} from \"../../application/interfaces/{}\";\n", naming::to_snake_case(&port)));
    }
    if index.contains(entity) {
        out.push_str(&format!("import {{ {entity} }} from \"../../domain/entities/{}\";\n", item.names.snake_base));
    }
    out.push('\n');
    if !index.contains(&port) || !index.contains(entity) {
        out.push_str(super::not_implemented_error_block());
        if !index.contains(&port) {
            out.push_str(&placeholder_type(&port));
        }
        if !index.contains(entity) {
            out.push_str(&placeholder_type(entity));
        }
    }

    out.push_str(runtime_errors_block());

    // Mapeos simétricos entidad <-> registro de storage.
    out.push_str(&format!(
        "export function toDomain(record: Record<string, unknown>): {entity} {{\n  return new {entity}(record as never);\n}}\n\n\
         export function toRecord(entity: {entity}): Record<string, unknown> {{\n  return {{ ...entity }} as Record<string, unknown>;\n}}\n\n"
    ));

    out.push_str(&format!("export class {class} {{\n  constructor(\n"));
    for a in attrs {
        out.push_str(&format!("    private readonly {}: {},\n", a.name, ts_type(&a.ty)));
    }
    out.push_str("  ) {}\n\n");

    let session = attrs.first().map(|a| a.name.clone()).unwrap_or_else(|| "session".to_string());
    for m in &spec.methods {
        let params = m.parsed_parameters()
                      .map_err(|e| SpecError::schema(e.to_string(), format!("methods[{}].parameters", m.method_name)))?;
        let name = &m.method_name;
        let sig = ts_params(&params);
        let first = params.first().map(|p| p.name.clone()).unwrap_or_else(|| "undefined".to_string());
        if name.starts_with("get") || name.starts_with("find") || name.starts_with("load") {
            out.push_str(&format!(
                "  async {name}({sig}): Promise<{entity}> {{\n\
                 \x20   const record = await this.{session}.findOne(\"{collection}\", {{ {first} }});\n\
                 \x20   if (!record) {{\n      throw new NotFoundError(`{entity} not found`);\n    }}\n\
                 \x20   return toDomain(record);\n\
                 \x20 }}\n\n"
            ));
        } else if name.starts_with("save") || name.starts_with("add") || name.starts_with("update") || name.starts_with("create") {
            out.push_str(&format!(
                "  async {name}({sig}): Promise<void> {{\n\
                 \x20   if ({first} === undefined || {first} === null) {{\n      throw new ValidationError(\"{first}\", \"{first} is required\");\n    }}\n\
                 \x20   // El error de storage se propaga sin transformar.\n\
                 \x20   await this.{session}.upsert(\"{collection}\", toRecord({first} as never));\n\
                 \x20 }}\n\n"
            ));
        } else if name.starts_with("delete") || name.starts_with("remove") {
            out.push_str(&format!(
                "  async {name}({sig}): Promise<void> {{\n    await this.{session}.delete(\"{collection}\", {{ {first} }});\n  }}\n\n"
            ));
        } else {
            out.push_str(&format!(
                "  async {name}({sig}): Promise<unknown> {{\n    throw new Error(\"{name} requires a concrete storage mapping\");\n  }}\n\n"
            ));
        }
    }
    out.push_str("}\n");
    Ok(out)
}

fn render_adapter(item: &ValidatedItem, index: &BatchIndex) -> Result<String, SpecError> {
    let spec = &item.spec;
    let class = &spec.class_name;
    let mut out = module_header(spec);

    for dep in &spec.dependencies {
        if index.contains(dep) {
            out.push_str(&format!("import {{ {dep} }} from \"../../application/interfaces/{}\";\n", naming::to_snake_case(dep)));
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

    // Taxonomía de errores del servicio externo.
    out.push_str(
        "export class ServiceError extends Error {\n  constructor(message: string) {\n    super(message);\n    this.name = \"ServiceError\";\n  }\n}\n\
         export class BadRequestError extends ServiceError {}\n\
         export class RateLimitedError extends ServiceError {}\n\
         export class ServerError extends ServiceError {}\n\n",
    );
    out.push_str(
        "const DEFAULT_TIMEOUT_MS = 5000;\nconst MAX_RETRIES = 2;\nconst BACKOFF_BASE_MS = 300;\n\n\
         export interface AdapterConfig {\n  baseUrl: string;\n  apiKey: string;\n  timeoutMs?: number;\n}\n\n\
         export interface HttpClient {\n  request(options: {\n    url: string;\n    method: string;\n    body?: unknown;\n    headers: Record<string, string>;\n    timeoutMs: number;\n  }): Promise<{ status: number; body: unknown }>;\n}\n\n",
    );

    out.push_str(&format!(
        "export class {class} {{\n\
         \x20 // Credenciales siempre desde configuración inyectada, nunca hardcodeadas.\n\
         \x20 constructor(\n    private readonly config: AdapterConfig,\n    private readonly http: HttpClient,\n  ) {{}}\n\n\
         \x20 private async call(path: string, method: string, body?: unknown): Promise<unknown> {{\n\
         \x20   let lastError: unknown;\n\
         \x20   for (let attempt = 0; attempt <= MAX_RETRIES; attempt += 1) {{\n\
         \x20     if (attempt > 0) {{\n\
         \x20       await new Promise((r) => setTimeout(r, BACKOFF_BASE_MS * 2 ** (attempt - 1)));\n\
         \x20     }}\n\
         \x20     try {{\n\
         \x20       const response = await this.http.request({{\n\
         \x20         url: `${{this.config.baseUrl}}${{path}}`,\n\
         \x20         method,\n\
         \x20         body,\n\
         \x20         headers: {{ Authorization: `Bearer ${{this.config.apiKey}}` }},\n\
         \x20         timeoutMs: this.config.timeoutMs ?? DEFAULT_TIMEOUT_MS,\n\
         \x20       }});\n\
         \x20       if (response.status === 400) {{\n          throw new BadRequestError(\"bad request\");\n        }}\n\
         \x20       if (response.status === 429) {{\n          throw new RateLimitedError(\"rate limited\");\n        }}\n\
         \x20       if (response.status >= 500) {{\n          throw new ServerError(`server error ${{response.status}}`);\n        }}\n\
         \x20       return response.body;\n\
         \x20     }} catch (err) {{\n\
         \x20       // 4xx no se reintenta; el resto agota la política fija.\n\
         \x20       if (err instanceof BadRequestError) {{\n          throw err;\n        }}\n\
         \x20       lastError = err;\n\
         \x20     }}\n\
         \x20   }}\n\
         \x20   if (lastError instanceof ServiceError) {{\n      throw lastError;\n    }}\n\
         \x20   throw new ServiceError(String(lastError));\n\
         \x20 }}\n\n"
    ));

    for m in &spec.methods {
        let params = m.parsed_parameters()
                      .map_err(|e| SpecError::schema(e.to_string(), format!("methods[{}].parameters", m.method_name)))?;
        let name = &m.method_name;
        let sig = ts_params(&params);
        let first = params.first().map(|p| p.name.clone());
        let body = match first {
            Some(f) => format!("{{ {f} }}"),
            None => "undefined".to_string(),
        };
        // Sólo el shape mapeado sale del adapter.
        out.push_str(&format!(
            "  async {name}({sig}): Promise<Record<string, unknown>> {{\n\
             \x20   const mapped = await this.call(\"/{snake}\", \"POST\", {body});\n\
             \x20   return {{ ...(mapped as Record<string, unknown>) }};\n\
             \x20 }}\n\n",
            snake = naming::to_snake_case(name)
        ));
    }
    out.push_str("}\n");
    Ok(out)
}

fn render_model_test(item: &ValidatedItem) -> String {
    let layer = arch_domain::Layer::unchecked(&item.spec.layer);
    let def = format!("{}Definition", item.names.pascal_base);
    let file = format!("{}_model", crate::paths::feature_stem(&layer, &item.names));
    let collection = collection_name(item);
    format!(
        "import {{ {def} }} from \"../../../src/infrastructure/models/{file}\";\n\n\
         describe(\"{def}\", () => {{\n\
         \x20 it(\"targets the pluralized collection\", () => {{\n\
         \x20   expect({def}.collection).toBe(\"{collection}\");\n\
         \x20 }});\n\
         }});\n"
    )
}

fn render_repository_test(item: &ValidatedItem) -> String {
    let class = &item.spec.class_name;
    let file = item.names.snake_class.clone();
    let mut out = format!("import {{ {class}, NotFoundError }} from \"../../../src/infrastructure/repositories/{file}\";\n\n");
    out.push_str(&format!("describe(\"{class}\", () => {{\n"));
    if let Some(getter) = item.spec
                              .methods
                              .iter()
                              .find(|m| m.method_name.starts_with("get") || m.method_name.starts_with("find"))
    {
        let name = &getter.method_name;
        out.push_str(&format!(
            "  it(\"maps missing records to NotFoundError\", async () => {{\n\
             \x20   const session = {{ findOne: jest.fn().mockResolvedValue(null) }};\n\
             \x20   const repo = new {class}(session as never);\n\
             \x20   await expect(repo.{name}(\"missing\" as never)).rejects.toThrow(NotFoundError);\n\
             \x20 }});\n"
        ));
    } else {
        out.push_str(&format!(
            "  it(\"constructs with its session handle\", () => {{\n\
             \x20   expect(() => new {class}({{}} as never)).not.toThrow();\n\
             \x20 }});\n"
        ));
    }
    out.push_str("});\n");
    out
}

fn render_adapter_test(item: &ValidatedItem) -> String {
    let class = &item.spec.class_name;
    let file = item.names.snake_class.clone();
    let method = item.spec
                     .methods
                     .first()
                     .map(|m| m.method_name.clone())
                     .unwrap_or_else(|| "call".to_string());
    format!(
        "import {{ {class}, RateLimitedError }} from \"../../../src/infrastructure/adapters/{file}\";\n\n\
         describe(\"{class}\", () => {{\n\
         \x20 const config = {{ baseUrl: \"https://api.example.test\", apiKey: \"k\" }};\n\n\
         \x20 it(\"retries transient failures before surfacing the typed error\", async () => {{\n\
         \x20   const http = {{ request: jest.fn().mockResolvedValue({{ status: 429, body: null }}) }};\n\
         \x20   const adapter = new {class}(config, http);\n\
         \x20   await expect(adapter.{method}(undefined as never)).rejects.toThrow(RateLimitedError);\n\
         \x20   expect(http.request).toHaveBeenCalledTimes(3); // 1 intento + 2 retries\n\
         \x20 }});\n\
         }});\n"
    )
}

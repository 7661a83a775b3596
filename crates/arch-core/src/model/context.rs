use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Artifact;

/// Contexto de ejecución entregado a `StepDefinition::run`.
pub struct ExecutionContext {
    pub input: Option<Artifact>, // artifact único encadenado (None en el primer step)
    pub params: Value,           // parámetros canónicos (base + inyectores)
}

impl ExecutionContext {
    /// Decodifica `params` al tipo de parámetros del step.
    pub fn params_as<P: DeserializeOwned>(&self) -> Result<P, serde_json::Error> {
        serde_json::from_value(self.params.clone())
    }
}

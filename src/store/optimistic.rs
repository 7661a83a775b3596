// optimistic.rs
use arch_domain::DomainError;
use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

/// Errores visibles del store. Tras un rollback el error SIEMPRE se relanza
/// al caller para que lo muestre (toast/log); nunca se traga en silencio.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// La mutación optimista local violó una regla del dominio; no se tocó
    /// el estado.
    #[error("validation: {0}")]
    Validation(String),
    /// El use case autoritativo falló; el estado quedó restaurado al
    /// snapshot previo a la mutación.
    #[error("use case failed: {0}")]
    UseCase(String),
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        StoreError::Validation(err.to_string())
    }
}

/// Puerto asíncrono del use case autoritativo inyectado en el store.
///
/// Recibe la clave externa y el estado optimista propuesto, y devuelve el
/// estado autoritativo confirmado (o falla, disparando el rollback).
#[async_trait]
pub trait MutationUseCase<S>: Send + Sync
    where S: Clone + Send + Sync
{
    async fn execute(&self, key: &str, optimistic: &S) -> Result<S, StoreError>;
}

/// Contenedor de estado mutable local al proceso, keyed por un identificador
/// externo (p. ej. user id).
///
/// Protocolo de mutación (`mutate`):
/// (a) snapshot del estado actual;
/// (b) aplicación optimista síncrona e inmediata;
/// (c) invocación asíncrona del use case inyectado (pending);
/// (d) éxito: el resultado autoritativo reemplaza el estado local;
///     falla: se restaura el snapshot previo y el error se relanza.
///
/// Mutaciones concurrentes sobre la misma clave: gana la última escritura
/// (éxito o rollback); no hay garantía de orden entre mutaciones solapadas.
/// Limitación aceptada por diseño, no un contrato a reforzar. Tampoco hay
/// cancelación: una invocación iniciada sólo puede ignorarse.
pub struct OptimisticStore<S>
    where S: Clone + Default + Send + Sync + 'static
{
    states: DashMap<String, S>,
}

impl<S> OptimisticStore<S> where S: Clone + Default + Send + Sync + 'static
{
    pub fn new() -> Self {
        Self { states: DashMap::new() }
    }

    /// Selector de lectura: estado actual de la clave (default si no hay).
    pub fn get(&self, key: &str) -> S {
        self.states.get(key).map(|s| s.clone()).unwrap_or_default()
    }

    /// ¿Hay estado materializado para la clave?
    pub fn contains(&self, key: &str) -> bool {
        self.states.contains_key(key)
    }

    /// Ejecuta el protocolo optimista completo sobre `key`.
    ///
    /// `apply` produce el estado optimista a partir del actual; si falla
    /// (regla de dominio), la mutación aborta sin tocar el estado ni invocar
    /// el use case.
    pub async fn mutate<F>(&self,
                           key: &str,
                           use_case: &dyn MutationUseCase<S>,
                           apply: F)
                           -> Result<S, StoreError>
        where F: FnOnce(&S) -> Result<S, StoreError>
    {
        let snapshot = self.get(key);
        let optimistic = apply(&snapshot)?;
        // Visible de inmediato para los selectores (estado pending).
        self.states.insert(key.to_string(), optimistic.clone());

        match use_case.execute(key, &optimistic).await {
            Ok(authoritative) => {
                self.states.insert(key.to_string(), authoritative.clone());
                Ok(authoritative)
            }
            Err(err) => {
                self.states.insert(key.to_string(), snapshot);
                Err(err)
            }
        }
    }
}

impl<S> Default for OptimisticStore<S> where S: Clone + Default + Send + Sync + 'static
{
    fn default() -> Self {
        Self::new()
    }
}

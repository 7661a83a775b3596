//! Builder para `BatchEngine`.
//!
//! Patrón builder seguro en tiempo de compilación que obliga a declarar el
//! primer paso (fuente) y encadenar pasos cuyos tipos de entrada y salida
//! sean compatibles.
//!
//! Notas de diseño
//! - `EngineBuilderInit` representa el estado inicial del builder: stores
//!   (event_store + repository) deben estar presentes.
//! - `EngineBuilder<S, E, R>` mantiene el último tipo de salida conocido
//!   `S::Output` (mediante `PhantomData`) y la lista de pasos en forma de
//!   `Vec<Box<dyn StepDefinition>>`.
//! - El método `add_step` impone en sus bounds que la entrada del siguiente
//!   paso sea compatible con la salida del paso anterior usando `SameAs`.
//!
//! Construcción típica:
//!
//! ```ignore
//! let engine = BatchEngine::new()
//!     .first_step(LoadBatchStep::new(raw))
//!     .add_step(ValidateBatchStep::new())
//!     .add_step(GenerateModulesStep::new())
//!     .add_step(PublishStep::new(registry))
//!     .build();
//! ```

use std::fmt::Debug;
use std::marker::PhantomData;

use crate::engine::BatchEngine;
use crate::event::EventStore;
use crate::repo::BatchRepository;
use crate::step::{SameAs, StepDefinition, TypedStep};

/// Estado inicial del builder.
///
/// Contiene las stores necesarias para crear un `BatchEngine`. Antes de
/// poder añadir pasos debemos definir el primer paso (de tipo `Source`).
pub struct EngineBuilderInit<E: EventStore, R: BatchRepository> {
    /// Store de eventos que usará el engine.
    pub event_store: E,
    /// Repositorio de replay del batch.
    pub repository: R,
}

impl<E: EventStore, R: BatchRepository> EngineBuilderInit<E, R> {
    /// Define el primer paso del pipeline y transiciona al builder completo.
    ///
    /// Requerimos que el primer paso sea de tipo `Source`. Se hace una
    /// aserción en tiempo de ejecución (`debug_assert!`) para ayudar durante
    /// el desarrollo; en builds release la aserción queda desactivada.
    #[inline]
    pub fn first_step<S>(self, step: S) -> EngineBuilder<S, E, R>
        where S: TypedStep + Debug + 'static
    {
        debug_assert!(matches!(step.kind(), crate::step::StepKind::Source),
                      "El primer paso debe ser de tipo Source",);

        EngineBuilder { event_store: self.event_store,
                        repository: self.repository,
                        steps: vec![Box::new(step)],
                        _out: PhantomData::<S::Output> }
    }
}

/// Builder principal que acumula pasos y garantiza compatibilidad de tipos.
///
/// El parámetro genérico `S` representa el tipo del último `TypedStep`
/// añadido; su asociado `S::Output` se conserva en `_out` para imponer
/// restricciones en el siguiente `add_step`.
pub struct EngineBuilder<S: TypedStep + Debug + 'static, E: EventStore, R: BatchRepository> {
    event_store: E,
    repository: R,
    /// Lista de pasos que conforman la definición del pipeline.
    steps: Vec<Box<dyn StepDefinition>>,
    /// Marcador de tipo para el output del último paso añadido.
    _out: PhantomData<S::Output>,
}

impl<S: TypedStep + Debug + 'static, E: EventStore, R: BatchRepository> EngineBuilder<S, E, R> {
    /// Añade un siguiente paso al pipeline.
    ///
    /// La comprobación `N::Input: SameAs<S::Output>` asegura que la entrada
    /// del nuevo paso `N` es compatible con la salida del paso anterior `S`.
    ///
    /// Consumimos `self` porque cambiamos el estado del builder y devolvemos
    /// un nuevo `EngineBuilder` parametrizado por el nuevo paso `N`.
    #[inline]
    pub fn add_step<N>(mut self, next: N) -> EngineBuilder<N, E, R>
        where N: TypedStep + Debug + 'static,
              N::Input: SameAs<S::Output>
    {
        self.steps.push(Box::new(next));

        EngineBuilder { event_store: self.event_store,
                        repository: self.repository,
                        steps: self.steps,
                        _out: PhantomData }
    }

    /// Construye el `BatchEngine` final usando las stores y la lista de
    /// pasos. Genera automáticamente la definición del pipeline a partir de
    /// `self.steps` y la establece como definición por defecto.
    #[inline]
    pub fn build(self) -> BatchEngine<E, R> {
        let mut engine = BatchEngine::new_with_stores(self.event_store, self.repository);
        let definition = crate::repo::build_pipeline_definition_auto(self.steps);
        engine.set_default_definition(definition);
        engine
    }
}

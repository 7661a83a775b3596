//! Runtime de estado optimista por clave.
//!
//! Implementación de referencia, independiente de cualquier framework de
//! render, del patrón que el generador de Application emite para los stores:
//! una máquina de estados por mutación (snapshot -> aplicación optimista ->
//! pending -> confirmación | rollback) sobre un contenedor síncrono más un
//! handle de tarea asíncrona.

pub mod optimistic;

pub use optimistic::{MutationUseCase, OptimisticStore, StoreError};

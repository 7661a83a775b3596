//! Inyección determinista de parámetros.
//!
//! El composition root configura inyectores en el engine (por ejemplo, la
//! raíz de salida o la base de raw URLs tomadas de configuración); antes de
//! ejecutar cada step, el engine fusiona el resultado de los inyectores
//! sobre los `base_params` del step. Los inyectores deben ser deterministas:
//! sin IO, sin tiempo ambiente, sin aleatoriedad.

pub mod composite;
pub mod merge;
pub mod param_injector;

pub use composite::CompositeInjector;
pub use merge::merge_json;
pub use param_injector::{ConstInjector, ParamInjector};

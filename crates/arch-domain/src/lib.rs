// arch-domain library entry point
pub mod attribute;
pub mod class_spec;
pub mod collection;
pub mod error;
pub mod layer;
pub mod naming;
pub use attribute::{AttrType, Attribute};
pub use class_spec::{ClassSpec, MethodSpec};
pub use collection::KeyedQuantityCollection;
pub use error::DomainError;
pub use layer::Layer;
pub use naming::{resolve, NameSet};

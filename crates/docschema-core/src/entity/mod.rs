//! Entity registration and rendering.

mod registrar;
mod transform;

pub use registrar::{prepare, register, Registrar};
pub use transform::SerializationTransform;

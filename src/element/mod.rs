//! Element system: the dispatch trait, root defaults, surfaces, values and
//! the type registry.

pub mod base;
pub mod surface;
pub mod traits;
pub mod types;
pub mod value;

pub use base::Base;
pub use surface::{Surface, SurfaceCache, SurfaceState};
pub use traits::{Direction, DrawPass, Element, Reflow};
pub use types::{ElementTypeId, TypeRegistry};
pub use value::{ValueElement, ValueHook};

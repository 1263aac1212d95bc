//! Element arena: slotmap-backed tree of element data and behaviors.

pub mod node;
pub mod tree;

pub use node::{ElementData, ElementId, ElementState};
pub use tree::{AddPosition, Tree, TreeError};

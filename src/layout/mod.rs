//! Layout bridge: taffy computes rects, reflow applies them.

pub mod engine;

pub use engine::{LayoutEngine, LayoutError};

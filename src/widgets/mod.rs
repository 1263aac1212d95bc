//! Built-in widgets: Container, Knob, Canvas.

pub mod canvas;
pub mod container;
pub mod knob;

pub use canvas::Canvas;
pub use container::Container;
pub use knob::Knob;

//! Event system: payload types and bubble paths.

pub mod handler;
pub mod input;

pub use handler::bubble_path;
pub use input::{
    DragEvent, Event, EventResult, Key, KeyEvent, Modifiers, MouseButton, MouseEvent, Origin,
    ValueEvent,
};

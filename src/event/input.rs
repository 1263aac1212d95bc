//! Event payloads: keys, mouse buttons, drags, and value changes.
//!
//! The platform layer translates raw window-system input into [`Event`]s;
//! the element tree never sees platform types.

use std::ops::{BitAnd, BitOr};

use crate::dom::node::ElementId;
use crate::geometry::Point;

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Keyboard key, decoupled from the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Tab,
    Backspace,
    Left,
    Right,
    Up,
    Down,
    NumpadUp,
    NumpadDown,
    Home,
    End,
}

impl Key {
    /// Whether this is one of the "increase" arrow keys.
    pub fn is_up(self) -> bool {
        matches!(self, Key::Up | Key::NumpadUp)
    }

    /// Whether this is one of the "decrease" arrow keys.
    pub fn is_down(self) -> bool {
        matches!(self, Key::Down | Key::NumpadDown)
    }
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// Modifier key bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const SHIFT: Modifiers = Modifiers(1);
    pub const CTRL: Modifiers = Modifiers(2);
    pub const ALT: Modifiers = Modifiers(4);

    /// Check whether `self` contains all the bits in `other`.
    pub fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check whether no modifier bits are set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;
    fn bitor(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitAnd for Modifiers {
    type Output = Modifiers;
    fn bitand(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 & rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Mouse button, numbered the way the window system reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button.
    Button1,
    /// Middle button.
    Button2,
    /// Secondary button.
    Button3,
}

/// A keyboard event with key and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a new key event.
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// A button press or release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub button: MouseButton,
    pub cursor: Point,
}

/// A drag step. `target` is the element the drag started on; `delta` is the
/// cursor movement since the previous step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEvent {
    pub target: ElementId,
    pub button: MouseButton,
    pub delta: Point,
    pub cursor: Point,
}

/// Whether a value change came from code or from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Set programmatically.
    Synthetic,
    /// Set by user interaction.
    Genuine,
}

/// A value change, in the element's external units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueEvent {
    pub origin: Origin,
    pub value: f32,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// An event delivered to an element's `on_event`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    DragStart(DragEvent),
    Dragging(DragEvent),
    MouseDown(MouseEvent),
    MouseUp(MouseEvent),
    KeyPress(KeyEvent),
    ValueChange(ValueEvent),
}

impl Event {
    /// Short tag used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::DragStart(_) => "drag-start",
            Event::Dragging(_) => "dragging",
            Event::MouseDown(_) => "mouse-down",
            Event::MouseUp(_) => "mouse-up",
            Event::KeyPress(_) => "key-press",
            Event::ValueChange(_) => "value-change",
        }
    }

    /// Shorthand for a key press.
    pub fn key(key: Key, modifiers: Modifiers) -> Self {
        Event::KeyPress(KeyEvent::new(key, modifiers))
    }

    /// Shorthand for a drag step on `target` with no cursor position.
    pub fn drag(target: ElementId, button: MouseButton, dx: f32, dy: f32) -> Self {
        Event::Dragging(DragEvent {
            target,
            button,
            delta: Point::new(dx, dy),
            cursor: Point::ZERO,
        })
    }

    /// Shorthand for a button press.
    pub fn mouse_down(button: MouseButton) -> Self {
        Event::MouseDown(MouseEvent { button, cursor: Point::ZERO })
    }
}

/// Outcome of offering an event to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventResult {
    /// Not handled; bubbling continues.
    #[default]
    Ignored,
    /// Handled; bubbling stops.
    Consumed,
}

impl EventResult {
    /// Whether the event was consumed.
    pub fn is_consumed(self) -> bool {
        self == EventResult::Consumed
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_none_is_empty() {
        assert!(Modifiers::NONE.is_empty());
        assert!(!Modifiers::SHIFT.is_empty());
    }

    #[test]
    fn modifiers_bitor_combines() {
        let combined = Modifiers::SHIFT | Modifiers::ALT;
        assert!(combined.contains(Modifiers::SHIFT));
        assert!(combined.contains(Modifiers::ALT));
        assert!(!combined.contains(Modifiers::CTRL));
    }

    #[test]
    fn modifiers_bitand_masks() {
        let combined = Modifiers::SHIFT | Modifiers::CTRL;
        assert_eq!(combined & Modifiers::CTRL, Modifiers::CTRL);
        assert!((combined & Modifiers::ALT).is_empty());
    }

    #[test]
    fn numpad_arrows_count_as_arrows() {
        assert!(Key::NumpadUp.is_up());
        assert!(Key::Up.is_up());
        assert!(Key::NumpadDown.is_down());
        assert!(!Key::Char('k').is_up());
    }

    #[test]
    fn event_kind_tags() {
        assert_eq!(Event::key(Key::Up, Modifiers::NONE).kind(), "key-press");
        assert_eq!(Event::mouse_down(MouseButton::Button2).kind(), "mouse-down");
        let change = Event::ValueChange(ValueEvent { origin: Origin::Genuine, value: 0.5 });
        assert_eq!(change.kind(), "value-change");
    }

    #[test]
    fn event_result_default_is_ignored() {
        assert_eq!(EventResult::default(), EventResult::Ignored);
        assert!(EventResult::Consumed.is_consumed());
    }
}

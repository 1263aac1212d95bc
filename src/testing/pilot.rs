//! Pilot: programmatic interaction with a headless Window.
//!
//! The `Pilot` wraps a [`Window`] over a [`RecordingBackend`] and provides
//! methods to simulate user input (key presses, drags, mouse buttons,
//! resize), draw frames, and inspect the GPU commands they produced.

use crate::dom::node::{ElementData, ElementId};
use crate::element::Element;
use crate::event::{Event, EventResult, Key, Modifiers, MouseButton};
use crate::window::{Window, WindowConfig};

use super::recorder::{Command, RecordingBackend};

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless window driver for testing.
///
/// Key presses go to the focused element (the root when nothing is
/// focused) and bubble rootward from there; pointer events bubble from the
/// element they target.
///
/// # Examples
///
/// ```ignore
/// use gilt_surface::testing::Pilot;
/// use gilt_surface::widgets::Knob;
/// use gilt_surface::event::Key;
///
/// let mut pilot = Pilot::new(100, 100);
/// let knob = pilot.mount(Knob::new());
/// pilot.focus(knob);
/// pilot.press_key(Key::Up);
/// assert!(pilot.frame());
/// ```
pub struct Pilot {
    window: Window,
    focus: Option<ElementId>,
}

impl Pilot {
    /// Create a headless window of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_config(WindowConfig::default().with_size(width, height))
    }

    /// Create a Pilot from a [`WindowConfig`].
    pub fn with_config(config: WindowConfig) -> Self {
        let backend = RecordingBackend::new(config.width, config.height);
        Self {
            window: Window::new(config, backend),
            focus: None,
        }
    }

    /// Install `root` as the root element and place it over the window.
    pub fn mount(&mut self, root: impl Element) -> ElementId {
        let id = self.window.insert_root(ElementData::new(), root);
        let (width, height) = (self.window.config().width, self.window.config().height);
        self.window.resize(width, height);
        self.focus = None;
        id
    }

    /// Route key presses to `id`.
    pub fn focus(&mut self, id: ElementId) {
        self.focus = Some(id);
    }

    // ── Input simulation ─────────────────────────────────────────────

    /// Simulate a key press with no modifiers.
    pub fn press_key(&mut self, key: Key) -> EventResult {
        self.press_key_with(key, Modifiers::NONE)
    }

    /// Simulate a key press with the given modifiers.
    pub fn press_key_with(&mut self, key: Key, modifiers: Modifiers) -> EventResult {
        let Some(target) = self.focus.or_else(|| self.window.root()) else {
            return EventResult::Ignored;
        };
        self.window.bubble_event(target, &Event::key(key, modifiers))
    }

    /// Simulate one drag step on `target`.
    pub fn drag(&mut self, target: ElementId, button: MouseButton, dx: f32, dy: f32) -> EventResult {
        self.window
            .bubble_event(target, &Event::drag(target, button, dx, dy))
    }

    /// Simulate a mouse button press over `target`.
    pub fn mouse_down(&mut self, target: ElementId, button: MouseButton) -> EventResult {
        self.window.bubble_event(target, &Event::mouse_down(button))
    }

    /// Simulate a window resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.window.resize(width, height);
    }

    // ── Processing ───────────────────────────────────────────────────

    /// Draw a frame if anything changed. Returns whether one was drawn.
    pub fn frame(&mut self) -> bool {
        self.window.frame()
    }

    /// Draw a frame and return the commands it issued.
    pub fn tick(&mut self) -> Vec<Command> {
        self.recorder_mut().clear_commands();
        self.window.frame();
        self.recorder_mut().take_commands()
    }

    // ── Query ────────────────────────────────────────────────────────

    /// Borrow the underlying window immutably.
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Borrow the underlying window mutably.
    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    /// The recording backend.
    pub fn recorder(&self) -> &RecordingBackend {
        match self.window.backend_as::<RecordingBackend>() {
            Some(backend) => backend,
            None => unreachable!("pilot windows always record"),
        }
    }

    /// The recording backend, mutably.
    pub fn recorder_mut(&mut self) -> &mut RecordingBackend {
        match self.window.backend_as_mut::<RecordingBackend>() {
            Some(backend) => backend,
            None => unreachable!("pilot windows always record"),
        }
    }
}

impl std::fmt::Debug for Pilot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pilot")
            .field("window", &self.window)
            .field("focus", &self.focus)
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

//! Normalized-value elements.
//!
//! A [`ValueElement`] stores its value in `0.0..=1.0` and maps it onto
//! `min..=max` whenever it reports a change. Interactive controls (knobs,
//! sliders) capture one as `sup` and set values through it.

use std::any::Any;

use super::base::Base;
use super::traits::Element;
use crate::dom::node::ElementId;
use crate::event::{Event, Origin, ValueEvent};
use crate::window::Window;

/// Type name registered by plain value elements.
pub const TYPE_NAME: &str = "gilt.value";

/// Hook run after the value is stored and before the change is reported.
pub type ValueHook = fn(&mut Window, ElementId, f32);

/// An element holding a normalized value.
#[derive(Debug, Clone)]
pub struct ValueElement {
    pub sup: Base,
    /// Reset value, in external units.
    pub origin: f32,
    pub min: f32,
    pub max: f32,
    value: f32,
    hook: Option<ValueHook>,
}

impl Default for ValueElement {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueElement {
    /// A value element over `0.0..=1.0` with origin `0.0`.
    pub fn new() -> Self {
        Self {
            sup: Base,
            origin: 0.0,
            min: 0.0,
            max: 1.0,
            value: 0.0,
            hook: None,
        }
    }

    /// Set the external range (builder). `min` and `max` must differ.
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Set the reset value in external units (builder).
    pub fn with_origin(mut self, origin: f32) -> Self {
        self.origin = origin;
        self
    }

    /// Install a pre-dispatch hook (builder).
    pub fn with_hook(mut self, hook: ValueHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// The normalized value.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// The value in external units.
    pub fn cooked(&self) -> f32 {
        self.value * (self.max - self.min) + self.min
    }

    /// Convert external units to the normalized scale, unclamped.
    pub fn normalize(&self, v: f32) -> f32 {
        (v - self.min) / (self.max - self.min)
    }

    /// Store a normalized value and report it.
    pub fn set_value(&mut self, win: &mut Window, id: ElementId, v: f32, origin: Origin) {
        self.set_value_with(win, id, v, origin, |_, _| {});
    }

    /// Store a normalized value, run `pre` and the installed hook with the
    /// clamped value, then bubble a value change if the element is attached.
    pub fn set_value_with(
        &mut self,
        win: &mut Window,
        id: ElementId,
        v: f32,
        origin: Origin,
        pre: impl FnOnce(&mut Window, f32),
    ) {
        self.value = v.clamp(0.0, 1.0);
        pre(win, self.value);
        if let Some(hook) = self.hook {
            hook(win, id, self.value);
        }

        let attached = win.element(id).is_some_and(|data| data.is_attached());
        if attached {
            let event = Event::ValueChange(ValueEvent { origin, value: self.cooked() });
            win.bubble_event(id, &event);
        }
    }

    /// Store a value given in external units.
    pub fn set_value_uncooked(&mut self, win: &mut Window, id: ElementId, v: f32, origin: Origin) {
        let normalized = self.normalize(v);
        self.set_value(win, id, normalized, origin);
    }

    /// Reset to the origin.
    pub fn reset(&mut self, win: &mut Window, id: ElementId, origin: Origin) {
        self.set_value_uncooked(win, id, self.origin, origin);
    }
}

impl Element for ValueElement {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn attached(&mut self, win: &mut Window, id: ElementId) {
        self.sup.attached(win, id);
        win.register_type(id, TYPE_NAME);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ===========================================================================
// Tests
// ===========================================================================

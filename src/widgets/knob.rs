//! Knob widget: a rotary value control.
//!
//! Dragging vertically turns the knob (button 1 coarse, button 3 fine),
//! button 2 resets it to its origin, and the arrow keys step it. The needle
//! sweeps from [`MIN_DEGREES`] to [`MAX_DEGREES`].

use std::any::Any;

use crate::dom::node::ElementId;
use crate::element::{DrawPass, Element, ValueElement};
use crate::event::{DragEvent, Event, EventResult, KeyEvent, Modifiers, MouseButton, Origin};
use crate::geometry::{Mat4, Quad, Rect};
use crate::render::backend::{BlendMode, ShaderSource};
use crate::window::Window;

/// Type name registered by knobs.
pub const TYPE_NAME: &str = "gilt.knob";

/// Needle angle at value 0.
pub const MIN_DEGREES: f32 = 35.0;
/// Needle angle at value 1.
pub const MAX_DEGREES: f32 = 360.0 - MIN_DEGREES;
const DEGREE_RANGE: f32 = MAX_DEGREES - MIN_DEGREES;

/// Value change per pixel of button-1 drag.
pub const STEP_COARSE: f32 = 0.005;
/// Value change per pixel of button-3 drag.
pub const STEP_FINE: f32 = 0.0005;

/// Default knob edge length in pixels.
pub const DEFAULT_SIZE: f32 = 30.0;

/// Shader drawing the knob face.
pub const KNOB_SHADER: ShaderSource = ShaderSource {
    name: "knob",
    vertex: "\
uniform mat4 projection;
uniform mat4 modelview;
uniform vec2 position;
attribute vec2 vertex;
varying vec2 local;
void main() {
    local = vertex;
    gl_Position = projection * vec4((modelview * vec4(vertex, 0.0, 1.0)).xy + position, 0.0, 1.0);
}",
    fragment: "\
uniform vec4 color;
varying vec2 local;
void main() {
    gl_FragColor = color;
}",
};

// ---------------------------------------------------------------------------
// Knob
// ---------------------------------------------------------------------------

/// A rotary control over a [`ValueElement`].
#[derive(Debug, Clone)]
pub struct Knob {
    pub sup: ValueElement,
    modelview: Mat4,
}

impl Default for Knob {
    fn default() -> Self {
        Self::new()
    }
}

impl Knob {
    /// A knob over `0.0..=1.0` with origin `0.0`.
    pub fn new() -> Self {
        Self {
            sup: ValueElement::new(),
            modelview: Mat4::rotation_z(MIN_DEGREES),
        }
    }

    /// Set the external range (builder).
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.sup = self.sup.with_range(min, max);
        self
    }

    /// Set the reset value in external units (builder).
    pub fn with_origin(mut self, origin: f32) -> Self {
        self.sup = self.sup.with_origin(origin);
        self
    }

    /// The normalized value.
    pub fn value(&self) -> f32 {
        self.sup.value()
    }

    /// Needle angle in degrees for the current value.
    pub fn degrees(&self) -> f32 {
        MIN_DEGREES + self.sup.value() * DEGREE_RANGE
    }

    /// Rotation applied to the knob face.
    pub fn modelview(&self) -> &Mat4 {
        &self.modelview
    }

    /// Set the normalized value, turning the needle before the change is
    /// reported.
    pub fn set_value(&mut self, win: &mut Window, id: ElementId, v: f32, origin: Origin) {
        let modelview = &mut self.modelview;
        self.sup.set_value_with(win, id, v, origin, |win, value| {
            *modelview = Mat4::rotation_z(MIN_DEGREES + value * DEGREE_RANGE);
            win.mark_dirty(id);
        });
    }

    /// Set the value in external units.
    pub fn set_value_uncooked(&mut self, win: &mut Window, id: ElementId, v: f32, origin: Origin) {
        let normalized = self.sup.normalize(v);
        self.set_value(win, id, normalized, origin);
    }

    /// Return to the origin.
    pub fn reset(&mut self, win: &mut Window, id: ElementId, origin: Origin) {
        self.set_value_uncooked(win, id, self.sup.origin, origin);
    }

    fn handle_drag(&mut self, win: &mut Window, id: ElementId, drag: &DragEvent) -> EventResult {
        if drag.target != id {
            return EventResult::Ignored;
        }
        let step = match drag.button {
            MouseButton::Button1 => STEP_COARSE,
            MouseButton::Button3 => STEP_FINE,
            MouseButton::Button2 => return EventResult::Consumed,
        };
        let value = self.value() - drag.delta.y * step;
        self.set_value(win, id, value, Origin::Genuine);
        EventResult::Consumed
    }

    fn handle_mouse_down(&mut self, win: &mut Window, id: ElementId, button: MouseButton) -> EventResult {
        match button {
            MouseButton::Button2 => {
                self.reset(win, id, Origin::Genuine);
                EventResult::Consumed
            }
            MouseButton::Button1 => EventResult::Consumed,
            MouseButton::Button3 => EventResult::Ignored,
        }
    }

    fn handle_key(&mut self, win: &mut Window, id: ElementId, key: &KeyEvent) -> EventResult {
        let step = if key.modifiers.contains(Modifiers::ALT) {
            STEP_FINE
        } else if key.modifiers.contains(Modifiers::SHIFT) {
            STEP_COARSE * 2.0
        } else {
            STEP_COARSE
        };

        let value = if key.key.is_up() {
            self.value() + step
        } else if key.key.is_down() {
            self.value() - step
        } else {
            return EventResult::Ignored;
        };
        self.set_value(win, id, value, Origin::Genuine);
        EventResult::Consumed
    }

    fn draw_face(&self, win: &mut Window, id: ElementId) {
        let Some(rect) = win.element(id).map(|data| data.rect) else {
            return;
        };
        let Some(shader) = win.shader(TYPE_NAME, &KNOB_SHADER) else {
            return;
        };
        let projection = win.projection_for(id);
        let mut quad = Quad::default();
        quad.set_vertices(Rect::new(-rect.w / 2.0, -rect.h / 2.0, rect.w, rect.h));

        let backend = win.backend_mut();
        backend.use_shader(shader);
        backend.set_projection(&projection);
        backend.set_modelview(&self.modelview);
        backend.set_position(rect.x + rect.w / 2.0, rect.y + rect.h / 2.0);
        backend.set_blend(Some(BlendMode::PREMULTIPLIED));
        backend.draw_quad(&quad);
    }
}

impl Element for Knob {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn init(&mut self, win: &mut Window, id: ElementId) {
        if let Some(data) = win.element_mut(id) {
            if !data.rect.has_area() {
                data.rect.w = DEFAULT_SIZE;
                data.rect.h = DEFAULT_SIZE;
            }
        }
        self.sup.init(win, id);
    }

    fn draw(&mut self, win: &mut Window, id: ElementId, pass: DrawPass) {
        self.draw_face(win, id);
        self.sup.draw(win, id, pass);
    }

    fn attached(&mut self, win: &mut Window, id: ElementId) {
        self.sup.attached(win, id);
        win.register_type(id, TYPE_NAME);
        self.reset(win, id, Origin::Synthetic);
    }

    fn on_event(&mut self, win: &mut Window, id: ElementId, event: &Event) -> EventResult {
        match event {
            Event::DragStart(drag) | Event::Dragging(drag) => self.handle_drag(win, id, drag),
            Event::MouseDown(press) => self.handle_mouse_down(win, id, press.button),
            Event::KeyPress(key) => self.handle_key(win, id, key),
            _ => self.sup.on_event(win, id, event),
        }
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

//! Container widget: groups child elements.
//!
//! A container draws nothing but an optional flat background, then its
//! children. Whether it can be redrawn in isolation is a property of its
//! [`ElementData`](crate::dom::ElementData): mark it `clearable` when the
//! background is opaque and covers the whole rect.

use std::any::Any;

use crate::dom::node::ElementId;
use crate::element::{Base, DrawPass, Element};
use crate::geometry::Quad;
use crate::render::backend::{BlendMode, Color, ShaderSource};
use crate::window::Window;

/// Type name registered by containers.
pub const TYPE_NAME: &str = "gilt.container";

/// Flat-color shader used for container backgrounds.
pub const FLAT_SHADER: ShaderSource = ShaderSource {
    name: "flat",
    vertex: "\
uniform mat4 projection;
uniform vec2 position;
attribute vec2 vertex;
void main() {
    gl_Position = projection * vec4(vertex + position, 0.0, 1.0);
}",
    fragment: "\
uniform vec4 color;
void main() {
    gl_FragColor = color;
}",
};

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// A grouping element with an optional background color.
///
/// # Examples
///
/// ```ignore
/// use gilt_surface::widgets::Container;
/// use gilt_surface::render::Color;
///
/// let panel = Container::new().with_background(Color::rgb(0x404F3C, 1.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Container {
    pub sup: Base,
    background: Option<Color>,
}

impl Container {
    /// Create a container without background.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the rect with `color` before drawing children (builder).
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// The background color, if any.
    pub fn background(&self) -> Option<Color> {
        self.background
    }
}

impl Element for Container {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn draw(&mut self, win: &mut Window, id: ElementId, pass: DrawPass) {
        if let Some(color) = self.background {
            fill(win, id, color);
        }
        self.sup.draw(win, id, pass);
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

fn fill(win: &mut Window, id: ElementId, color: Color) {
    let Some(rect) = win.element(id).map(|data| data.rect) else {
        return;
    };
    if !rect.has_area() {
        return;
    }
    let Some(shader) = win.shader(TYPE_NAME, &FLAT_SHADER) else {
        return;
    };
    let projection = win.projection_for(id);
    let mut quad = Quad::default();
    quad.set_vertices(rect);

    let backend = win.backend_mut();
    backend.use_shader(shader);
    backend.set_projection(&projection);
    backend.set_position(0.0, 0.0);
    backend.set_color(color.premultiplied());
    backend.set_blend(Some(BlendMode::PREMULTIPLIED));
    backend.draw_quad(&quad);
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::ElementData;
    use crate::geometry::Rect;
    use crate::testing::{Command, RecordingBackend};
    use crate::window::WindowConfig;

    fn window() -> Window {
        Window::new(WindowConfig::default().with_size(100, 100), RecordingBackend::new(100, 100))
    }

    #[test]
    fn registers_container_type() {
        let mut win = window();
        let root = win.insert_root(ElementData::new(), Container::new());
        let type_id = win.element(root).unwrap().type_id.unwrap();
        assert_eq!(win.types().name(type_id), Some(TYPE_NAME));
    }

    #[test]
    fn plain_container_draws_nothing_itself() {
        let mut win = window();
        let root = win.insert_root(ElementData::new(), Container::new());
        win.place(root, Rect::new(0.0, 0.0, 50.0, 50.0));
        win.backend_as_mut::<RecordingBackend>().unwrap().clear_commands();

        win.draw(root, DrawPass::Full);
        assert_eq!(win.backend_as::<RecordingBackend>().unwrap().quads_drawn(), 0);
    }

    #[test]
    fn background_fills_rect() {
        let mut win = window();
        let color = Color::new(1.0, 0.0, 0.0, 0.5);
        let root = win.insert_root(ElementData::new(), Container::new().with_background(color));
        win.place(root, Rect::new(10.0, 10.0, 30.0, 20.0));
        win.draw(root, DrawPass::Full);

        let commands = win.backend_as::<RecordingBackend>().unwrap().commands();
        assert!(commands.contains(&Command::SetColor(Color::new(0.5, 0.0, 0.0, 0.5))));
        let quad = commands.iter().find_map(|c| match c {
            Command::DrawQuad(q) => Some(*q),
            _ => None,
        });
        assert_eq!(quad.unwrap().bounds(), Rect::new(10.0, 10.0, 30.0, 20.0));
    }

    #[test]
    fn background_without_area_is_skipped() {
        let mut win = window();
        let root = win.insert_root(
            ElementData::new(),
            Container::new().with_background(Color::WHITE),
        );
        win.draw(root, DrawPass::Full);
        assert_eq!(win.backend_as::<RecordingBackend>().unwrap().quads_drawn(), 0);
    }

    #[test]
    fn broken_shader_skips_background() {
        let mut win = window();
        win.backend_as_mut::<RecordingBackend>().unwrap().fail_shader("flat");
        let root = win.insert_root(
            ElementData::new(),
            Container::new().with_background(Color::WHITE),
        );
        win.place(root, Rect::new(0.0, 0.0, 10.0, 10.0));
        win.draw(root, DrawPass::Full);
        win.draw(root, DrawPass::Full);
        let backend = win.backend_as::<RecordingBackend>().unwrap();
        assert_eq!(backend.quads_drawn(), 0);
        assert_eq!(backend.compile_attempts(), 1);
    }
}

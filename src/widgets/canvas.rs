//! Canvas widget: a pannable surface over a tiled background.
//!
//! The canvas caches its children like any [`Surface`] and composites them
//! over a repeating background tile. Dragging with button 2 pans every
//! child along with the tile.

use std::any::Any;

use crate::dom::node::ElementId;
use crate::element::{Direction, DrawPass, Element, Reflow, Surface};
use crate::event::{DragEvent, Event, EventResult, MouseButton};
use crate::geometry::{Point, Quad, Rect};
use crate::render::asset::Asset;
use crate::render::backend::{BlendMode, ShaderSource};
use crate::window::Window;

/// Type name registered by canvases.
pub const TYPE_NAME: &str = "gilt.canvas";

/// Resource name of the background tile texture.
const TILE_TEXTURE: &str = "tile";

static CHECKER_PIXELS: [u8; 16] = [
    0x2A, 0x2C, 0x2A, 0xFF, 0x24, 0x26, 0x24, 0xFF, //
    0x24, 0x26, 0x24, 0xFF, 0x2A, 0x2C, 0x2A, 0xFF,
];

/// Default background: a dark 2x2 checker.
pub const CHECKER_TILE: Asset = Asset::embedded(&CHECKER_PIXELS, 2, 2);

/// Shader drawing the repeating background.
pub const CANVAS_SHADER: ShaderSource = ShaderSource {
    name: "canvas",
    vertex: "\
uniform mat4 projection;
uniform vec2 position;
attribute vec2 vertex;
attribute vec2 texcoord;
varying vec2 uv;
void main() {
    uv = texcoord;
    gl_Position = projection * vec4(vertex + position, 0.0, 1.0);
}",
    fragment: "\
uniform sampler2D tex;
varying vec2 uv;
void main() {
    gl_FragColor = texture2D(tex, fract(uv));
}",
};

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// A [`Surface`] with a tiled background and button-2 panning.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub sup: Surface,
    background: Option<Asset>,
    texture_offset: Point,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// A canvas over the [`CHECKER_TILE`] background.
    pub fn new() -> Self {
        Self {
            sup: Surface::new(),
            background: Some(CHECKER_TILE),
            texture_offset: Point::default(),
        }
    }

    /// Tile `asset` as the background (builder).
    pub fn with_background(mut self, asset: Asset) -> Self {
        self.background = Some(asset);
        self
    }

    /// Draw no background (builder).
    pub fn without_background(mut self) -> Self {
        self.background = None;
        self
    }

    /// Offset of the background tile, in pixels.
    pub fn texture_offset(&self) -> Point {
        self.texture_offset
    }

    /// Move every child by `by` and scroll the background with them.
    pub fn pan(&mut self, win: &mut Window, id: ElementId, by: Point) {
        for child in win.tree().children(id).to_vec() {
            let Some(rect) = win.element(child).map(|data| data.rect) else {
                continue;
            };
            win.place(child, rect.translate(by));
        }
        self.texture_offset = self.texture_offset - by;
        tracing::trace!(?id, dx = by.x, dy = by.y, "panned canvas");
        win.invalidate(id);
    }

    fn handle_drag(&mut self, win: &mut Window, id: ElementId, drag: &DragEvent) -> EventResult {
        match drag.button {
            MouseButton::Button2 => {
                self.pan(win, id, drag.delta);
                EventResult::Consumed
            }
            _ if drag.target == id => EventResult::Consumed,
            _ => EventResult::Ignored,
        }
    }

    fn draw_background(&self, win: &mut Window, id: ElementId) {
        let Some(asset) = &self.background else {
            return;
        };
        let Some(rect) = win.element(id).map(|data| data.rect) else {
            return;
        };
        if !rect.has_area() {
            return;
        }
        let Some(tile) = win.texture(TYPE_NAME, TILE_TEXTURE, asset) else {
            return;
        };
        let Some(shader) = win.shader(TYPE_NAME, &CANVAS_SHADER) else {
            return;
        };

        let (tw, th) = (tile.width as f32, tile.height as f32);
        let mut quad = Quad::default();
        quad.set_vertices(rect);
        quad.set_tex_coords(Rect::new(
            self.texture_offset.x.round() / tw,
            self.texture_offset.y.round() / th,
            rect.w / tw,
            rect.h / th,
        ));
        let projection = win.projection_for(id);

        let backend = win.backend_mut();
        backend.use_shader(shader);
        backend.set_projection(&projection);
        backend.set_position(0.0, 0.0);
        backend.bind_texture(Some(tile.id));
        backend.set_blend(Some(BlendMode::PREMULTIPLIED));
        backend.draw_quad(&quad);
        backend.bind_texture(None);
    }
}

impl Element for Canvas {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn init(&mut self, win: &mut Window, id: ElementId) {
        self.sup.init(win, id);
    }

    fn draw(&mut self, win: &mut Window, id: ElementId, _pass: DrawPass) {
        self.sup.draw_children(win, id);
        self.draw_background(win, id);
        self.sup.blit(win, id);
    }

    fn reflow(
        &mut self,
        win: &mut Window,
        id: ElementId,
        instigator: Option<ElementId>,
        direction: Direction,
    ) -> Reflow {
        self.sup.reflow(win, id, instigator, direction)
    }

    fn attached(&mut self, win: &mut Window, id: ElementId) {
        self.sup.attached(win, id);
        win.register_type(id, TYPE_NAME);
    }

    fn child_attached(&mut self, win: &mut Window, id: ElementId, child: ElementId) {
        self.sup.child_attached(win, id, child);
    }

    fn on_event(&mut self, win: &mut Window, id: ElementId, event: &Event) -> EventResult {
        if let Event::DragStart(drag) | Event::Dragging(drag) = event {
            if self.handle_drag(win, id, drag).is_consumed() {
                return EventResult::Consumed;
            }
        }
        self.sup.on_event(win, id, event)
    }

    fn fini(&mut self, win: &mut Window, id: ElementId) {
        self.sup.fini(win, id);
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

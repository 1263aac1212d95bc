//! Surfaces: elements that cache their subtree in an offscreen texture.
//!
//! A surface renders its children into a framebuffer-backed texture and
//! composites that texture into whatever target its own owner has bound.
//! Damage tracking keeps the cache consistent with the tree:
//!
//! - `INVALID`: the cache content is unusable. The next
//!   [`Surface::draw_children`] clears the texture and redraws every child.
//! - `VALID`: the cache is current except for the elements queued on
//!   `next_frame` (drained each pass) and `every_frame` (replayed each pass).
//!
//! The cache data lives on the tree node rather than in the behavior, so
//! dirty propagation can reach a surface whose behavior is busy.

use std::any::Any;

use indexmap::IndexSet;

use super::base::{self, Base};
use super::traits::{Direction, DrawPass, Element, Reflow};
use crate::dom::node::ElementId;
use crate::geometry::{Mat4, Point, Quad, FLIPPED_TEX_COORDS};
use crate::render::backend::{
    BlendMode, Color, FramebufferId, ShaderSource, TextureId, Viewport,
};
use crate::window::Window;

/// Type name registered by plain surfaces.
pub const TYPE_NAME: &str = "gilt.surface";

/// Shader used to composite surface textures.
pub const SURFACE_SHADER: ShaderSource = ShaderSource {
    name: "surface",
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
    gl_FragColor = texture2D(tex, uv);
}",
};

/// Outline color of the layout debug overlay.
const DEBUG_OUTLINE: Color = Color::new(1.0, 0.0, 1.0, 1.0);

// ---------------------------------------------------------------------------
// SurfaceState / SurfaceCache
// ---------------------------------------------------------------------------

/// Validity of a surface's cached pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceState {
    /// Needs a full clear-and-redraw.
    Invalid,
    /// Current, apart from queued entries.
    Valid,
}

/// GPU objects and redraw queues owned by one surface.
#[derive(Debug)]
pub struct SurfaceCache {
    pub(crate) texture: TextureId,
    pub(crate) framebuffer: FramebufferId,
    pub(crate) texture_size: Option<(u32, u32)>,
    pub(crate) quad: Quad,
    pub(crate) projection: Mat4,
    pub(crate) state: SurfaceState,
    pub(crate) next_frame: IndexSet<ElementId>,
    pub(crate) every_frame: IndexSet<ElementId>,
}

impl SurfaceCache {
    /// A cache over freshly created GPU objects, without storage yet.
    pub(crate) fn new(texture: TextureId, framebuffer: FramebufferId) -> Self {
        Self {
            texture,
            framebuffer,
            texture_size: None,
            quad: Quad::default(),
            projection: Mat4::IDENTITY,
            state: SurfaceState::Invalid,
            next_frame: IndexSet::new(),
            every_frame: IndexSet::new(),
        }
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    /// Pixel dimensions of the texture storage, once reflowed.
    pub fn texture_size(&self) -> Option<(u32, u32)> {
        self.texture_size
    }

    /// The compositing quad, in window coordinates.
    pub fn quad(&self) -> &Quad {
        &self.quad
    }

    /// Projection mapping the surface rect onto its texture.
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    /// Entries pending incremental redraw, in FIFO order.
    pub fn next_frame(&self) -> &IndexSet<ElementId> {
        &self.next_frame
    }

    /// Entries redrawn on every pass, in insertion order.
    pub fn every_frame(&self) -> &IndexSet<ElementId> {
        &self.every_frame
    }

    /// Whether the next draw pass has any work to do.
    pub fn is_dirty(&self) -> bool {
        !(self.state == SurfaceState::Valid
            && self.next_frame.is_empty()
            && self.every_frame.is_empty())
    }

    /// Remove `id` from both queues.
    pub(crate) fn purge(&mut self, id: ElementId) {
        self.next_frame.shift_remove(&id);
        self.every_frame.shift_remove(&id);
    }
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// A cache-owning element.
///
/// Subclasses capture a `Surface` as `sup` and may call
/// [`draw_children`](Surface::draw_children) and [`blit`](Surface::blit)
/// separately to draw between them.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    pub sup: Base,
}

impl Surface {
    /// Create a surface behavior.
    pub fn new() -> Self {
        Self { sup: Base }
    }

    /// Bring the cached texture up to date.
    ///
    /// Does nothing when the surface is clean. Otherwise binds the surface's
    /// framebuffer and either repaints everything (`INVALID`) or replays the
    /// queued entries (`VALID`), then restores the previous target.
    pub fn draw_children(&self, win: &mut Window, id: ElementId) {
        let Some(cache) = win.tree().cache(id) else {
            return;
        };
        if !cache.is_dirty() {
            return;
        }
        let Some((width, height)) = cache.texture_size else {
            tracing::trace!(?id, "surface has no storage, skipping draw");
            return;
        };
        let framebuffer = cache.framebuffer;

        let backend = win.backend_mut();
        let saved_target = backend.bound_framebuffer();
        let saved_viewport = backend.viewport();
        backend.bind_framebuffer(Some(framebuffer));
        backend.set_viewport(Viewport::new(0, 0, width, height));

        match cache_state(win, id) {
            Some(SurfaceState::Invalid) => {
                let backend = win.backend_mut();
                backend.set_scissor(false);
                backend.clear(Color::TRANSPARENT);
                if let Some(cache) = win.tree_mut().cache_mut(id) {
                    cache.next_frame.clear();
                    // Set before drawing so an invalidate during the pass
                    // survives it.
                    cache.state = SurfaceState::Valid;
                }
                tracing::trace!(?id, "full surface redraw");
                for child in win.tree().children(id).to_vec() {
                    win.draw(child, DrawPass::Full);
                }
            }
            Some(SurfaceState::Valid) => {
                // Entries queued while these draw wait for the next pass.
                let pending = win
                    .tree_mut()
                    .cache_mut(id)
                    .map(|cache| std::mem::take(&mut cache.next_frame))
                    .unwrap_or_default();
                let every_frame: Vec<ElementId> = win
                    .tree()
                    .cache(id)
                    .map(|cache| cache.every_frame.iter().copied().collect())
                    .unwrap_or_default();
                tracing::trace!(
                    ?id,
                    next_frame = pending.len(),
                    every_frame = every_frame.len(),
                    "incremental surface redraw"
                );

                for &entry in &pending {
                    win.draw(entry, DrawPass::Incremental);
                }
                for entry in every_frame {
                    if !pending.contains(&entry) {
                        win.draw(entry, DrawPass::Incremental);
                    }
                }
            }
            None => {}
        }

        let backend = win.backend_mut();
        backend.bind_framebuffer(saved_target);
        backend.set_viewport(saved_viewport);
    }

    /// Composite the cached texture into the currently bound target.
    pub fn blit(&self, win: &mut Window, id: ElementId) {
        let Some(cache) = win.tree().cache(id) else {
            return;
        };
        if cache.texture_size.is_none() {
            return;
        }
        let texture = cache.texture;
        let quad = cache.quad;
        let projection = win.projection_for(id);

        let Some(shader) = win.shader(TYPE_NAME, &SURFACE_SHADER) else {
            return;
        };
        let debug_layout = win.config().debug_layout;

        let backend = win.backend_mut();
        backend.use_shader(shader);
        backend.set_projection(&projection);
        backend.set_position(0.0, 0.0);
        backend.bind_texture(Some(texture));
        backend.set_blend(Some(BlendMode::PREMULTIPLIED));
        backend.draw_quad(&quad);
        backend.bind_texture(None);

        if debug_layout {
            let [tl, tr, bl, br] = quad.vertices;
            backend.set_color(DEBUG_OUTLINE);
            for (from, to) in outline(tl, tr, br, bl) {
                backend.draw_line(from, to);
            }
        }
    }

    /// Force a full redraw on the next pass.
    pub fn invalidate(&self, win: &mut Window, id: ElementId) {
        win.invalidate(id);
    }

    /// Whether the next pass has any work to do.
    pub fn is_dirty(&self, win: &Window, id: ElementId) -> bool {
        win.surface_is_dirty(id)
    }
}

fn cache_state(win: &Window, id: ElementId) -> Option<SurfaceState> {
    win.tree().cache(id).map(|cache| cache.state)
}

fn outline(tl: Point, tr: Point, br: Point, bl: Point) -> [(Point, Point); 4] {
    [(tl, tr), (tr, br), (br, bl), (bl, tl)]
}

impl Element for Surface {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn init(&mut self, win: &mut Window, id: ElementId) {
        let backend = win.backend_mut();
        let texture = backend.create_texture();
        let framebuffer = backend.create_framebuffer();
        win.tree_mut().set_cache(id, Some(SurfaceCache::new(texture, framebuffer)));
        tracing::debug!(?id, ?texture, ?framebuffer, "created surface");
    }

    fn draw(&mut self, win: &mut Window, id: ElementId, _pass: DrawPass) {
        self.draw_children(win, id);
        self.blit(win, id);
    }

    fn reflow(
        &mut self,
        win: &mut Window,
        id: ElementId,
        instigator: Option<ElementId>,
        direction: Direction,
    ) -> Reflow {
        match self.sup.reflow(win, id, instigator, direction) {
            Reflow::Changed => {}
            other => return other,
        }

        let Some(rect) = win.element(id).map(|data| data.rect) else {
            return Reflow::Unchanged;
        };
        let Some((width, height)) = rect.pixel_size() else {
            tracing::warn!(?id, w = rect.w, h = rect.h, "surface has no pixels, skipping allocation");
            return Reflow::Invalid;
        };
        let Some((texture, framebuffer)) =
            win.tree().cache(id).map(|cache| (cache.texture, cache.framebuffer))
        else {
            return Reflow::Invalid;
        };

        let backend = win.backend_mut();
        backend.allocate_texture(texture, width, height);
        backend.attach_color(framebuffer, texture);

        if let Some(cache) = win.tree_mut().cache_mut(id) {
            cache.projection =
                Mat4::orthographic(rect.x, rect.right(), rect.bottom(), rect.y, -1.0, 1.0);
            cache.quad.set_vertices(rect);
            cache.quad.set_tex_coords(FLIPPED_TEX_COORDS);
            cache.texture_size = Some((width, height));
        }
        tracing::debug!(?id, width, height, "reallocated surface texture");

        win.invalidate(id);
        Reflow::Changed
    }

    fn attached(&mut self, win: &mut Window, id: ElementId) {
        self.sup.attached(win, id);
        win.register_type(id, TYPE_NAME);
    }

    fn child_attached(&mut self, win: &mut Window, id: ElementId, child: ElementId) {
        base::adopt(win, Some(id), child);
    }

    fn fini(&mut self, win: &mut Window, id: ElementId) {
        win.release_surface(id);
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

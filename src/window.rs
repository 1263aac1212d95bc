//! Window: the top-level context owning the element tree and GPU state.
//!
//! [`Window`] owns the element arena, the render backend, the type registry
//! and the shared resource cache. Every element operation goes through it:
//! the window takes the element's behavior out of its slot, calls the
//! operation with itself as context, then puts the behavior back.
//!
//! A call that reaches an element whose behavior is already out (its own
//! handler is running further up the stack) runs the default behavior for
//! that element's kind instead: surface-tagged elements get [`Surface`],
//! everything else gets [`Base`].

use crate::dom::node::{ElementData, ElementId};
use crate::dom::tree::{AddPosition, Tree, TreeError};
use crate::element::{
    Base, Direction, DrawPass, Element, Reflow, Surface, SurfaceState, TypeRegistry,
};
use crate::event::{bubble_path, Event, EventResult};
use crate::geometry::{Mat4, Rect};
use crate::render::asset::Asset;
use crate::render::backend::{Backend, Color, ShaderId, ShaderSource, Viewport};
use crate::render::resource::{ResourceCache, TextureInfo};

// ---------------------------------------------------------------------------
// WindowConfig
// ---------------------------------------------------------------------------

/// Configuration for a window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    /// Optional window title.
    pub title: Option<String>,
    /// Width of the default target in pixels.
    pub width: u32,
    /// Height of the default target in pixels.
    pub height: u32,
    /// Color the default target is cleared to before each frame.
    pub clear_color: Color,
    /// Outline every composited surface.
    pub debug_layout: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: None,
            width: 640,
            height: 480,
            clear_color: Color::BLACK,
            debug_layout: false,
        }
    }
}

impl WindowConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title (builder).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the size (builder).
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the clear color (builder).
    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Enable the layout debug overlay (builder).
    pub fn with_debug_layout(mut self, enabled: bool) -> Self {
        self.debug_layout = enabled;
        self
    }
}

fn window_projection(width: u32, height: u32) -> Mat4 {
    Mat4::orthographic(0.0, width as f32, height as f32, 0.0, -1.0, 1.0)
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// The top-level context: element tree, backend, types and resources.
///
/// Dropping a window tears the tree down and releases every GPU object it
/// created.
pub struct Window {
    tree: Tree,
    backend: Box<dyn Backend>,
    types: TypeRegistry,
    resources: ResourceCache,
    config: WindowConfig,
    projection: Mat4,
}

impl Window {
    /// Create a window drawing through `backend`.
    pub fn new(config: WindowConfig, backend: impl Backend + 'static) -> Self {
        let projection = window_projection(config.width, config.height);
        tracing::debug!(
            title = config.title.as_deref().unwrap_or(""),
            width = config.width,
            height = config.height,
            "created window"
        );
        Self {
            tree: Tree::new(),
            backend: Box::new(backend),
            types: TypeRegistry::new(),
            resources: ResourceCache::new(),
            config,
            projection,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// The element tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// The root element, if any.
    pub fn root(&self) -> Option<ElementId> {
        self.tree.root()
    }

    /// Data of one element.
    pub fn element(&self, id: ElementId) -> Option<&ElementData> {
        self.tree.get(id)
    }

    /// Mutable data of one element.
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut ElementData> {
        self.tree.get_mut(id)
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn Backend {
        self.backend.as_mut()
    }

    /// Downcast the backend to its concrete type.
    pub fn backend_as<T: Backend + 'static>(&self) -> Option<&T> {
        self.backend.as_any().downcast_ref::<T>()
    }

    /// Mutable downcast of the backend.
    pub fn backend_as_mut<T: Backend + 'static>(&mut self) -> Option<&mut T> {
        self.backend.as_any_mut().downcast_mut::<T>()
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn resources(&self) -> &ResourceCache {
        &self.resources
    }

    /// Projection of the default target.
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Projection an element draws with: its owning surface's, or the
    /// window's when it has none.
    pub fn projection_for(&self, id: ElementId) -> Mat4 {
        self.tree
            .get(id)
            .and_then(|data| data.surface)
            .and_then(|surface| self.tree.cache(surface))
            .map_or(self.projection, |cache| *cache.projection())
    }

    /// Shared shader owned by the element type `owner`, compiled on first
    /// use. `None` if it failed to compile.
    pub fn shader(&mut self, owner: &'static str, source: &ShaderSource) -> Option<ShaderId> {
        self.resources.shader(self.backend.as_mut(), owner, source)
    }

    /// Shared texture owned by the element type `owner`, uploaded on first
    /// use. `None` if the asset failed to load.
    pub fn texture(
        &mut self,
        owner: &'static str,
        name: &'static str,
        asset: &Asset,
    ) -> Option<TextureInfo> {
        self.resources.texture(self.backend.as_mut(), owner, name, asset)
    }

    /// Register `id` under the type `name`, dropping its previous type.
    pub fn register_type(&mut self, id: ElementId, name: &'static str) {
        let Some(data) = self.tree.get_mut(id) else {
            return;
        };
        let type_id = self.types.type_ref(data.type_id, name);
        data.type_id = Some(type_id);
    }

    // ── Structure ────────────────────────────────────────────────────

    /// Install `behavior` as the root element and attach it, replacing
    /// (and tearing down) any previous root.
    pub fn insert_root(&mut self, data: ElementData, behavior: impl Element) -> ElementId {
        if let Some(old) = self.tree.root() {
            self.remove(old);
        }
        let id = self.tree.insert(data, Box::new(behavior));
        self.tree.set_root(id);
        self.dispatch(id, "init", |element, win| element.init(win, id));

        if let Some(data) = self.tree.get_mut(id) {
            data.surface = None;
        }
        self.attach(id);
        id
    }

    /// Append a child to `parent`, attaching it if the parent is attached.
    pub fn add_child(
        &mut self,
        parent: ElementId,
        data: ElementData,
        behavior: impl Element,
    ) -> Result<ElementId, TreeError> {
        self.add_child_at(parent, data, behavior, AddPosition::Tail)
    }

    /// Insert a child of `parent` at `position`.
    pub fn add_child_at(
        &mut self,
        parent: ElementId,
        data: ElementData,
        behavior: impl Element,
        position: AddPosition,
    ) -> Result<ElementId, TreeError> {
        let id = self.tree.insert_child(parent, data, Box::new(behavior), position)?;
        self.dispatch(id, "init", |element, win| element.init(win, id));

        if self.tree.get(parent).is_some_and(ElementData::is_attached) {
            self.child_attached(parent, id);
        }
        Ok(id)
    }

    /// Remove an element and its subtree.
    ///
    /// Every removed element is finalized (descendants first): surfaces
    /// release their texture and framebuffer, types are unregistered and a
    /// type's shared resources are released with its last instance. Queue
    /// entries held by surviving surfaces are purged and the owning surface
    /// is invalidated so no stale pixels remain.
    pub fn remove(&mut self, id: ElementId) {
        if !self.tree.contains(id) {
            return;
        }
        let owner = self.tree.get(id).and_then(|data| data.surface);
        let ancestors = self.tree.ancestors(id);
        let removed = self.tree.walk_post_order(id);

        for &element in &removed {
            self.dispatch(element, "fini", |behavior, win| behavior.fini(win, element));
            self.release_surface(element);
            if let Some(type_id) = self.tree.get(element).and_then(|data| data.type_id) {
                if let Some(name) = self.types.type_unref(type_id) {
                    self.resources.release_owner(self.backend.as_mut(), name);
                }
            }
        }

        self.tree.remove(id);
        tracing::debug!(?id, removed = removed.len(), "removed element");

        // Innermost surfaces first, so an emptied nested queue is seen by the
        // surfaces above it.
        for &ancestor in &ancestors {
            let Some(cache) = self.tree.cache_mut(ancestor) else {
                continue;
            };
            for &element in &removed {
                cache.purge(element);
            }
            let affected: Vec<ElementId> = cache
                .every_frame
                .iter()
                .copied()
                .filter(|entry| ancestors.contains(entry))
                .collect();
            let stale: Vec<ElementId> = affected
                .into_iter()
                .filter(|&entry| !self.tree.covers_every_frame(entry, ancestor))
                .collect();
            if let Some(cache) = self.tree.cache_mut(ancestor) {
                for entry in stale {
                    tracing::trace!(surface = ?ancestor, ?entry, "dropped every-frame entry");
                    cache.every_frame.shift_remove(&entry);
                }
            }
        }

        if let Some(owner) = owner {
            self.invalidate(owner);
        }
    }

    /// Remove the whole tree and release every shared resource.
    pub fn teardown(&mut self) {
        if let Some(root) = self.tree.root() {
            self.remove(root);
        }
        self.resources.release_all(self.backend.as_mut());
    }

    // ── Geometry ─────────────────────────────────────────────────────

    /// Move/resize an element and reflow it leafward.
    pub fn place(&mut self, id: ElementId, rect: Rect) -> Option<Reflow> {
        self.tree.get_mut(id)?.rect = rect;
        self.reflow(id, None, Direction::Leafward)
    }

    /// Resize the default target; the root is placed over all of it.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        self.projection = window_projection(width, height);
        tracing::debug!(width, height, "resized window");

        if let Some(root) = self.tree.root() {
            self.place(root, Rect::new(0.0, 0.0, width as f32, height as f32));
        }
    }

    // ── Drawing ──────────────────────────────────────────────────────

    /// Whether the next [`frame`](Self::frame) would draw anything.
    pub fn needs_frame(&self) -> bool {
        let Some(root) = self.tree.root() else {
            return false;
        };
        if self.tree.is_surface(root) {
            return self.surface_is_dirty(root);
        }
        self.tree.walk_depth_first(root).into_iter().any(|id| {
            self.tree
                .get(id)
                .is_some_and(|data| data.dirty || data.render_every_frame)
        })
    }

    /// Draw the tree into the default target if anything changed.
    ///
    /// Returns whether a frame was drawn.
    pub fn frame(&mut self) -> bool {
        if !self.needs_frame() {
            return false;
        }
        let Some(root) = self.tree.root() else {
            return false;
        };

        let (width, height) = (self.config.width, self.config.height);
        let clear_color = self.config.clear_color;
        let backend = self.backend.as_mut();
        backend.bind_framebuffer(None);
        backend.set_viewport(Viewport::new(0, 0, width, height));
        backend.set_scissor(false);
        backend.clear(clear_color);

        self.draw(root, DrawPass::Full);
        tracing::trace!("frame drawn");
        true
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Run `call` on the behavior of `id`, or on the default behavior when
    /// it is busy. `None` if the element does not exist.
    fn dispatch<R>(
        &mut self,
        id: ElementId,
        op: &'static str,
        call: impl FnOnce(&mut dyn Element, &mut Window) -> R,
    ) -> Option<R> {
        if !self.tree.contains(id) {
            return None;
        }
        match self.tree.take_behavior(id) {
            Some(mut behavior) => {
                let result = call(behavior.as_mut(), self);
                if self.tree.restore_behavior(id, behavior).is_some() {
                    tracing::trace!(?id, op, "element removed by its own handler");
                }
                Some(result)
            }
            None => {
                tracing::trace!(?id, op, "element busy, using default behavior");
                let mut fallback: Box<dyn Element> = if self.tree.is_surface(id) {
                    Box::new(Surface::new())
                } else {
                    Box::new(Base)
                };
                Some(call(fallback.as_mut(), self))
            }
        }
    }

    /// Draw an element. Its dirty flag is cleared first, so marks made
    /// while it draws carry over to the next frame.
    pub fn draw(&mut self, id: ElementId, pass: DrawPass) {
        let Some(data) = self.tree.get_mut(id) else {
            return;
        };
        data.dirty = false;
        self.dispatch(id, "draw", |element, win| element.draw(win, id, pass));
    }

    /// Reflow an element. `None` if it does not exist.
    pub fn reflow(
        &mut self,
        id: ElementId,
        instigator: Option<ElementId>,
        direction: Direction,
    ) -> Option<Reflow> {
        self.dispatch(id, "reflow", |element, win| {
            element.reflow(win, id, instigator, direction)
        })
    }

    /// Attach an element, then notify it of each of its children.
    pub fn attach(&mut self, id: ElementId) {
        if self.dispatch(id, "attached", |element, win| element.attached(win, id)).is_none() {
            return;
        }
        tracing::trace!(?id, "attached element");
        for child in self.tree.children(id).to_vec() {
            self.child_attached(id, child);
        }
    }

    /// Tell `parent` that `child` joined the live tree.
    pub fn child_attached(&mut self, parent: ElementId, child: ElementId) {
        self.dispatch(parent, "child_attached", |element, win| {
            element.child_attached(win, parent, child)
        });
    }

    /// Flag an element for redraw.
    pub fn mark_dirty(&mut self, id: ElementId) {
        self.dispatch(id, "mark_dirty", |element, win| element.mark_dirty(win, id));
    }

    /// Offer an event to one element.
    pub fn deliver_event(&mut self, id: ElementId, event: &Event) -> EventResult {
        self.dispatch(id, "on_event", |element, win| element.on_event(win, id, event))
            .unwrap_or_default()
    }

    /// Offer an event to `id`, then to each ancestor, until one consumes it.
    pub fn bubble_event(&mut self, id: ElementId, event: &Event) -> EventResult {
        for target in bubble_path(&self.tree, id) {
            if self.deliver_event(target, event).is_consumed() {
                tracing::trace!(?target, kind = event.kind(), "event consumed");
                return EventResult::Consumed;
            }
        }
        EventResult::Ignored
    }

    // ── Surfaces ─────────────────────────────────────────────────────

    /// Force a full redraw of a surface and mark it dirty.
    pub fn invalidate(&mut self, id: ElementId) {
        if let Some(cache) = self.tree.cache_mut(id) {
            cache.state = SurfaceState::Invalid;
        }
        self.mark_dirty(id);
    }

    /// Whether a surface has redraw work pending. `false` for elements that
    /// are not surfaces.
    pub fn surface_is_dirty(&self, id: ElementId) -> bool {
        self.tree.cache(id).is_some_and(|cache| cache.is_dirty())
    }

    /// The surface state of `id`, `None` if it is not a surface.
    pub fn surface_state(&self, id: ElementId) -> Option<SurfaceState> {
        self.tree.cache(id).map(|cache| cache.state())
    }

    /// Release the texture and framebuffer of a surface. Does nothing if
    /// they were already released.
    pub fn release_surface(&mut self, id: ElementId) {
        if let Some(cache) = self.tree.set_cache(id, None) {
            self.backend.delete_framebuffer(cache.framebuffer());
            self.backend.delete_texture(cache.texture());
            tracing::debug!(?id, "released surface");
        }
    }

    // ── Typed access ─────────────────────────────────────────────────

    /// Checked downcast of an element's behavior.
    pub fn behavior_as<T: Element>(&self, id: ElementId) -> Result<&T, TreeError> {
        self.tree.behavior_as::<T>(id)
    }

    /// Run `f` with the behavior of `id` downcast to `T` and the window.
    pub fn with_element<T: Element, R>(
        &mut self,
        id: ElementId,
        f: impl FnOnce(&mut T, &mut Window) -> R,
    ) -> Result<R, TreeError> {
        if !self.tree.contains(id) {
            return Err(TreeError::NotFound(id));
        }
        let mut behavior = self.tree.take_behavior(id).ok_or(TreeError::Busy(id))?;
        let found = behavior.type_name();
        let result = match behavior.as_any_mut().downcast_mut::<T>() {
            Some(element) => Ok(f(element, self)),
            None => Err(TreeError::TypeMismatch {
                id,
                expected: std::any::type_name::<T>(),
                found,
            }),
        };
        if self.tree.restore_behavior(id, behavior).is_some() {
            tracing::trace!(?id, "element removed while borrowed");
        }
        result
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("config", &self.config)
            .field("tree", &self.tree)
            .field("types", &self.types.len())
            .field("resources", &self.resources.len())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

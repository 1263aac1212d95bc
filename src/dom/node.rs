//! Node types: ElementId, ElementData, ElementState.

use slotmap::new_key_type;

use crate::element::types::ElementTypeId;
use crate::geometry::Rect;

new_key_type! {
    /// Unique identifier for an element. Copy, lightweight (u64), and
    /// generational: an id outlives its element without aliasing a new one.
    pub struct ElementId;
}

/// Lifecycle state of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementState {
    /// Created but not yet part of a live, window-rooted tree.
    #[default]
    Unattached,
    /// Part of a live tree; has a registered type and an owning surface
    /// resolved (if any ancestor owns a cache).
    Attached,
}

/// Data associated with a single element, independent of its behavior.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Geometry in window pixels.
    pub rect: Rect,
    /// Set by `mark_dirty`, cleared once the element has been drawn.
    pub dirty: bool,
    /// Lifecycle state.
    pub state: ElementState,
    /// Nearest ancestor that owns a cache. Assigned on attach.
    pub surface: Option<ElementId>,
    /// Whether this element needs redrawing on every frame.
    pub render_every_frame: bool,
    /// Whether this element repaints its whole rect, so it can be redrawn
    /// in isolation on top of stale cached pixels.
    pub clearable: bool,
    /// Window-scoped type registration, assigned on attach.
    pub type_id: Option<ElementTypeId>,
    /// Optional debug label.
    pub label: Option<String>,
    /// Rect seen by the last reflow; `None` until the first one.
    pub(crate) last_reflow: Option<Rect>,
}

impl Default for ElementData {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementData {
    /// Create unattached element data with an empty rect.
    pub fn new() -> Self {
        Self {
            rect: Rect::EMPTY,
            dirty: false,
            state: ElementState::Unattached,
            surface: None,
            render_every_frame: false,
            clearable: false,
            type_id: None,
            label: None,
            last_reflow: None,
        }
    }

    /// Set the initial rect (builder).
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Set the initial size, keeping the origin (builder).
    pub fn with_size(mut self, w: f32, h: f32) -> Self {
        self.rect.w = w;
        self.rect.h = h;
        self
    }

    /// Request continuous redraw (builder).
    pub fn every_frame(mut self, every_frame: bool) -> Self {
        self.render_every_frame = every_frame;
        self
    }

    /// Declare that the element repaints its whole rect (builder).
    pub fn clearable(mut self, clearable: bool) -> Self {
        self.clearable = clearable;
        self
    }

    /// Attach a debug label (builder).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether the element is part of a live tree.
    pub fn is_attached(&self) -> bool {
        self.state == ElementState::Attached
    }
}

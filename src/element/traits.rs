//! Element trait: the overridable operations every widget shares.
//!
//! A widget extends a base implementation by holding it as a `sup` field and
//! overriding only the operations it cares about. An override decides per
//! call whether to run `self.sup.<op>()` before, after, instead of, or
//! interleaved with its own logic. Operations it does not override fall
//! through to the provided methods, which run the root defaults in
//! [`super::base`].
//!
//! All operations take the [`Window`] and the element's own id. While an
//! operation runs, its behavior is out of the tree slot, so the rest of the
//! tree can be borrowed mutably through the window.

use std::any::Any;

use super::base;
use crate::dom::node::ElementId;
use crate::event::{Event, EventResult};
use crate::window::Window;

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

/// How much of an element a draw call repaints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawPass {
    /// The target was cleared; draw everything.
    Full,
    /// Redraw over the target's existing pixels.
    Incremental,
}

/// Which way a reflow is travelling through the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From a child toward the root.
    Rootward,
    /// From a parent toward the leaves.
    Leafward,
}

/// Outcome of a geometry recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Reflow {
    /// Width or height is not positive; skip dependent GPU work.
    Invalid = -1,
    /// Geometry is the same as at the last reflow.
    Unchanged = 0,
    /// Geometry changed.
    Changed = 1,
}

impl Reflow {
    /// Whether geometry changed.
    pub fn is_changed(self) -> bool {
        self == Reflow::Changed
    }
}

// ---------------------------------------------------------------------------
// Element trait
// ---------------------------------------------------------------------------

/// Core trait implemented by every element behavior.
///
/// Object-safe; the window stores behaviors as `Box<dyn Element>`.
pub trait Element: Any {
    /// The type name this behavior registers under (e.g. `"gilt.surface"`).
    fn type_name(&self) -> &'static str;

    /// Called once after the element is inserted into the tree, before it
    /// is attached. Surfaces allocate their GPU objects here.
    fn init(&mut self, win: &mut Window, id: ElementId) {
        let _ = (win, id);
    }

    /// Render own visuals, then children.
    fn draw(&mut self, win: &mut Window, id: ElementId, pass: DrawPass) {
        base::draw(win, id, pass);
    }

    /// Recalculate geometry-dependent state after the rect changed.
    fn reflow(
        &mut self,
        win: &mut Window,
        id: ElementId,
        instigator: Option<ElementId>,
        direction: Direction,
    ) -> Reflow {
        base::reflow(win, id, instigator, direction)
    }

    /// The element joined a live tree.
    fn attached(&mut self, win: &mut Window, id: ElementId) {
        base::attached(win, id);
    }

    /// Flag the element for redraw.
    fn mark_dirty(&mut self, win: &mut Window, id: ElementId) {
        base::mark_dirty(win, id);
    }

    /// A child of this element joined a live tree.
    fn child_attached(&mut self, win: &mut Window, id: ElementId, child: ElementId) {
        base::child_attached(win, id, child);
    }

    /// Handle an event.
    fn on_event(&mut self, win: &mut Window, id: ElementId, event: &Event) -> EventResult {
        base::on_event(win, id, event)
    }

    /// Release resources before the element leaves the tree.
    fn fini(&mut self, win: &mut Window, id: ElementId) {
        let _ = (win, id);
    }

    /// Downcast to `&dyn Any` for runtime type inspection.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to `&mut dyn Any` for mutable runtime type inspection.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl std::fmt::Debug for dyn Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Element").field(&self.type_name()).finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

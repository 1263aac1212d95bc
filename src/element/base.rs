//! Root default behavior shared by every element.
//!
//! The provided methods of [`Element`] call these functions, and the window
//! falls back to them when an element's own behavior is busy.

use std::any::Any;

use super::traits::{Direction, DrawPass, Element, Reflow};
use crate::dom::node::{ElementId, ElementState};
use crate::event::{Event, EventResult};
use crate::window::Window;

/// Type name of the root behavior.
pub const TYPE_NAME: &str = "gilt.element";

/// The root behavior: a plain element with no visuals of its own.
///
/// Widgets capture it as `sup` and defer to it for whatever they do not
/// override.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base;

impl Element for Base {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Draw every child in document order.
pub fn draw(win: &mut Window, id: ElementId, pass: DrawPass) {
    for child in win.tree().children(id).to_vec() {
        win.draw(child, pass);
    }
}

/// Record the new rect and schedule the repaint it needs.
///
/// Returns `Unchanged` when the rect is the one seen by the previous reflow.
/// Otherwise the owning surface is invalidated (the old rect may have left
/// pixels behind), the element is marked dirty and the reflow continues in
/// `direction`. A rect without area still propagates but reports `Invalid`.
pub fn reflow(
    win: &mut Window,
    id: ElementId,
    instigator: Option<ElementId>,
    direction: Direction,
) -> Reflow {
    let Some(data) = win.element_mut(id) else {
        return Reflow::Unchanged;
    };
    let rect = data.rect;
    if data.last_reflow == Some(rect) {
        return Reflow::Unchanged;
    }
    data.last_reflow = Some(rect);
    let surface = data.surface;

    if let Some(surface) = surface {
        win.invalidate(surface);
    }
    win.mark_dirty(id);

    match direction {
        Direction::Leafward => {
            for child in win.tree().children(id).to_vec() {
                win.reflow(child, Some(id), Direction::Leafward);
            }
        }
        Direction::Rootward => {
            if let Some(parent) = win.tree().parent(id) {
                if Some(parent) != instigator {
                    win.reflow(parent, Some(id), Direction::Rootward);
                }
            }
        }
    }

    if !rect.has_area() {
        tracing::warn!(?id, w = rect.w, h = rect.h, "reflowed to an empty rect");
        return Reflow::Invalid;
    }
    Reflow::Changed
}

/// Mark the element attached, register its type and schedule its first
/// paint.
pub fn attached(win: &mut Window, id: ElementId) {
    let Some(data) = win.element_mut(id) else {
        return;
    };
    data.state = ElementState::Attached;
    win.register_type(id, TYPE_NAME);
    win.mark_dirty(id);
}

/// Set the dirty flag and queue the element's redraw entry on its owning
/// surface, then mark that surface dirty in turn.
pub fn mark_dirty(win: &mut Window, id: ElementId) {
    let Some(data) = win.element_mut(id) else {
        return;
    };
    data.dirty = true;
    let Some(surface) = data.surface else {
        return;
    };

    let entry = win.tree().nearest_clearable(id, surface);
    if let Some(cache) = win.tree_mut().cache_mut(surface) {
        cache.next_frame.insert(entry);
    }
    win.mark_dirty(surface);
}

/// Hand the child the parent's owning surface and attach it.
pub fn child_attached(win: &mut Window, id: ElementId, child: ElementId) {
    let surface = win.element(id).and_then(|data| data.surface);
    adopt(win, surface, child);
}

/// Unhandled events are ignored.
pub fn on_event(_win: &mut Window, _id: ElementId, _event: &Event) -> EventResult {
    EventResult::Ignored
}

/// Attach `child` under the owning surface `surface`, queueing it for
/// continuous redraw if it asks for that.
pub(crate) fn adopt(win: &mut Window, surface: Option<ElementId>, child: ElementId) {
    let Some(data) = win.element_mut(child) else {
        return;
    };
    data.surface = surface;
    let every_frame = data.render_every_frame;

    win.attach(child);

    if let (true, Some(surface)) = (every_frame, surface) {
        let entry = win.tree().nearest_clearable(child, surface);
        enqueue_every_frame(win, surface, entry);
    }
}

/// Add `entry` to the every-frame queue of `surface`.
///
/// The first entry a surface gains makes the surface itself a
/// continuous-redraw element of its own owning surface.
pub(crate) fn enqueue_every_frame(win: &mut Window, surface: ElementId, entry: ElementId) {
    let Some(cache) = win.tree_mut().cache_mut(surface) else {
        return;
    };
    let was_empty = cache.every_frame.is_empty();
    if !cache.every_frame.insert(entry) {
        return;
    }
    tracing::trace!(?surface, ?entry, "queued for every frame");

    if was_empty {
        let parent = win.element(surface).and_then(|data| data.surface);
        if let Some(parent) = parent {
            let entry = win.tree().nearest_clearable(surface, parent);
            enqueue_every_frame(win, parent, entry);
        }
    }
}

//! Probe: an instrumented element for observing dispatch.
//!
//! A probe appends a [`DrawRecord`] to a shared log every time it is drawn,
//! and can run an action from inside its draw to exercise re-entrant
//! mutations (re-dirtying itself, invalidating its surface, ...).

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::node::ElementId;
use crate::element::{base, DrawPass, Element};
use crate::window::Window;

/// One observed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRecord {
    pub label: &'static str,
    pub pass: DrawPass,
}

/// Shared draw log.
pub type DrawLog = Rc<RefCell<Vec<DrawRecord>>>;

/// Create an empty draw log.
pub fn draw_log() -> DrawLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Labels drawn since the log was last drained, in order.
pub fn drain_labels(log: &DrawLog) -> Vec<&'static str> {
    log.borrow_mut().drain(..).map(|record| record.label).collect()
}

/// Action a probe runs from inside its draw.
pub type DrawAction = fn(&mut Window, ElementId);

/// An element that logs its draws and then draws its children.
#[derive(Debug)]
pub struct Probe {
    label: &'static str,
    log: DrawLog,
    on_draw: Option<DrawAction>,
}

impl Probe {
    /// A probe writing to `log` under `label`.
    pub fn new(label: &'static str, log: &DrawLog) -> Self {
        Self { label, log: Rc::clone(log), on_draw: None }
    }

    /// Run `action` every time the probe is drawn (builder).
    pub fn on_draw(mut self, action: DrawAction) -> Self {
        self.on_draw = Some(action);
        self
    }
}

impl Element for Probe {
    fn type_name(&self) -> &'static str {
        "gilt.probe"
    }

    fn draw(&mut self, win: &mut Window, id: ElementId, pass: DrawPass) {
        self.log.borrow_mut().push(DrawRecord { label: self.label, pass });
        if let Some(action) = self.on_draw {
            action(win, id);
        }
        base::draw(win, id, pass);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

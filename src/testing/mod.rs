//! Headless testing tools: Pilot, recording backend, probes.
//!
//! Use the [`Pilot`] to drive a [`Window`](crate::window::Window) without a
//! GPU. The [`RecordingBackend`] records every backend call so tests can
//! assert on the exact commands a frame issued, and [`Probe`] elements log
//! their draws.

pub mod pilot;
pub mod probe;
pub mod recorder;

pub use pilot::Pilot;
pub use probe::{draw_log, drain_labels, DrawAction, DrawLog, DrawRecord, Probe};
pub use recorder::{Command, RecordingBackend};

//! # gilt-surface
//!
//! A retained-mode widget core that renders element trees through cached GPU
//! surfaces with damage tracking.
//!
//! Elements form a tree owned by a [`window::Window`]. Some elements are
//! *surfaces*: they render their subtree into an offscreen texture and
//! composite it into their owner's target. A dirty element only costs a
//! redraw of itself (or its nearest clearable ancestor) inside its surface,
//! and the cached textures of every other surface are reused as-is.
//!
//! ## Core Systems
//!
//! - **[`dom`]**: Slotmap-backed element arena with tree operations
//! - **[`element`]**: Element trait, dispatch defaults, surfaces, value elements, type registry
//! - **[`event`]**: Event payloads and rootward bubbling
//! - **[`layout`]**: Taffy-powered layout feeding rects to reflow
//! - **[`render`]**: Backend primitives, assets, per-type shared resources
//! - **[`widgets`]**: Built-in widgets: Container, Knob, Canvas
//! - **[`window`]**: The window: tree ownership, dispatch, frames, teardown
//! - **[`testing`]**: Headless pilot and recording backend
//! - **[`geometry`]**: Point, Rect, Mat4, Quad primitives

// Foundation
pub mod geometry;

// Core systems
pub mod dom;
pub mod element;
pub mod layout;

// Widgets
pub mod widgets;

// Events
pub mod event;

// Rendering
pub mod render;

// Window
pub mod window;

// Headless tooling
pub mod testing;

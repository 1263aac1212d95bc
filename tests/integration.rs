//! Integration tests for gilt-surface.
//!
//! These tests exercise the public API from outside the crate, verifying that
//! the window, surfaces, widgets, layout and the testing tools work together.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use gilt_surface::dom::{ElementData, ElementId};
use gilt_surface::element::{Direction, DrawPass, Element, Reflow, Surface, SurfaceState};
use gilt_surface::event::{Event, EventResult, Key, Modifiers, MouseButton, Origin};
use gilt_surface::geometry::Rect;
use gilt_surface::layout::LayoutEngine;
use gilt_surface::render::Color;
use gilt_surface::testing::{draw_log, drain_labels, Command, Pilot, Probe};
use gilt_surface::widgets::{knob, Canvas, Container, Knob};
use gilt_surface::window::{Window, WindowConfig};
use pretty_assertions::assert_eq;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Command names without payloads, one per line.
fn command_names(commands: &[Command]) -> String {
    commands
        .iter()
        .map(|c| {
            let debug = format!("{c:?}");
            debug
                .split(|ch: char| !ch.is_alphanumeric())
                .next()
                .unwrap_or_default()
                .to_owned()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Meter: a surface subclass observing value changes
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Meter {
    sup: Surface,
    seen: Rc<RefCell<Vec<(Origin, f32)>>>,
}

impl Element for Meter {
    fn type_name(&self) -> &'static str {
        "test.meter"
    }

    fn init(&mut self, win: &mut Window, id: ElementId) {
        self.sup.init(win, id);
    }

    fn draw(&mut self, win: &mut Window, id: ElementId, pass: DrawPass) {
        self.sup.draw(win, id, pass);
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
    }

    fn child_attached(&mut self, win: &mut Window, id: ElementId, child: ElementId) {
        self.sup.child_attached(win, id, child);
    }

    fn on_event(&mut self, win: &mut Window, id: ElementId, event: &Event) -> EventResult {
        match event {
            Event::ValueChange(change) => {
                self.seen.borrow_mut().push((change.origin, change.value));
                EventResult::Consumed
            }
            _ => self.sup.on_event(win, id, event),
        }
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

// ---------------------------------------------------------------------------
// Damage tracking
// ---------------------------------------------------------------------------

#[test]
fn incremental_frame_redraws_only_dirty_element() {
    init_tracing();
    let mut pilot = Pilot::new(100, 100);
    let root = pilot.mount(Surface::new());
    let panel = pilot
        .window_mut()
        .add_child(
            root,
            ElementData::new().clearable(true),
            Container::new().with_background(Color::WHITE),
        )
        .unwrap();
    pilot.window_mut().place(panel, Rect::new(10.0, 10.0, 40.0, 40.0));
    assert!(pilot.frame());

    pilot.window_mut().mark_dirty(panel);
    let commands = pilot.tick();
    insta::assert_snapshot!(command_names(&commands), @r"
    BindFramebuffer
    SetViewport
    SetScissor
    Clear
    BindFramebuffer
    SetViewport
    UseShader
    SetProjection
    SetPosition
    SetColor
    SetBlend
    DrawQuad
    BindFramebuffer
    SetViewport
    UseShader
    SetProjection
    SetPosition
    BindTexture
    SetBlend
    DrawQuad
    BindTexture
    ");
}

#[test]
fn clean_window_draws_nothing() {
    let mut pilot = Pilot::new(64, 64);
    let root = pilot.mount(Surface::new());
    pilot
        .window_mut()
        .add_child(root, ElementData::new(), Container::new())
        .unwrap();
    assert!(pilot.frame());
    assert!(!pilot.window().needs_frame());
    assert_eq!(pilot.tick(), Vec::<Command>::new());
}

#[test]
fn every_frame_element_redraws_through_nested_surfaces() {
    let log = draw_log();
    let mut pilot = Pilot::new(100, 100);
    let root = pilot.mount(Surface::new());
    let inner = pilot
        .window_mut()
        .add_child(root, ElementData::new(), Surface::new())
        .unwrap();
    pilot.window_mut().place(inner, Rect::new(0.0, 0.0, 50.0, 50.0));
    pilot
        .window_mut()
        .add_child(inner, ElementData::new().every_frame(true), Probe::new("meter", &log))
        .unwrap();

    for _ in 0..3 {
        assert!(pilot.frame());
        assert_eq!(drain_labels(&log), vec!["meter"]);
    }
    assert!(pilot.window().needs_frame());
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

#[test]
fn knob_drag_reports_genuine_changes() {
    init_tracing();
    let mut pilot = Pilot::new(100, 100);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let root = pilot.mount(Meter { sup: Surface::new(), seen: Rc::clone(&seen) });
    let dial = pilot
        .window_mut()
        .add_child(root, ElementData::new(), Knob::new().with_range(0.0, 10.0).with_origin(5.0))
        .unwrap();

    assert_eq!(seen.borrow().as_slice(), &[(Origin::Synthetic, 5.0)]);
    seen.borrow_mut().clear();

    assert_eq!(pilot.drag(dial, MouseButton::Button1, 0.0, -20.0), EventResult::Consumed);
    let (origin, value) = seen.borrow()[0];
    assert_eq!(origin, Origin::Genuine);
    assert!((value - 6.0).abs() < 1e-4);
}

#[test]
fn knob_turn_redraws_without_clearing_surface() {
    let mut pilot = Pilot::new(100, 100);
    let root = pilot.mount(Surface::new());
    let dial = pilot
        .window_mut()
        .add_child(root, ElementData::new(), Knob::new())
        .unwrap();
    pilot.frame();

    pilot.focus(dial);
    assert_eq!(pilot.press_key_with(Key::Up, Modifiers::SHIFT), EventResult::Consumed);
    let commands = pilot.tick();

    let turned = knob::MIN_DEGREES + 0.01 * (knob::MAX_DEGREES - knob::MIN_DEGREES);
    let expected = gilt_surface::geometry::Mat4::rotation_z(turned);
    assert!(commands.contains(&Command::SetModelview(expected)));
    assert!(!commands.contains(&Command::Clear(Color::TRANSPARENT)));
    assert_eq!(pilot.window().surface_state(root), Some(SurfaceState::Valid));
}

#[test]
fn canvas_pan_forces_full_redraw() {
    let mut pilot = Pilot::new(100, 100);
    let canvas = pilot.mount(Canvas::new());
    let dial = pilot
        .window_mut()
        .add_child(canvas, ElementData::new(), Knob::new())
        .unwrap();
    pilot.frame();

    // Knobs swallow their own button-2 drags.
    assert_eq!(pilot.drag(dial, MouseButton::Button2, 10.0, 5.0), EventResult::Consumed);
    assert_eq!(pilot.window().surface_state(canvas), Some(SurfaceState::Valid));

    assert_eq!(pilot.drag(canvas, MouseButton::Button2, 10.0, 5.0), EventResult::Consumed);
    assert_eq!(pilot.window().surface_state(canvas), Some(SurfaceState::Invalid));
    assert_eq!(pilot.window().element(dial).unwrap().rect, Rect::new(10.0, 5.0, 30.0, 30.0));

    let commands = pilot.tick();
    assert!(commands.contains(&Command::Clear(Color::TRANSPARENT)));
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[test]
fn layout_feeds_reflow() {
    use taffy::prelude::{length, FlexDirection, Size, Style};

    let mut pilot = Pilot::new(200, 100);
    let root = pilot.mount(Surface::new());
    let top = pilot
        .window_mut()
        .add_child(root, ElementData::new(), Surface::new())
        .unwrap();

    let mut engine = LayoutEngine::new();
    engine.set_style(
        root,
        Style {
            flex_direction: FlexDirection::Column,
            size: Size { width: length(200.0), height: length(100.0) },
            ..Default::default()
        },
    );
    engine.set_style(
        top,
        Style { size: Size { width: length(200.0), height: length(30.0) }, ..Default::default() },
    );
    engine.apply(pilot.window_mut()).unwrap();

    let texture = pilot.window().tree().cache(top).unwrap().texture();
    assert_eq!(pilot.recorder().texture_size(texture), Some((200, 30)));
    assert!(pilot.frame());
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

#[test]
fn teardown_releases_every_gpu_object() {
    let mut pilot = Pilot::with_config(WindowConfig::default().with_size(100, 100));
    let canvas = pilot.mount(Canvas::new());
    let inner = pilot
        .window_mut()
        .add_child(canvas, ElementData::new(), Surface::new())
        .unwrap();
    pilot.window_mut().place(inner, Rect::new(0.0, 0.0, 40.0, 40.0));
    pilot
        .window_mut()
        .add_child(inner, ElementData::new(), Knob::new())
        .unwrap();
    pilot.frame();
    assert!(pilot.recorder().live_textures() > 0);

    pilot.window_mut().teardown();
    let recorder = pilot.recorder();
    assert_eq!(recorder.live_textures(), 0);
    assert_eq!(recorder.live_framebuffers(), 0);
    assert_eq!(recorder.live_shaders(), 0);
    assert!(pilot.window().root().is_none());
}

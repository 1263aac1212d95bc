//! Render primitives: the narrow GPU interface the element tree draws through.
//!
//! [`Backend`] is implemented by the platform layer (a GL context, a wgpu
//! device wrapper, ...) and by [`crate::testing::RecordingBackend`] for
//! headless runs. Every call operates on whatever render target is currently
//! bound, mirroring an immediate-mode graphics context.

use std::any::Any;
use std::fmt;

use crate::geometry::{Mat4, Point, Quad};

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Opaque texture handle issued by a [`Backend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Opaque framebuffer handle issued by a [`Backend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub u32);

/// Opaque compiled shader program handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub u32);

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Straight RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
    /// Opaque black.
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    /// Opaque white.
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    /// Create a color from components.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// The same color with its components multiplied by alpha.
    pub fn premultiplied(self) -> Self {
        Self { r: self.r * self.a, g: self.g * self.a, b: self.b * self.a, a: self.a }
    }

    /// Build a color from a packed `0xRRGGBB` value and an alpha.
    pub fn rgb(hex: u32, alpha: f32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
            a: alpha,
        }
    }
}

// ---------------------------------------------------------------------------
// Viewport / BlendMode
// ---------------------------------------------------------------------------

/// A viewport rectangle in integer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Create a viewport anchored at `(x, y)`.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Source/destination blend factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// A blend equation `src * src_factor + dst * dst_factor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendMode {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendMode {
    /// Premultiplied-style compositing: `(ONE, ONE_MINUS_SRC_ALPHA)`.
    ///
    /// Surface caches hold premultiplied pixels, so compositing a cache that
    /// itself contains a composited cache gives the same result as drawing
    /// the inner one straight into the destination.
    pub const PREMULTIPLIED: BlendMode = BlendMode {
        src: BlendFactor::One,
        dst: BlendFactor::OneMinusSrcAlpha,
    };

    /// Straight-alpha blending: `(SRC_ALPHA, ONE_MINUS_SRC_ALPHA)`.
    pub const STRAIGHT: BlendMode = BlendMode {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
    };

    /// Blend one premultiplied RGBA pixel over another.
    pub fn apply(self, src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
        let factor = |f: BlendFactor| match f {
            BlendFactor::One => 1.0,
            BlendFactor::SrcAlpha => src[3],
            BlendFactor::OneMinusSrcAlpha => 1.0 - src[3],
        };
        let (s, d) = (factor(self.src), factor(self.dst));
        [
            src[0] * s + dst[0] * d,
            src[1] * s + dst[1] * d,
            src[2] * s + dst[2] * d,
            src[3] * s + dst[3] * d,
        ]
    }
}

// ---------------------------------------------------------------------------
// Shader sources
// ---------------------------------------------------------------------------

/// Shader program source handed to [`Backend::compile_shader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource {
    /// Name used in logs and errors.
    pub name: &'static str,
    pub vertex: &'static str,
    pub fragment: &'static str,
}

/// Errors reported by a [`Backend`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("shader {name} failed to compile: {message}")]
    ShaderCompile { name: String, message: String },
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Immediate-mode render primitives against the currently bound target.
///
/// Object creation (`create_*`, `allocate_texture`) is assumed to succeed; a
/// failure there is a broken graphics context, not a recoverable condition.
pub trait Backend {
    // ── Object lifecycle ─────────────────────────────────────────────

    /// Create an empty texture object.
    fn create_texture(&mut self) -> TextureId;

    /// (Re)allocate storage for `texture` as `width x height` RGBA8 with
    /// nearest filtering. Previous contents are discarded.
    fn allocate_texture(&mut self, texture: TextureId, width: u32, height: u32);

    /// Upload RGBA8 pixels into `texture`, replacing its storage.
    fn upload_texture(&mut self, texture: TextureId, width: u32, height: u32, pixels: &[u8]);

    /// Release a texture.
    fn delete_texture(&mut self, texture: TextureId);

    /// Create a framebuffer object.
    fn create_framebuffer(&mut self) -> FramebufferId;

    /// Attach `texture` as the color attachment of `framebuffer`.
    fn attach_color(&mut self, framebuffer: FramebufferId, texture: TextureId);

    /// Release a framebuffer.
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    /// Compile and link a shader program.
    fn compile_shader(&mut self, source: &ShaderSource) -> Result<ShaderId, BackendError>;

    /// Release a shader program.
    fn delete_shader(&mut self, shader: ShaderId);

    // ── Target state ─────────────────────────────────────────────────

    /// The bound framebuffer, `None` for the window's default target.
    fn bound_framebuffer(&self) -> Option<FramebufferId>;

    /// Bind a framebuffer, `None` for the window's default target.
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    /// The current viewport.
    fn viewport(&self) -> Viewport;

    /// Set the viewport.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Enable or disable the scissor test.
    fn set_scissor(&mut self, enabled: bool);

    /// Clear the bound target.
    fn clear(&mut self, color: Color);

    /// Enable blending with `mode`, or disable it with `None`.
    fn set_blend(&mut self, mode: Option<BlendMode>);

    // ── Drawing ──────────────────────────────────────────────────────

    /// Make `shader` current.
    fn use_shader(&mut self, shader: ShaderId);

    /// Set the projection uniform of the current shader.
    fn set_projection(&mut self, projection: &Mat4);

    /// Set the modelview uniform of the current shader.
    fn set_modelview(&mut self, modelview: &Mat4);

    /// Set the translation applied to subsequent geometry.
    fn set_position(&mut self, x: f32, y: f32);

    /// Set the flat color of subsequent geometry.
    fn set_color(&mut self, color: Color);

    /// Bind `texture` to unit 0, or unbind with `None`.
    fn bind_texture(&mut self, texture: Option<TextureId>);

    /// Draw a quad as a triangle strip.
    fn draw_quad(&mut self, quad: &Quad);

    /// Draw a single line segment.
    fn draw_line(&mut self, from: Point, to: Point);

    /// Downcast support for inspecting a concrete backend.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl fmt::Debug for dyn Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("bound_framebuffer", &self.bound_framebuffer())
            .field("viewport", &self.viewport())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 4], b: [f32; 4]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    fn premultiply(c: [f32; 4]) -> [f32; 4] {
        [c[0] * c[3], c[1] * c[3], c[2] * c[3], c[3]]
    }

    #[test]
    fn rgb_unpacks_channels() {
        let c = Color::rgb(0x404F3C, 0.6);
        assert!((c.r - 0x40 as f32 / 255.0).abs() < 1e-6);
        assert!((c.g - 0x4F as f32 / 255.0).abs() < 1e-6);
        assert!((c.b - 0x3C as f32 / 255.0).abs() < 1e-6);
        assert_eq!(c.a, 0.6);
    }

    #[test]
    fn premultiplied_color_scales_by_alpha() {
        let c = Color::new(1.0, 0.5, 0.0, 0.5).premultiplied();
        assert_eq!(c, Color::new(0.5, 0.25, 0.0, 0.5));
    }

    #[test]
    fn premultiplied_opaque_source_replaces() {
        let out = BlendMode::PREMULTIPLIED.apply([1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]);
        assert!(close(out, [1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn premultiplied_compositing_is_associative() {
        // B composited into A's cache, then the cache into D, must match
        // compositing A then B directly into D.
        let d = [0.2, 0.3, 0.4, 1.0];
        let a = premultiply([0.9, 0.1, 0.1, 0.5]);
        let b = premultiply([0.1, 0.8, 0.2, 0.25]);

        let cleared = [0.0, 0.0, 0.0, 0.0];
        let cache = BlendMode::PREMULTIPLIED.apply(b, BlendMode::PREMULTIPLIED.apply(a, cleared));
        let nested = BlendMode::PREMULTIPLIED.apply(cache, d);

        let direct = BlendMode::PREMULTIPLIED.apply(b, BlendMode::PREMULTIPLIED.apply(a, d));
        assert!(close(nested, direct));
    }

    #[test]
    fn straight_alpha_compositing_is_not_associative() {
        let d = [0.2, 0.3, 0.4, 1.0];
        let a = [0.9, 0.1, 0.1, 0.5];
        let b = [0.1, 0.8, 0.2, 0.25];

        let cleared = [0.0, 0.0, 0.0, 0.0];
        let cache = BlendMode::STRAIGHT.apply(b, BlendMode::STRAIGHT.apply(a, cleared));
        let nested = BlendMode::STRAIGHT.apply(cache, d);

        let direct = BlendMode::STRAIGHT.apply(b, BlendMode::STRAIGHT.apply(a, d));
        assert!(!close(nested, direct));
    }

    #[test]
    fn backend_error_message() {
        let err = BackendError::ShaderCompile {
            name: "surface".into(),
            message: "syntax error".into(),
        };
        assert_eq!(err.to_string(), "shader surface failed to compile: syntax error");
    }
}

//! Core geometry types: Point, Rect, Mat4, Quad.
//!
//! Element rects live in window pixel space with a top-left origin. [`Mat4`]
//! carries the orthographic projections surfaces render their subtree with,
//! and [`Quad`] is the four-vertex strip a surface composites its cache through.

use std::ops::{Add, Neg, Sub};

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A 2D position or displacement in pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// The origin.
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Neg for Point {
    type Output = Point;
    #[inline]
    fn neg(self) -> Point {
        Point { x: -self.x, y: -self.y }
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle defined by position and size.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    /// An empty rect at the origin.
    pub const EMPTY: Rect = Rect { x: 0.0, y: 0.0, w: 0.0, h: 0.0 };

    /// Create a new rect.
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// The right edge: `x + w`.
    #[inline]
    pub fn right(self) -> f32 {
        self.x + self.w
    }

    /// The bottom edge: `y + h`.
    #[inline]
    pub fn bottom(self) -> f32 {
        self.y + self.h
    }

    /// Whether both dimensions are strictly positive.
    #[inline]
    pub fn has_area(self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }

    /// Whether the point lies inside this rect (right/bottom exclusive).
    #[inline]
    pub fn contains(self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// The rect moved by `by`.
    #[inline]
    pub fn translate(self, by: Point) -> Rect {
        Rect { x: self.x + by.x, y: self.y + by.y, ..self }
    }

    /// Pixel dimensions, rounded to nearest like `lrintf`.
    ///
    /// Returns `None` when either dimension rounds to zero or below.
    pub fn pixel_size(self) -> Option<(u32, u32)> {
        let w = self.w.round();
        let h = self.h.round();
        if w < 1.0 || h < 1.0 {
            return None;
        }
        Some((w as u32, h as u32))
    }

    /// The four corners as (top-left, top-right, bottom-right, bottom-left).
    pub fn corners(self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Mat4
// ---------------------------------------------------------------------------

/// Column-major 4x4 matrix, laid out the way shader uniforms expect.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mat4(pub [f32; 16]);

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Mat4 = Mat4([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    /// Orthographic projection mapping `left..right`, `bottom..top`,
    /// `near..far` onto normalized device coordinates.
    ///
    /// Passing `bottom = y + h` and `top = y` gives a top-left origin.
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut m = Mat4::IDENTITY.0;
        m[0] = 2.0 / (right - left);
        m[5] = 2.0 / (top - bottom);
        m[10] = -2.0 / (far - near);
        m[12] = -(right + left) / (right - left);
        m[13] = -(top + bottom) / (top - bottom);
        m[14] = -(far + near) / (far - near);
        Mat4(m)
    }

    /// Rotation of `degrees` around the z axis.
    pub fn rotation_z(degrees: f32) -> Mat4 {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let mut m = Mat4::IDENTITY.0;
        m[0] = cos;
        m[1] = sin;
        m[4] = -sin;
        m[5] = cos;
        Mat4(m)
    }

    /// Transform a point (z = 0, w = 1) and return its x/y.
    pub fn transform(&self, p: Point) -> Point {
        let m = &self.0;
        Point {
            x: m[0] * p.x + m[4] * p.y + m[12],
            y: m[1] * p.x + m[5] * p.y + m[13],
        }
    }
}

// ---------------------------------------------------------------------------
// Quad
// ---------------------------------------------------------------------------

/// Texture coordinates mapping a full texture with the v axis flipped, so a
/// framebuffer rendered bottom-up lands upright on screen.
pub const FLIPPED_TEX_COORDS: Rect = Rect { x: 0.0, y: 1.0, w: 1.0, h: -1.0 };

/// A textured quad: four vertex positions and matching texture coordinates,
/// ordered for a triangle strip (top-left, top-right, bottom-left, bottom-right).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Quad {
    pub vertices: [Point; 4],
    pub tex_coords: [Point; 4],
}

impl Quad {
    /// Set the vertex positions to cover `rect`.
    pub fn set_vertices(&mut self, rect: Rect) {
        self.vertices = strip_order(rect);
    }

    /// Set texture coordinates from a rect in texture space. Negative extents
    /// flip the corresponding axis.
    pub fn set_tex_coords(&mut self, coords: Rect) {
        self.tex_coords = strip_order(coords);
    }

    /// Axis-aligned bounds of the vertex positions.
    pub fn bounds(&self) -> Rect {
        let [tl, _, _, br] = self.vertices;
        Rect::new(tl.x, tl.y, br.x - tl.x, br.y - tl.y)
    }
}

fn strip_order(r: Rect) -> [Point; 4] {
    [
        Point::new(r.x, r.y),
        Point::new(r.x + r.w, r.y),
        Point::new(r.x, r.y + r.h),
        Point::new(r.x + r.w, r.y + r.h),
    ]
}

// ===========================================================================
// Tests
// ===========================================================================

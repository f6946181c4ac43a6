//! Planar (local ENU) geometry primitives.
//!
//! All positions are metres in a flat east/north frame and all angles are
//! radians measured counter-clockwise from east.  `f64` is used throughout:
//! lane projections accumulate arc length over kilometres of road and the
//! trajectory predictor differences nearby points.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

// ── Vec2 ──────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `heading`.
    #[inline]
    pub fn from_heading(heading: f64) -> Self {
        Self { x: heading.cos(), y: heading.sin() }
    }

    #[inline]
    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z-component of the 3-D cross product.  Positive when `other` lies to
    /// the left of `self`.
    #[inline]
    pub fn cross(self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[inline]
    pub fn distance(self, other: Vec2) -> f64 {
        (other - self).length()
    }

    /// Unit vector, or `None` for a (near) zero vector.
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.length();
        (len > f64::EPSILON).then(|| Vec2::new(self.x / len, self.y / len))
    }

    /// Rotate by +90° (the "left" normal of a direction vector).
    #[inline]
    pub fn perp(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    #[inline]
    pub fn heading(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn rotated(self, angle: f64) -> Vec2 {
        let (s, c) = angle.sin_cos();
        Vec2::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    #[inline]
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl std::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

// ── Angles ────────────────────────────────────────────────────────────────────

/// Wrap an angle into `(-π, π]`.
pub fn wrap_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}

// ── Polygon ───────────────────────────────────────────────────────────────────

/// Closed convex footprint of an element, counter-clockwise vertex order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
}

impl Polygon {
    /// Rectangle of `length` × `width` centred on `center`, long axis along
    /// `heading`.
    pub fn oriented_box(center: Vec2, heading: f64, length: f64, width: f64) -> Self {
        let fwd  = Vec2::from_heading(heading) * (0.5 * length);
        let left = Vec2::from_heading(heading).perp() * (0.5 * width);
        Self {
            vertices: vec![
                center + fwd - left,
                center + fwd + left,
                center - fwd + left,
                center - fwd - left,
            ],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Projection interval `(min, max)` of the vertices onto `axis`
    /// (relative to `origin`).  `None` for an empty polygon.
    pub fn project_onto(&self, origin: Vec2, axis: Vec2) -> Option<(f64, f64)> {
        self.vertices.iter().fold(None, |acc, &v| {
            let d = (v - origin).dot(axis);
            Some(match acc {
                None => (d, d),
                Some((lo, hi)) => (lo.min(d), hi.max(d)),
            })
        })
    }

    /// Vertex mean.  Equal to the geometric center for boxes.
    pub fn centroid(&self) -> Option<Vec2> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum = self.vertices.iter().fold(Vec2::ZERO, |acc, &v| acc + v);
        Some(sum * (1.0 / self.vertices.len() as f64))
    }
}

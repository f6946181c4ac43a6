//! Arc-length parameterized polyline.
//!
//! Every lane, lane link and predicted trajectory path is a `Curve`.  The
//! cumulative arc length at each vertex is stored alongside the vertex so
//! that `s → (x, y)` is a binary search plus one interpolation.

use tf_core::Vec2;

use crate::{SpatialError, SpatialResult};

/// Minimum spacing between stored vertices; closer points are merged.
const MIN_VERTEX_SPACING: f64 = 1e-6;

#[derive(Clone, Debug)]
pub struct Curve {
    points: Vec<Vec2>,
    /// `cum_s[i]` = arc length from `points[0]` to `points[i]`.
    cum_s:  Vec<f64>,
}

/// Result of projecting a point onto a curve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Projection {
    /// Arc length of the foot point, clamped to `[0, length]`.
    pub s:      f64,
    /// Signed lateral distance, left of the travel direction positive.
    pub l:      f64,
    /// `false` when the foot of the perpendicular falls before the start or
    /// past the end of the curve.
    pub inside: bool,
}

impl Curve {
    /// Build from a vertex list.  Consecutive duplicates are dropped; at
    /// least two distinct vertices must remain.
    pub fn new(points: Vec<Vec2>) -> SpatialResult<Self> {
        let raw_len = points.len();
        let mut kept: Vec<Vec2> = Vec::with_capacity(raw_len);
        for p in points {
            if kept.last().is_none_or(|&last| last.distance(p) > MIN_VERTEX_SPACING) {
                kept.push(p);
            }
        }
        if kept.len() < 2 {
            return Err(SpatialError::DegenerateCurve(raw_len));
        }

        let mut cum_s = Vec::with_capacity(kept.len());
        let mut acc = 0.0;
        cum_s.push(0.0);
        for w in kept.windows(2) {
            acc += w[0].distance(w[1]);
            cum_s.push(acc);
        }
        Ok(Self { points: kept, cum_s })
    }

    /// Straight segment from `start` along `heading`.
    pub fn straight(start: Vec2, heading: f64, length: f64) -> SpatialResult<Self> {
        Self::new(vec![start, start + Vec2::from_heading(heading) * length])
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.cum_s.last().copied().unwrap_or(0.0)
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn start(&self) -> Vec2 {
        self.points[0]
    }

    pub fn end(&self) -> Vec2 {
        self.points[self.points.len() - 1]
    }

    /// Index `i` of the segment `points[i] → points[i+1]` containing `s`.
    fn segment_at(&self, s: f64) -> usize {
        let last_seg = self.points.len() - 2;
        // First vertex with cum_s > s, minus one.
        let i = self.cum_s.partition_point(|&c| c <= s);
        i.saturating_sub(1).min(last_seg)
    }

    /// Position at arc length `s` (clamped to the curve).
    pub fn point_at(&self, s: f64) -> Vec2 {
        let s = s.clamp(0.0, self.length());
        let i = self.segment_at(s);
        let (a, b) = (self.points[i], self.points[i + 1]);
        let seg = self.cum_s[i + 1] - self.cum_s[i];
        let t = if seg > 0.0 { (s - self.cum_s[i]) / seg } else { 0.0 };
        a + (b - a) * t
    }

    /// Tangent heading at arc length `s`.
    pub fn heading_at(&self, s: f64) -> f64 {
        let i = self.segment_at(s.clamp(0.0, self.length()));
        (self.points[i + 1] - self.points[i]).heading()
    }

    /// Position `offset` metres to the left of the curve at `s`, and the
    /// tangent heading there.
    pub fn pose_at(&self, s: f64, offset: f64) -> (Vec2, f64) {
        let heading = self.heading_at(s);
        let base = self.point_at(s);
        (base + Vec2::from_heading(heading).perp() * offset, heading)
    }

    /// Project `p` onto the curve (xy → sl).
    pub fn project(&self, p: Vec2) -> Projection {
        let last_seg = self.points.len() - 2;
        let mut best: Option<(f64, usize, f64, f64)> = None; // (dist², seg, t_clamped, t_raw)

        for i in 0..=last_seg {
            let (a, b) = (self.points[i], self.points[i + 1]);
            let ab = b - a;
            let len2 = ab.dot(ab);
            let t_raw = if len2 > 0.0 { (p - a).dot(ab) / len2 } else { 0.0 };
            let t = t_raw.clamp(0.0, 1.0);
            let foot = a + ab * t;
            let d2 = (p - foot).dot(p - foot);
            if best.is_none_or(|(bd, ..)| d2 < bd) {
                best = Some((d2, i, t, t_raw));
            }
        }

        // `points.len() >= 2` is a construction invariant, so `best` is set.
        let (_, i, t, t_raw) = best.unwrap_or((0.0, 0, 0.0, 0.0));
        let (a, b) = (self.points[i], self.points[i + 1]);
        let ab = b - a;
        let seg = self.cum_s[i + 1] - self.cum_s[i];
        let s = self.cum_s[i] + t * seg;
        let dir = ab.normalized().unwrap_or(Vec2::new(1.0, 0.0));
        let l = dir.cross(p - a);
        let inside = !((i == 0 && t_raw < 0.0) || (i == last_seg && t_raw > 1.0));
        Projection { s, l, inside }
    }
}

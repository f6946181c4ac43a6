//! Centripetal Catmull-Rom spline (α = 0.5).
//!
//! Knot spacing is `|P[i+1] − P[i]|^α`, which keeps the curve free of cusps
//! and self-intersections for unevenly spaced control points.  The two
//! end segments use phantom points mirrored through the first and last
//! control points.  The spline is evaluated with the Barry–Goldman pyramid
//! and resampled densely into a [`Curve`].

use tf_core::Vec2;
use tf_spatial::Curve;

const ALPHA: f64 = 0.5;
/// Target spacing of the resampled polyline.
const RESAMPLE_STEP: f64 = 0.5;
const MIN_KNOT_GAP: f64 = 1e-9;

fn knot_gap(a: Vec2, b: Vec2) -> f64 {
    a.distance(b).powf(ALPHA).max(MIN_KNOT_GAP)
}

fn lerp(a: Vec2, b: Vec2, ta: f64, tb: f64, u: f64) -> Vec2 {
    let span = tb - ta;
    a * ((tb - u) / span) + b * ((u - ta) / span)
}

/// Point at parameter `u ∈ [t1, t2]` of the segment `p1 → p2`.
fn eval(p: [Vec2; 4], t: [f64; 4], u: f64) -> Vec2 {
    let a1 = lerp(p[0], p[1], t[0], t[1], u);
    let a2 = lerp(p[1], p[2], t[1], t[2], u);
    let a3 = lerp(p[2], p[3], t[2], t[3], u);
    let b1 = lerp(a1, a2, t[0], t[2], u);
    let b2 = lerp(a2, a3, t[1], t[3], u);
    lerp(b1, b2, t[1], t[2], u)
}

/// Fit through `points` and resample.  `None` with fewer than two
/// distinct points.
pub fn fit_centripetal(points: &[Vec2]) -> Option<Curve> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len();
    let first = points[0] * 2.0 - points[1];
    let last = points[n - 1] * 2.0 - points[n - 2];
    let padded: Vec<Vec2> = std::iter::once(first)
        .chain(points.iter().copied())
        .chain(std::iter::once(last))
        .collect();

    let mut out = Vec::with_capacity(n * 8);
    out.push(points[0]);
    for w in padded.windows(4) {
        let p = [w[0], w[1], w[2], w[3]];
        let t0 = 0.0;
        let t1 = t0 + knot_gap(p[0], p[1]);
        let t2 = t1 + knot_gap(p[1], p[2]);
        let t3 = t2 + knot_gap(p[2], p[3]);
        let t = [t0, t1, t2, t3];

        let steps = ((p[1].distance(p[2]) / RESAMPLE_STEP).ceil() as usize).max(1);
        for k in 1..steps {
            let u = t1 + (t2 - t1) * (k as f64 / steps as f64);
            out.push(eval(p, t, u));
        }
        // Segment ends are the control points themselves.
        out.push(p[2]);
    }
    Curve::new(out).ok()
}

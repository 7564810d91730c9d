//! Discrete rays.
//!
//! A ray runs between two points on the bounding circle. The endpoints are
//! snapped to the pixel grid by truncation, and the pixels in between are
//! produced by an N-dimensional DDA: the axis with the largest extent
//! advances one pixel per step, the others follow the ideal line rounded to
//! the nearest pixel (ties to even).

/// Pixel `[row, col]` of the point at `angle` (radians) on the circle of
/// `radius` centred at `(radius, radius)`.
///
/// The conversion truncates toward zero rather than rounding, which pulls
/// endpoints toward the origin-ward pixel.
pub fn circle_point(radius: usize, angle: f64) -> [i64; 2] {
    let r = radius as f64;
    let col = (r * (angle.cos() + 1.0)) as i64;
    let row = (r * (angle.sin() + 1.0)) as i64;
    [row, col]
}

/// All grid cells on the segment `start..=stop`, in order from `start`.
pub fn line_nd<const N: usize>(start: [i64; N], stop: [i64; N]) -> Vec<[i64; N]> {
    let mut out = Vec::new();
    line_nd_into(&mut out, start, stop);
    out
}

/// As [`line_nd`], but writes into `out` (which is cleared first) so that
/// one buffer can be reused across many rays.
pub fn line_nd_into<const N: usize>(out: &mut Vec<[i64; N]>, start: [i64; N], stop: [i64; N]) {
    out.clear();
    let mut delta = [0_i64; N];
    for axis in 0..N {
        delta[axis] = stop[axis] - start[axis];
    }
    let steps = delta.iter().map(|d| d.abs()).max().unwrap_or(0);
    if steps == 0 {
        out.push(start);
        return;
    }
    out.reserve(steps as usize + 1);
    for i in 0..=steps {
        let mut point = [0_i64; N];
        for axis in 0..N {
            // Round the absolute position, not the offset from `start`:
            // ties to even are not invariant under odd translations.
            point[axis] = div_round_half_even(start[axis] * steps + i * delta[axis], steps);
        }
        out.push(point);
    }
}

/// `num / den` rounded to the nearest integer, ties to even. `den > 0`.
///
/// Exact integer arithmetic keeps the rasterization symmetric: walking a
/// segment backwards lands on the same rational positions, so it visits
/// exactly the same cells.
fn div_round_half_even(num: i64, den: i64) -> i64 {
    debug_assert!(den > 0);
    let q = num.div_euclid(den);
    let twice_rem = 2 * num.rem_euclid(den);
    match twice_rem.cmp(&den) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => q + q.rem_euclid(2),
    }
}

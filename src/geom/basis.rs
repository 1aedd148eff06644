//! Basis-function evaluation for the parametric surface sources.
//!
//! Pure, stateless numerics: Bernstein polynomials (Bezier tensor-product
//! surfaces), Cox-de Boor basis functions with knot-span search (B-spline
//! global interpolation), knot-vector construction by parameter averaging,
//! and chord-length/centripetal parametrization of data points.

use super::core::Point3;

/// Errors raised by basis-function evaluation.
#[derive(Debug, thiserror::Error)]
pub enum BasisError {
    #[error("degree and point count must be non-zero")]
    InvalidKnotInput,
    #[error("degenerate knot interval at basis index {index}")]
    DegenerateKnotInterval { index: usize },
    #[error("input points are coincident; chord parametrization is degenerate")]
    DegenerateChord,
}

// ─────────────────────────────────────────────────────────────────────────────
// Bernstein basis (Bezier)
// ─────────────────────────────────────────────────────────────────────────────

fn factorial(n: usize) -> f64 {
    let mut fac = 1.0;
    for i in 2..=n {
        fac *= i as f64;
    }
    fac
}

/// Binomial coefficients `C(count - 1, i)` for a control grid axis with
/// `count` points, computed via factorial ratios.
#[must_use]
pub fn binomial_coefficients(count: usize) -> Vec<f64> {
    let degree = count - 1;
    (0..count)
        .map(|i| factorial(degree) / (factorial(i) * factorial(degree - i)))
        .collect()
}

/// Bernstein basis value `C(d, i) * u^i * (1-u)^(d-i)` with the convention
/// `0^0 = 1`, so the `i = 0` and `i = d` edge cases reduce to monomials.
#[must_use]
pub fn bernstein(coefficient: f64, degree: usize, index: usize, u: f64) -> f64 {
    coefficient * u.powi(index as i32) * (1.0 - u).powi((degree - index) as i32)
}

// ─────────────────────────────────────────────────────────────────────────────
// Cox-de Boor basis (B-spline)
// ─────────────────────────────────────────────────────────────────────────────

/// Knot span index for parameter `u`: linear scan from `degree + 1` while
/// `knots[span] <= u`, bounded by the control point count.
#[must_use]
pub fn find_span_linear(degree: usize, knots: &[f64], num_control_points: usize, u: f64) -> usize {
    let mut span = degree + 1;
    while span < num_control_points && knots[span] <= u {
        span += 1;
    }
    span - 1
}

/// The `degree + 1` non-vanishing basis function values at `u` for the given
/// span, via the Cox-de Boor two-term recurrence. Only a local window of the
/// knot vector is accessed.
///
/// A vanishing `right + left` denominator means the knot interval is
/// degenerate (insufficiently distinct parameters) and is reported as an
/// error instead of dividing by zero.
pub fn basis_functions(
    degree: usize,
    knots: &[f64],
    span: usize,
    u: f64,
) -> Result<Vec<f64>, BasisError> {
    let mut values = vec![1.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];

    for j in 1..=degree {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let denominator = right[r + 1] + left[j - r];
            if denominator == 0.0 {
                return Err(BasisError::DegenerateKnotInterval { index: r });
            }
            let temp = values[r] / denominator;
            values[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        values[j] = saved;
    }

    Ok(values)
}

/// Clamped knot vector of length `num_points + degree + 1`: the first and
/// last `degree + 1` entries are 0.0 and 1.0, interior knots come from the
/// averaging method (NURBS book Eqn 9.8).
pub fn averaged_knot_vector(
    degree: usize,
    num_points: usize,
    params: &[f64],
) -> Result<Vec<f64>, BasisError> {
    if degree == 0 || num_points == 0 {
        return Err(BasisError::InvalidKnotInput);
    }

    let mut knots = Vec::with_capacity(num_points + degree + 1);
    knots.extend(std::iter::repeat_n(0.0, degree + 1));

    for i in 0..num_points.saturating_sub(degree + 1) {
        let sum: f64 = params[i + 1..i + degree + 1].iter().sum();
        knots.push(sum / degree as f64);
    }

    knots.extend(std::iter::repeat_n(1.0, degree + 1));
    Ok(knots)
}

// ─────────────────────────────────────────────────────────────────────────────
// Parametrization
// ─────────────────────────────────────────────────────────────────────────────

/// Chord-length (or centripetal, using the square root of each chord length)
/// parametrization of an ordered point run. The result starts at 0.0, ends at
/// 1.0 and is monotonically non-decreasing in between.
pub fn chord_length_params(points: &[Point3], centripetal: bool) -> Result<Vec<f64>, BasisError> {
    let mut chord_lengths = Vec::with_capacity(points.len().saturating_sub(1));
    let mut total_length = 0.0;
    for pair in points.windows(2) {
        let distance = pair[1].distance_to(pair[0]);
        let chord = if centripetal { distance.sqrt() } else { distance };
        chord_lengths.push(chord);
        total_length += chord;
    }

    if total_length <= 0.0 {
        return Err(BasisError::DegenerateChord);
    }

    let mut params = Vec::with_capacity(points.len());
    params.push(0.0);

    let mut accumulated = 0.0;
    for chord in &chord_lengths[..chord_lengths.len() - 1] {
        accumulated += chord;
        params.push(accumulated / total_length);
    }

    params.push(1.0);
    Ok(params)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

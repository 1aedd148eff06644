//! Global NURBS surface interpolation source.
//!
//! Fits a B-spline surface through a grid of input points (global
//! interpolation, two dense solves) and samples it over a calculated
//! parametric domain, optionally wrapping around one axis into a closed,
//! cylinder-like surface. The wrapped domain end is found either in closed
//! form or by an iterative seam search that stops just before the meeting
//! edges would overlap.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::basis::{
    BasisError, averaged_knot_vector, basis_functions, chord_length_params, find_span_linear,
};
use super::core::{Point3, Vec3};
use super::linalg::{
    LinalgError, SquareMatrix, backward_substitution, forward_substitution, lu_decompose,
};
use super::mesh::{SurfaceMesh, WrapAround, quad_grid, triangulate_grid};

/// Errors raised by the NURBS surface source.
#[derive(Debug, thiserror::Error)]
pub enum NurbsError {
    #[error("interpolation degrees {u}x{v} are invalid, both need to be at least 2")]
    InvalidDegrees { u: usize, v: usize },
    #[error("input resolution {u}x{v} is smaller than the interpolation degrees")]
    InvalidResolution { u: usize, v: usize },
    #[error("wrap-around overlap (degree + 1) exceeds the input resolution along the wrapped axis")]
    OverlapExceedsResolution,
    #[error("delta {delta} is too small, the minimum is 0.001")]
    DeltaTooSmall { delta: f64 },
    #[error("expansion factor {factor} is outside [0, 0.5]")]
    InvalidExpansionFactor { factor: f64 },
    #[error("input grid needs {expected} points, got {provided}")]
    PointCountMismatch { expected: usize, provided: usize },
    #[error(transparent)]
    Basis(#[from] BasisError),
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration of a NURBS surface build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NurbsConfig {
    /// Size of the input point grid (u x v).
    pub input_resolution: [usize; 2],
    /// Interpolation degrees per direction, at least 2 each.
    pub interpolation_degrees: [usize; 2],
    /// Sampling step controlling output density: the number of samples per
    /// grid cell is `floor(1/delta + 0.5)`. The smaller the delta, the
    /// smoother the sampled surface.
    pub delta: f64,
    /// Use centripetal instead of chord-length parametrization.
    pub use_centripetal: bool,
    /// Fraction by which the surface overreaches the edge control points.
    pub expansion_factor: f64,
    /// Stitch two opposite parametric edges into a closed surface.
    pub wrap_around: WrapAround,
    /// Find the wrapped-around domain end iteratively instead of using the
    /// closed-form estimate.
    pub iterative_parameter_space: bool,
    /// Generate a quad mesh instead of a triangle mesh.
    pub generate_quad_mesh: bool,
}

impl Default for NurbsConfig {
    fn default() -> Self {
        Self {
            input_resolution: [4, 4],
            interpolation_degrees: [3, 3],
            delta: 0.1,
            use_centripetal: false,
            expansion_factor: 0.0,
            wrap_around: WrapAround::NoWrap,
            iterative_parameter_space: true,
            generate_quad_mesh: false,
        }
    }
}

impl NurbsConfig {
    #[must_use]
    pub fn with_resolution(mut self, u: usize, v: usize) -> Self {
        self.input_resolution = [u, v];
        self
    }

    #[must_use]
    pub fn with_degrees(mut self, u: usize, v: usize) -> Self {
        self.interpolation_degrees = [u, v];
        self
    }

    #[must_use]
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    #[must_use]
    pub fn with_wrap(mut self, wrap: WrapAround) -> Self {
        self.wrap_around = wrap;
        self
    }

    #[must_use]
    pub fn with_expansion(mut self, factor: f64) -> Self {
        self.expansion_factor = factor;
        self
    }
}

/// Diagnostics of a NURBS surface build.
#[derive(Debug, Clone, Default)]
pub struct NurbsDiagnostics {
    /// Number of interpolated control points.
    pub control_point_count: usize,
    /// Sample counts of the evaluated grid (u x v).
    pub sample_size: [usize; 2],
    /// Evaluated parametric domain `[min_u, max_u, min_v, max_v]`.
    pub evaluated_domain: [f64; 4],
    /// Evaluation passes spent in the iterative seam search.
    pub seam_iterations: usize,
    /// Non-fatal degradations (for example a seam-search fallback).
    pub warnings: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// NurbsSurfaceSource
// ─────────────────────────────────────────────────────────────────────────────

/// NURBS surface source: global interpolation of a point grid followed by
/// sampling over the evaluated parametric domain.
#[derive(Debug, Clone)]
pub struct NurbsSurfaceSource {
    config: NurbsConfig,
}

impl NurbsSurfaceSource {
    pub fn new(config: NurbsConfig) -> Result<Self, NurbsError> {
        let [res_u, res_v] = config.input_resolution;
        let [deg_u, deg_v] = config.interpolation_degrees;

        if deg_u < 2 || deg_v < 2 {
            return Err(NurbsError::InvalidDegrees { u: deg_u, v: deg_v });
        }
        if res_u < deg_u || res_v < deg_v {
            return Err(NurbsError::InvalidResolution { u: res_u, v: res_v });
        }
        if config.delta < 0.001 {
            return Err(NurbsError::DeltaTooSmall {
                delta: config.delta,
            });
        }
        if !(0.0..=0.5).contains(&config.expansion_factor) {
            return Err(NurbsError::InvalidExpansionFactor {
                factor: config.expansion_factor,
            });
        }
        match config.wrap_around {
            WrapAround::AlongU if deg_u + 1 > res_u => {
                return Err(NurbsError::OverlapExceedsResolution);
            }
            WrapAround::AlongV if deg_v + 1 > res_v => {
                return Err(NurbsError::OverlapExceedsResolution);
            }
            _ => {}
        }

        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &NurbsConfig {
        &self.config
    }

    /// Build the surface from an input point grid logically indexed by
    /// `(u, v)` over the configured input resolution (row-major, `u` outer).
    pub fn compute(
        &self,
        input_points: &[Point3],
    ) -> Result<(SurfaceMesh, NurbsDiagnostics), NurbsError> {
        let [res_u, res_v] = self.config.input_resolution;
        let expected = res_u * res_v;
        if input_points.len() != expected {
            return Err(NurbsError::PointCountMismatch {
                expected,
                provided: input_points.len(),
            });
        }

        let [grid_u, grid_v] = self.interpolating_grid_resolution();
        let [deg_u, deg_v] = self.config.interpolation_degrees;

        let (uk_params, vl_params) = self.compute_params_surface(input_points)?;
        let u_knots = averaged_knot_vector(deg_u, grid_u, &uk_params)?;
        let v_knots = averaged_knot_vector(deg_v, grid_v, &vl_params)?;

        // Global interpolation along the u direction: one solve per padded
        // point column, a single decomposition serving them all.
        let coeff_u = build_coeff_matrix(deg_u, &u_knots, &uk_params)?;
        let (l_u, u_u) = lu_decompose(&coeff_u)?;
        let mut control_points_r = Vec::with_capacity(grid_u * grid_v);
        for v in 0..grid_v {
            let column: Vec<Point3> = (0..grid_u)
                .map(|u| input_points[self.point_index_uv(u, v)])
                .collect();
            solve_into(&l_u, &u_u, &column, &mut control_points_r);
        }

        // Global interpolation along the v direction, consuming the first
        // pass's control points row by row.
        let coeff_v = build_coeff_matrix(deg_v, &v_knots, &vl_params)?;
        let (l_v, u_v) = lu_decompose(&coeff_v)?;
        let mut control_points = Vec::with_capacity(grid_u * grid_v);
        for u in 0..grid_u {
            let row: Vec<Point3> = (0..grid_v)
                .map(|v| control_points_r[v * grid_u + u])
                .collect();
            solve_into(&l_v, &u_v, &row, &mut control_points);
        }

        // Determine the evaluated parameter space.
        let mut warnings = Vec::new();
        let mut seam_iterations = 0;
        let domain = if self.config.iterative_parameter_space
            && self.config.wrap_around != WrapAround::NoWrap
        {
            match self.seam_search(&u_knots, &v_knots, &control_points)? {
                SeamSearch::Converged { domain, iterations } => {
                    seam_iterations = iterations;
                    domain
                }
                SeamSearch::Exhausted { iterations } => {
                    seam_iterations = iterations;
                    log::warn!(
                        "iterative seam search did not converge, falling back to the closed-form domain"
                    );
                    warnings.push(
                        "seam search did not converge; closed-form domain used".to_string(),
                    );
                    self.evaluated_parameter_space()
                }
            }
        } else {
            self.evaluated_parameter_space()
        };

        // Construct the surface.
        let sample_size = self.sample_size(domain);
        let positions = self.evaluate_surface(domain, &u_knots, &v_knots, &control_points)?;
        let cells = if self.config.generate_quad_mesh {
            quad_grid(sample_size[0], sample_size[1], self.config.wrap_around)
        } else {
            triangulate_grid(sample_size[0], sample_size[1], self.config.wrap_around)
        };

        let mesh = SurfaceMesh {
            positions,
            cells,
            uvs: None,
        };
        let diagnostics = NurbsDiagnostics {
            control_point_count: control_points.len(),
            sample_size,
            evaluated_domain: domain,
            seam_iterations,
            warnings,
        };
        Ok((mesh, diagnostics))
    }

    // ── wrap-around bookkeeping ──────────────────────────────────────────

    /// Number of extra input points borrowed cyclically from the opposite
    /// edge along each axis before interpolation.
    #[must_use]
    pub fn interpolating_overlap(&self) -> [usize; 2] {
        let [deg_u, deg_v] = self.config.interpolation_degrees;
        match self.config.wrap_around {
            WrapAround::NoWrap => [0, 0],
            WrapAround::AlongU => [deg_u + 1, 0],
            WrapAround::AlongV => [0, deg_v + 1],
        }
    }

    /// Input resolution padded by the wrap overlap on both sides.
    #[must_use]
    pub fn interpolating_grid_resolution(&self) -> [usize; 2] {
        let [res_u, res_v] = self.config.input_resolution;
        let [overlap_u, overlap_v] = self.interpolating_overlap();
        [res_u + 2 * overlap_u, res_v + 2 * overlap_v]
    }

    /// Input point index for padded grid coordinates, wrapping the overlap
    /// region modulo the input resolution.
    fn point_index_uv(&self, padded_u: usize, padded_v: usize) -> usize {
        let [res_u, res_v] = self.config.input_resolution;
        let [overlap_u, overlap_v] = self.interpolating_overlap();

        let mut u = padded_u as isize - overlap_u as isize;
        let mut v = padded_v as isize - overlap_v as isize;
        if u < 0 {
            u += res_u as isize;
        } else if u >= res_u as isize {
            u -= res_u as isize;
        }
        if v < 0 {
            v += res_v as isize;
        } else if v >= res_v as isize {
            v -= res_v as isize;
        }

        u as usize * res_v + v as usize
    }

    // ── parametrization ──────────────────────────────────────────────────

    /// Global parameter arrays: per-column (and per-row) chord-length
    /// parametrization averaged across the orthogonal direction.
    fn compute_params_surface(
        &self,
        input_points: &[Point3],
    ) -> Result<(Vec<f64>, Vec<f64>), NurbsError> {
        let [grid_u, grid_v] = self.interpolating_grid_resolution();
        let centripetal = self.config.use_centripetal;

        let mut uk_columns = Vec::with_capacity(grid_u * grid_v);
        for v in 0..grid_v {
            let column: Vec<Point3> = (0..grid_u)
                .map(|u| input_points[self.point_index_uv(u, v)])
                .collect();
            uk_columns.extend(chord_length_params(&column, centripetal)?);
        }
        let uk = average_params(&uk_columns, grid_u, grid_v);

        let mut vl_rows = Vec::with_capacity(grid_u * grid_v);
        for u in 0..grid_u {
            let row: Vec<Point3> = (0..grid_v)
                .map(|v| input_points[self.point_index_uv(u, v)])
                .collect();
            vl_rows.extend(chord_length_params(&row, centripetal)?);
        }
        let vl = average_params(&vl_rows, grid_v, grid_u);

        Ok((uk, vl))
    }

    // ── evaluated parameter space ────────────────────────────────────────

    const fn samples_per_grid_cell(&self) -> usize {
        (1.0 / self.config.delta + 0.5) as usize
    }

    /// Closed-form evaluated domain `[min_u, max_u, min_v, max_v]`: expanded
    /// by the expansion factor when open; trimmed past the overlap region
    /// along the wrapped axis, leaving the stitching face on the min side
    /// plus two samples of slack against overreach.
    #[must_use]
    pub fn evaluated_parameter_space(&self) -> [f64; 4] {
        let expansion = self.config.expansion_factor;
        match self.config.wrap_around {
            WrapAround::NoWrap => [-expansion, 1.0 + expansion, -expansion, 1.0 + expansion],
            WrapAround::AlongU => {
                let (start, end) = self.wrapped_axis_domain(0);
                [start, end, -expansion, 1.0 + expansion]
            }
            WrapAround::AlongV => {
                let (start, end) = self.wrapped_axis_domain(1);
                [-expansion, 1.0 + expansion, start, end]
            }
        }
    }

    fn wrapped_axis_domain(&self, axis: usize) -> (f64, f64) {
        let overlap = self.interpolating_overlap()[axis] as f64;
        let grid = self.interpolating_grid_resolution()[axis] as f64;
        let per_sample = 1.0 / ((grid - 1.0) * self.samples_per_grid_cell() as f64);

        let start = (overlap - 1.0) / (grid - 1.0) + per_sample * 2.0;
        let end = 1.0 - overlap / (grid - 1.0);
        (start, end)
    }

    /// Sample counts for the evaluated domain, derived from the samples per
    /// grid cell and the domain extent.
    #[must_use]
    pub fn sample_size(&self, domain: [f64; 4]) -> [usize; 2] {
        let [grid_u, grid_v] = self.interpolating_grid_resolution();
        let per_cell = self.samples_per_grid_cell();

        let size_u = domain[1] - domain[0];
        let size_v = domain[3] - domain[2];
        [
            per_cell * ((grid_u - 1) as f64 * size_u + 0.5) as usize + 1,
            per_cell * ((grid_v - 1) as f64 * size_v + 0.5) as usize + 1,
        ]
    }

    // ── iterative seam search ────────────────────────────────────────────

    /// Search the domain end along the wrapped axis at which the surface's
    /// start and end edges meet without overlapping: a coarse linear search
    /// shrinking the end while the dot product against the initial
    /// start-to-end vector stays non-negative, then a 2%-step refinement.
    fn seam_search(
        &self,
        u_knots: &[f64],
        v_knots: &[f64],
        control_points: &[Point3],
    ) -> Result<SeamSearch, NurbsError> {
        // Position of each domain bound in the [min_u, max_u, min_v, max_v]
        // array, rotated by two for wrapping along v.
        let slot = |index: usize| -> usize {
            if self.config.wrap_around == WrapAround::AlongU {
                index
            } else {
                (index + 2) % 4
            }
        };
        let axis = if self.config.wrap_around == WrapAround::AlongU {
            0
        } else {
            1
        };

        let overlap = self.interpolating_overlap()[axis] as f64;
        let grid = self.interpolating_grid_resolution()[axis] as f64;
        let per_cell = self.samples_per_grid_cell();

        let mut current = [0.0; 4];
        current[slot(0)] = (overlap - 1.0) / (grid - 1.0);
        current[slot(1)] = 1.0 - ((overlap - 1.0) / (grid - 1.0)) / 2.0;
        // The non-wrapping direction collapses to a single sample to keep
        // the search cheap.
        current[slot(2)] = 0.0;
        current[slot(3)] = 0.0;

        let points = self.evaluate_surface(current, u_knots, v_knots, control_points)?;
        let start = Point3::from_array(points[0]);
        let first_end = Point3::from_array(points[points.len() - 1]);
        let reference: Vec3 = first_end - start;

        let step = 1.0 / ((grid - 1.0) * per_cell as f64);
        let max_iterations = ((grid - overlap) * per_cell as f64) as usize;
        let mut product = 1.0;
        let mut iterations = 0;

        while product >= 0.0 && iterations < max_iterations {
            current[slot(1)] -= step;
            let points = self.evaluate_surface(current, u_knots, v_knots, control_points)?;
            let end = Point3::from_array(points[points.len() - 1]);
            product = reference.dot(end - start);
            iterations += 1;
        }

        if product >= 0.0 {
            return Ok(SeamSearch::Exhausted { iterations });
        }

        // Fine-tune between the last two samples.
        let accuracy_percent = 2.0;
        let fine_step = step * accuracy_percent / 100.0;
        let max_fine_iterations = (100.0 / accuracy_percent) as usize + 1;
        let mut fine_iterations = 0;

        while product < 0.0 && fine_iterations < max_fine_iterations {
            current[slot(1)] += fine_step;
            let points = self.evaluate_surface(current, u_knots, v_knots, control_points)?;
            let end = Point3::from_array(points[points.len() - 1]);
            product = reference.dot(end - start);
            fine_iterations += 1;
        }

        // Leave one sample length for the stitching strip.
        current[slot(1)] -= step;

        let iterations = iterations + fine_iterations;
        if fine_iterations >= max_fine_iterations {
            return Ok(SeamSearch::Exhausted { iterations });
        }

        let expansion = self.config.expansion_factor;
        let mut domain = [0.0; 4];
        domain[slot(0)] = current[slot(0)];
        domain[slot(1)] = current[slot(1)];
        domain[slot(2)] = -expansion;
        domain[slot(3)] = 1.0 + expansion;
        Ok(SeamSearch::Converged { domain, iterations })
    }

    // ── surface evaluation ───────────────────────────────────────────────

    /// Evaluate the interpolated surface over the regular parametric grid
    /// spanned by `domain`. Output is ordered with `u` as the outer axis.
    fn evaluate_surface(
        &self,
        domain: [f64; 4],
        u_knots: &[f64],
        v_knots: &[f64],
        control_points: &[Point3],
    ) -> Result<Vec<[f64; 3]>, NurbsError> {
        let [grid_u, grid_v] = self.interpolating_grid_resolution();
        let [deg_u, deg_v] = self.config.interpolation_degrees;
        let [samples_u, samples_v] = self.sample_size(domain);

        let params_u = lin_space(domain[0], domain[1], samples_u);
        let params_v = lin_space(domain[2], domain[3], samples_v);

        let table_u = BasisTable::build(deg_u, u_knots, grid_u, &params_u)?;
        let table_v = BasisTable::build(deg_v, v_knots, grid_v, &params_v)?;

        let mut positions = vec![[0.0; 3]; params_u.len() * params_v.len()];
        let row_len = params_v.len();

        let evaluate_row = |i: usize, row: &mut [[f64; 3]]| {
            let index_u = table_u.spans[i] - deg_u;
            for (j, out) in row.iter_mut().enumerate() {
                let index_v = table_v.spans[j] - deg_v;
                let mut point = [0.0; 3];
                for k in 0..=deg_u {
                    let mut temp = [0.0; 3];
                    for l in 0..=deg_v {
                        let control_point =
                            control_points[index_v + l + grid_v * (index_u + k)];
                        let basis_v = table_v.values[j * (deg_v + 1) + l];
                        temp[0] += basis_v * control_point.x;
                        temp[1] += basis_v * control_point.y;
                        temp[2] += basis_v * control_point.z;
                    }
                    let basis_u = table_u.values[i * (deg_u + 1) + k];
                    point[0] += basis_u * temp[0];
                    point[1] += basis_u * temp[1];
                    point[2] += basis_u * temp[2];
                }
                *out = point;
            }
        };

        #[cfg(feature = "parallel")]
        positions
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(i, row)| evaluate_row(i, row));

        #[cfg(not(feature = "parallel"))]
        for (i, row) in positions.chunks_mut(row_len).enumerate() {
            evaluate_row(i, row);
        }

        Ok(positions)
    }
}

enum SeamSearch {
    Converged { domain: [f64; 4], iterations: usize },
    Exhausted { iterations: usize },
}

/// Precomputed spans and non-vanishing basis values for a parameter run.
struct BasisTable {
    spans: Vec<usize>,
    /// `degree + 1` values per parameter, flattened.
    values: Vec<f64>,
}

impl BasisTable {
    fn build(
        degree: usize,
        knots: &[f64],
        num_control_points: usize,
        params: &[f64],
    ) -> Result<Self, NurbsError> {
        let mut spans = Vec::with_capacity(params.len());
        let mut values = Vec::with_capacity(params.len() * (degree + 1));
        for &u in params {
            let span = find_span_linear(degree, knots, num_control_points, u);
            values.extend(basis_functions(degree, knots, span, u)?);
            spans.push(span);
        }
        Ok(Self { spans, values })
    }
}

/// Coefficient matrix of the global interpolation system: row `i` holds the
/// non-vanishing basis values at parameter `i`.
fn build_coeff_matrix(
    degree: usize,
    knots: &[f64],
    params: &[f64],
) -> Result<SquareMatrix, NurbsError> {
    let n = params.len();
    let mut matrix = SquareMatrix::zeros(n);
    for (i, &param) in params.iter().enumerate() {
        let span = find_span_linear(degree, knots, n, param);
        let values = basis_functions(degree, knots, span, param)?;
        for (k, value) in values.iter().enumerate() {
            matrix.set(i, span - degree + k, *value);
        }
    }
    Ok(matrix)
}

/// Solve the decomposed system for the three coordinate columns of `points`
/// and append the solution points to `out`.
fn solve_into(l: &SquareMatrix, u: &SquareMatrix, points: &[Point3], out: &mut Vec<Point3>) {
    let n = points.len();
    let mut columns = [const { Vec::new() }; 3];
    for (dim, column) in columns.iter_mut().enumerate() {
        let b: Vec<f64> = points.iter().map(|p| p.to_array()[dim]).collect();
        let y = forward_substitution(l, &b);
        *column = backward_substitution(u, &y);
    }
    out.extend((0..n).map(|j| Point3::new(columns[0][j], columns[1][j], columns[2][j])));
}

/// Average concatenated per-run parameters across `num_runs` runs of
/// `run_len` values each.
fn average_params(concatenated: &[f64], run_len: usize, num_runs: usize) -> Vec<f64> {
    (0..run_len)
        .map(|i| {
            let sum: f64 = (0..num_runs).map(|run| concatenated[run * run_len + i]).sum();
            sum / num_runs as f64
        })
        .collect()
}

/// Regularly spaced samples over `[start, stop]`. Collapses to a single
/// value when the interval is (numerically) empty.
fn lin_space(start: f64, stop: f64, num_samples: usize) -> Vec<f64> {
    if (start - stop).abs() <= 1e-8 {
        return vec![start];
    }
    if num_samples < 2 {
        return vec![start];
    }

    let div = (num_samples - 1) as f64;
    let delta = stop - start;
    (0..num_samples)
        .map(|i| start + i as f64 * delta / div)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::core::Tolerance;

    fn flat_grid(res_u: usize, res_v: usize) -> Vec<Point3> {
        let mut points = Vec::with_capacity(res_u * res_v);
        for u in 0..res_u {
            for v in 0..res_v {
                points.push(Point3::new(u as f64, v as f64, 0.0));
            }
        }
        points
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            NurbsSurfaceSource::new(NurbsConfig::default().with_degrees(1, 3)),
            Err(NurbsError::InvalidDegrees { u: 1, v: 3 })
        ));
        assert!(matches!(
            NurbsSurfaceSource::new(NurbsConfig::default().with_resolution(2, 4)),
            Err(NurbsError::InvalidResolution { u: 2, v: 4 })
        ));
        assert!(matches!(
            NurbsSurfaceSource::new(NurbsConfig::default().with_delta(0.0001)),
            Err(NurbsError::DeltaTooSmall { .. })
        ));
        assert!(matches!(
            NurbsSurfaceSource::new(NurbsConfig::default().with_expansion(0.7)),
            Err(NurbsError::InvalidExpansionFactor { .. })
        ));
        assert!(
            NurbsSurfaceSource::new(NurbsConfig::default()).is_ok()
        );
    }

    #[test]
    fn test_wrap_overlap_bound() {
        // 4x4 at degree 3: the along-u overlap of degree + 1 = 4 points
        // exactly fits the input resolution.
        assert!(
            NurbsSurfaceSource::new(NurbsConfig::default().with_wrap(WrapAround::AlongU)).is_ok()
        );
        assert!(matches!(
            NurbsSurfaceSource::new(
                NurbsConfig::default()
                    .with_resolution(4, 5)
                    .with_degrees(4, 3)
                    .with_wrap(WrapAround::AlongU)
            ),
            Err(NurbsError::OverlapExceedsResolution)
        ));
    }

    #[test]
    fn test_point_count_mismatch() {
        let source = NurbsSurfaceSource::new(NurbsConfig::default()).unwrap();
        let result = source.compute(&flat_grid(4, 3));
        assert!(matches!(
            result,
            Err(NurbsError::PointCountMismatch {
                expected: 16,
                provided: 12
            })
        ));
    }

    #[test]
    fn test_sample_size_from_delta() {
        let source = NurbsSurfaceSource::new(NurbsConfig::default()).unwrap();
        // 10 samples per grid cell, 3 cells across the unit domain.
        assert_eq!(source.sample_size([0.0, 1.0, 0.0, 1.0]), [31, 31]);
    }

    #[test]
    fn test_flat_grid_interpolates_planar_surface() {
        let source = NurbsSurfaceSource::new(NurbsConfig::default()).unwrap();
        let (mesh, diagnostics) = source.compute(&flat_grid(4, 4)).unwrap();

        assert_eq!(diagnostics.control_point_count, 16);
        assert_eq!(diagnostics.sample_size, [31, 31]);
        assert_eq!(mesh.vertex_count(), 31 * 31);
        assert!(mesh.validate().is_ok());
        assert!(diagnostics.warnings.is_empty());

        // Interpolating planar input yields planar output.
        assert!(mesh.positions.iter().all(|p| p[2].abs() < 1e-9));
    }

    #[test]
    fn test_interpolation_round_trip() {
        // Evaluating the fitted surface at the original input parameters
        // reproduces the input points: interpolation, not smoothing.
        let config = NurbsConfig::default();
        let source = NurbsSurfaceSource::new(config).unwrap();

        let mut input = Vec::new();
        for u in 0..4 {
            for v in 0..4 {
                input.push(Point3::new(
                    u as f64 * 2.0,
                    v as f64 * 1.5,
                    (u as f64 * 0.9 + v as f64 * 0.4).sin(),
                ));
            }
        }

        let (uk, vl) = source.compute_params_surface(&input).unwrap();
        let u_knots = averaged_knot_vector(3, 4, &uk).unwrap();
        let v_knots = averaged_knot_vector(3, 4, &vl).unwrap();

        let coeff_u = build_coeff_matrix(3, &u_knots, &uk).unwrap();
        let (l_u, u_u) = lu_decompose(&coeff_u).unwrap();
        let mut pass_one = Vec::new();
        for v in 0..4 {
            let column: Vec<Point3> = (0..4).map(|u| input[source.point_index_uv(u, v)]).collect();
            solve_into(&l_u, &u_u, &column, &mut pass_one);
        }

        let coeff_v = build_coeff_matrix(3, &v_knots, &vl).unwrap();
        let (l_v, u_v) = lu_decompose(&coeff_v).unwrap();
        let mut control_points = Vec::new();
        for u in 0..4 {
            let row: Vec<Point3> = (0..4).map(|v| pass_one[v * 4 + u]).collect();
            solve_into(&l_v, &u_v, &row, &mut control_points);
        }

        let tol = Tolerance::LOOSE;
        for (ui, &u) in uk.iter().enumerate() {
            for (vi, &v) in vl.iter().enumerate() {
                let span_u = find_span_linear(3, &u_knots, 4, u);
                let span_v = find_span_linear(3, &v_knots, 4, v);
                let basis_u = basis_functions(3, &u_knots, span_u, u).unwrap();
                let basis_v = basis_functions(3, &v_knots, span_v, v).unwrap();

                let mut evaluated = Point3::ORIGIN;
                for k in 0..=3 {
                    for l in 0..=3 {
                        let cp =
                            control_points[(span_v - 3 + l) + 4 * (span_u - 3 + k)];
                        let weight = basis_u[k] * basis_v[l];
                        evaluated = Point3::new(
                            evaluated.x + cp.x * weight,
                            evaluated.y + cp.y * weight,
                            evaluated.z + cp.z * weight,
                        );
                    }
                }

                let expected = input[ui * 4 + vi];
                assert!(
                    tol.approx_eq_point3(evaluated, expected),
                    "({u}, {v}): {evaluated:?} != {expected:?}"
                );
            }
        }
    }

    #[test]
    fn test_lin_space_degenerate_interval() {
        assert_eq!(lin_space(0.25, 0.25, 10), vec![0.25]);
        let samples = lin_space(0.0, 1.0, 5);
        assert_eq!(samples, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_average_params() {
        // Two runs of three values each.
        let concatenated = [0.0, 0.4, 1.0, 0.0, 0.6, 1.0];
        let averaged = average_params(&concatenated, 3, 2);
        assert_eq!(averaged, vec![0.0, 0.5, 1.0]);
    }
}

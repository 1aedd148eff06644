//! Tensor-product Bezier surface source.
//!
//! Owns an `m x n` control-point grid (bi-cubic 4x4 by default) and
//! evaluates the surface on a regular parametric sample grid, producing
//! positions, `(u, v)` texture coordinates and a pure quad topology. The
//! sample loop is embarrassingly parallel across rows and runs on rayon
//! when the `parallel` feature is enabled.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::basis::{bernstein, binomial_coefficients};
use super::core::Point3;
use super::mesh::{SurfaceMesh, WrapAround, quad_grid};

/// Errors raised by the Bezier surface source.
#[derive(Debug, thiserror::Error)]
pub enum BezierError {
    #[error("control grid of {rows}x{cols} needs {expected} points, got {provided}")]
    InvalidControlPointCount {
        rows: usize,
        cols: usize,
        expected: usize,
        provided: usize,
    },
    #[error("sampling resolution {x}x{y} is invalid, both axes need at least 2 samples")]
    InvalidResolution { x: usize, y: usize },
}

/// Bezier surface source over a row-major control-point grid.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierSurfaceSource {
    grid_size: [usize; 2],
    control_points: Vec<Point3>,
    resolution: [usize; 2],
    binomials_u: Vec<f64>,
    binomials_v: Vec<f64>,
}

impl Default for BezierSurfaceSource {
    /// A bi-cubic surface (4x4 control net) sampled at 10x10.
    fn default() -> Self {
        Self::new(4, 4)
    }
}

impl BezierSurfaceSource {
    /// Create a source with an `m x n` control grid, reset to the default
    /// flat net. Grid sizes below 2 are clamped to 2 per axis.
    #[must_use]
    pub fn new(m: usize, n: usize) -> Self {
        let mut source = Self {
            grid_size: [0, 0],
            control_points: Vec::new(),
            resolution: [10, 10],
            binomials_u: Vec::new(),
            binomials_v: Vec::new(),
        };
        source.set_grid_size(m, n);
        source
    }

    /// Reallocate the control grid, clamping each axis to at least 2 points,
    /// reset the control points to the default flat grid and recompute the
    /// binomial coefficients. Invalidates any previously sampled surface.
    pub fn set_grid_size(&mut self, m: usize, n: usize) {
        let clamped = [m.max(2), n.max(2)];
        if self.grid_size == clamped {
            return;
        }

        self.grid_size = clamped;
        self.reset_control_points();
        self.binomials_u = binomial_coefficients(self.grid_size[0]);
        self.binomials_v = binomial_coefficients(self.grid_size[1]);
    }

    /// Reset the control points to a flat grid spanning `[-0.5, 0.5]^2` at
    /// `z = 0`.
    pub fn reset_control_points(&mut self) {
        let [m, n] = self.grid_size;
        let dist_x = 1.0 / (m - 1) as f64;
        let dist_y = 1.0 / (n - 1) as f64;

        self.control_points = (0..m * n)
            .map(|index| {
                let i = index / n;
                let j = index % n;
                Point3::new(-0.5 + i as f64 * dist_x, -0.5 + j as f64 * dist_y, 0.0)
            })
            .collect();
    }

    /// Copy `m * n` control points (row-major) into the grid. Fails when
    /// fewer points are provided; extra points are ignored.
    pub fn set_control_points(&mut self, points: &[Point3]) -> Result<(), BezierError> {
        let [m, n] = self.grid_size;
        if points.len() < m * n {
            return Err(BezierError::InvalidControlPointCount {
                rows: m,
                cols: n,
                expected: m * n,
                provided: points.len(),
            });
        }

        self.control_points.clear();
        self.control_points.extend_from_slice(&points[..m * n]);
        Ok(())
    }

    /// Set the sampling resolution (number of samples per axis, minimum 2).
    pub fn set_resolution(&mut self, x: usize, y: usize) -> Result<(), BezierError> {
        if x < 2 || y < 2 {
            return Err(BezierError::InvalidResolution { x, y });
        }
        self.resolution = [x, y];
        Ok(())
    }

    #[must_use]
    pub const fn grid_size(&self) -> [usize; 2] {
        self.grid_size
    }

    #[must_use]
    pub const fn resolution(&self) -> [usize; 2] {
        self.resolution
    }

    #[must_use]
    pub fn control_points(&self) -> &[Point3] {
        &self.control_points
    }

    /// Evaluate the surface over the sample grid. Pull-based and pure: the
    /// result is a function of the current control points and resolution.
    #[must_use]
    pub fn evaluate(&self) -> SurfaceMesh {
        let [x_res, y_res] = self.resolution;
        let mut positions = vec![[0.0; 3]; x_res * y_res];
        let mut uvs = vec![[0.0; 2]; x_res * y_res];

        #[cfg(feature = "parallel")]
        positions
            .par_chunks_mut(y_res)
            .zip(uvs.par_chunks_mut(y_res))
            .enumerate()
            .for_each(|(i, (position_row, uv_row))| {
                self.evaluate_row(i, position_row, uv_row);
            });

        #[cfg(not(feature = "parallel"))]
        for (i, (position_row, uv_row)) in positions
            .chunks_mut(y_res)
            .zip(uvs.chunks_mut(y_res))
            .enumerate()
        {
            self.evaluate_row(i, position_row, uv_row);
        }

        SurfaceMesh {
            positions,
            cells: quad_grid(x_res, y_res, WrapAround::NoWrap),
            uvs: Some(uvs),
        }
    }

    fn evaluate_row(&self, i: usize, position_row: &mut [[f64; 3]], uv_row: &mut [[f64; 2]]) {
        let [x_res, y_res] = self.resolution;
        let [x_grid, y_grid] = self.grid_size;
        let u = i as f64 / (x_res - 1) as f64;

        for j in 0..y_res {
            let v = j as f64 / (y_res - 1) as f64;
            let mut point = [0.0; 3];

            for ci in 0..x_grid {
                let basis_u = bernstein(self.binomials_u[ci], x_grid - 1, ci, u);
                for cj in 0..y_grid {
                    let basis_v = bernstein(self.binomials_v[cj], y_grid - 1, cj, v);
                    let control_point = self.control_points[ci * y_grid + cj];
                    let weight = basis_u * basis_v;
                    point[0] += control_point.x * weight;
                    point[1] += control_point.y * weight;
                    point[2] += control_point.z * weight;
                }
            }

            position_row[j] = point;
            uv_row[j] = [u, v];
        }
    }

    /// Arc length of the longer of the two diagonal curves of the control
    /// net, estimated by sampling `steps` points along each Bezier curve
    /// through the grid diagonals. Used to derive a rasterization resolution
    /// dense enough for voxel projection.
    #[must_use]
    pub fn max_diagonal_arc_length(&self, steps: usize) -> f64 {
        let [m, n] = self.grid_size;
        let diag = m.min(n);

        let main: Vec<Point3> = (0..diag)
            .map(|i| self.control_points[i * n + i])
            .collect();
        let anti: Vec<Point3> = (0..diag)
            .map(|i| self.control_points[i * n + (n - 1 - i)])
            .collect();

        curve_arc_length(&main, steps).max(curve_arc_length(&anti, steps))
    }
}

fn curve_arc_length(control_points: &[Point3], steps: usize) -> f64 {
    let degree = control_points.len() - 1;
    let coefficients = binomial_coefficients(control_points.len());

    let mut length = 0.0;
    let mut previous: Option<Point3> = None;
    for step in 0..steps {
        let t = step as f64 / (steps - 1) as f64;
        let mut point = [0.0; 3];
        for (i, control_point) in control_points.iter().enumerate() {
            let basis = bernstein(coefficients[i], degree, i, t);
            point[0] += control_point.x * basis;
            point[1] += control_point.y * basis;
            point[2] += control_point.z * basis;
        }
        let point = Point3::from_array(point);
        if let Some(prev) = previous {
            length += point.distance_to(prev);
        }
        previous = Some(point);
    }

    length
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Dense voxel grid with a physical-space transform.
//!
//! The volume I/O boundary of the engine: label and distance volumes are
//! exchanged as a dense voxel grid plus an explicit voxel-to-physical affine
//! transform (origin, spacing, direction cosines). The RAS/LPS sign-flip
//! convention (`diag(-1, -1, 1)`) is applied through the same matrix in both
//! conversion directions.

use crate::geom::{Point3, Transform};

/// Errors raised when constructing or converting voxel grids.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("voxel grid dimensions must be non-zero")]
    EmptyDimensions,
    #[error("voxel spacing must be positive on every axis")]
    InvalidSpacing,
    #[error("direction cosines are singular")]
    SingularDirections,
    #[error("voxel data length {provided} does not match dimensions ({expected} voxels)")]
    DataSizeMismatch { expected: usize, provided: usize },
}

/// Dense 3D voxel grid of signed 16-bit labels, indexed `x`-fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    dims: [usize; 3],
    origin: [f64; 3],
    spacing: [f64; 3],
    directions: [[f64; 3]; 3],
    index_to_physical: Transform,
    physical_to_index: Transform,
    data: Vec<i16>,
}

impl VoxelGrid {
    /// Create a zero-filled grid.
    pub fn new(
        dims: [usize; 3],
        origin: [f64; 3],
        spacing: [f64; 3],
        directions: [[f64; 3]; 3],
    ) -> Result<Self, GridError> {
        let voxels = dims[0] * dims[1] * dims[2];
        Self::with_data(dims, origin, spacing, directions, vec![0; voxels])
    }

    /// Create a grid over existing voxel data.
    pub fn with_data(
        dims: [usize; 3],
        origin: [f64; 3],
        spacing: [f64; 3],
        directions: [[f64; 3]; 3],
        data: Vec<i16>,
    ) -> Result<Self, GridError> {
        if dims.iter().any(|&d| d == 0) {
            return Err(GridError::EmptyDimensions);
        }
        if spacing.iter().any(|&s| !s.is_finite() || s <= 0.0) {
            return Err(GridError::InvalidSpacing);
        }
        let expected = dims[0] * dims[1] * dims[2];
        if data.len() != expected {
            return Err(GridError::DataSizeMismatch {
                expected,
                provided: data.len(),
            });
        }

        let index_to_physical =
            Transform::from_origin_spacing_directions(origin, spacing, directions);
        let physical_to_index = index_to_physical
            .inverse()
            .ok_or(GridError::SingularDirections)?;

        Ok(Self {
            dims,
            origin,
            spacing,
            directions,
            index_to_physical,
            physical_to_index,
            data,
        })
    }

    /// Axis-aligned grid (identity direction cosines).
    pub fn axis_aligned(
        dims: [usize; 3],
        origin: [f64; 3],
        spacing: [f64; 3],
    ) -> Result<Self, GridError> {
        Self::new(
            dims,
            origin,
            spacing,
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        )
    }

    #[must_use]
    pub const fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[must_use]
    pub const fn origin(&self) -> [f64; 3] {
        self.origin
    }

    #[must_use]
    pub const fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    #[must_use]
    pub const fn directions(&self) -> [[f64; 3]; 3] {
        self.directions
    }

    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn data(&self) -> &[i16] {
        &self.data
    }

    /// Physical volume of a single voxel.
    #[must_use]
    pub fn voxel_volume(&self) -> f64 {
        self.spacing[0] * self.spacing[1] * self.spacing[2]
    }

    #[must_use]
    pub fn linear_index(&self, index: [usize; 3]) -> usize {
        (index[2] * self.dims[1] + index[1]) * self.dims[0] + index[0]
    }

    #[must_use]
    pub fn value(&self, index: [usize; 3]) -> i16 {
        self.data[self.linear_index(index)]
    }

    pub fn set_value(&mut self, index: [usize; 3], value: i16) {
        let linear = self.linear_index(index);
        self.data[linear] = value;
    }

    /// Physical position of a voxel index (its center).
    #[must_use]
    pub fn index_to_physical(&self, index: [usize; 3]) -> Point3 {
        self.index_to_physical.apply_point(Point3::new(
            index[0] as f64,
            index[1] as f64,
            index[2] as f64,
        ))
    }

    /// Voxel index containing a physical point, or `None` when the point
    /// falls outside the grid. Continuous indices are rounded to the
    /// nearest voxel.
    #[must_use]
    pub fn physical_to_index(&self, point: Point3) -> Option<[usize; 3]> {
        let continuous = self.physical_to_index.apply_point(point);
        let rounded = [
            continuous.x.round(),
            continuous.y.round(),
            continuous.z.round(),
        ];

        let mut index = [0_usize; 3];
        for axis in 0..3 {
            if !rounded[axis].is_finite()
                || rounded[axis] < 0.0
                || rounded[axis] >= self.dims[axis] as f64
            {
                return None;
            }
            index[axis] = rounded[axis] as usize;
        }
        Some(index)
    }

    /// Number of voxels carrying the given label.
    #[must_use]
    pub fn count_label(&self, label: i16) -> usize {
        self.data.iter().filter(|&&v| v == label).count()
    }

    /// The same voxel data with the `diag(-1, -1, 1)` RAS/LPS sign flip
    /// applied to the grid geometry. Applying the conversion twice restores
    /// the original geometry.
    pub fn with_coordinate_flip(&self) -> Result<Self, GridError> {
        let mut origin = self.origin;
        origin[0] = -origin[0];
        origin[1] = -origin[1];

        let mut directions = self.directions;
        for col in 0..3 {
            directions[0][col] = -directions[0][col];
            directions[1][col] = -directions[1][col];
        }

        Self::with_data(self.dims, origin, self.spacing, directions, self.data.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;

    #[test]
    fn test_construction_validation() {
        assert!(matches!(
            VoxelGrid::axis_aligned([0, 4, 4], [0.0; 3], [1.0; 3]),
            Err(GridError::EmptyDimensions)
        ));
        assert!(matches!(
            VoxelGrid::axis_aligned([4, 4, 4], [0.0; 3], [1.0, 0.0, 1.0]),
            Err(GridError::InvalidSpacing)
        ));
        assert!(matches!(
            VoxelGrid::with_data([2, 2, 2], [0.0; 3], [1.0; 3], [[1.0, 0.0, 0.0]; 3], vec![0; 7]),
            Err(GridError::DataSizeMismatch {
                expected: 8,
                provided: 7
            })
        ));
    }

    #[test]
    fn test_index_physical_round_trip() {
        let grid = VoxelGrid::axis_aligned([10, 12, 14], [-5.0, 2.0, 0.0], [0.5, 0.5, 2.0]).unwrap();

        let index = [3, 7, 2];
        let physical = grid.index_to_physical(index);
        assert_eq!(physical, Point3::new(-3.5, 5.5, 4.0));
        assert_eq!(grid.physical_to_index(physical), Some(index));
    }

    #[test]
    fn test_physical_to_index_out_of_bounds() {
        let grid = VoxelGrid::axis_aligned([4, 4, 4], [0.0; 3], [1.0; 3]).unwrap();
        assert_eq!(grid.physical_to_index(Point3::new(-1.0, 0.0, 0.0)), None);
        assert_eq!(grid.physical_to_index(Point3::new(0.0, 3.4, 0.0)), Some([0, 3, 0]));
        assert_eq!(grid.physical_to_index(Point3::new(0.0, 3.6, 0.0)), None);
    }

    #[test]
    fn test_value_set_and_count() {
        let mut grid = VoxelGrid::axis_aligned([4, 4, 4], [0.0; 3], [1.0; 3]).unwrap();
        grid.set_value([1, 2, 3], 7);
        grid.set_value([0, 0, 0], 7);

        assert_eq!(grid.value([1, 2, 3]), 7);
        assert_eq!(grid.count_label(7), 2);
        assert_eq!(grid.count_label(0), 62);
    }

    #[test]
    fn test_coordinate_flip_round_trip() {
        let grid = VoxelGrid::axis_aligned([4, 4, 4], [10.0, -20.0, 30.0], [1.0, 2.0, 3.0]).unwrap();
        let flipped = grid.with_coordinate_flip().unwrap();

        assert_eq!(flipped.origin(), [-10.0, 20.0, 30.0]);
        assert_eq!(flipped.directions()[0][0], -1.0);
        assert_eq!(flipped.directions()[2][2], 1.0);

        // A physical point maps consistently through the flipped geometry.
        let p = grid.index_to_physical([1, 2, 3]);
        let q = flipped.index_to_physical([1, 2, 3]);
        assert_eq!(q, Point3::new(-p.x, -p.y, p.z));

        let restored = flipped.with_coordinate_flip().unwrap();
        assert_eq!(restored, grid);
    }

    #[test]
    fn test_oblique_directions_round_trip() {
        // 90-degree rotation about z as direction cosines.
        let grid = VoxelGrid::new(
            [6, 6, 6],
            [1.0, 2.0, 3.0],
            [1.0, 1.0, 1.5],
            [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        )
        .unwrap();

        let tol = Tolerance::DEFAULT;
        let index = [2, 4, 1];
        let physical = grid.index_to_physical(index);
        let back = grid.physical_to_index(physical).unwrap();
        assert_eq!(back, index);
        assert!(tol.approx_eq_point3(physical, Point3::new(1.0 - 4.0, 2.0 + 2.0, 3.0 + 1.5)));
    }
}

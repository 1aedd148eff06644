//! Resection margin classification over a voxel grid.
//!
//! A [`PlanningSession`] owns one mutable projection volume per planning
//! session. Resection surfaces are rasterized into it sequentially, each
//! stamping its sampled points with an increasing base-value offset; seeded
//! connected-threshold region growing then partitions the tissue into
//! resection regions. Growth is doubly confined: it only passes through
//! voxels whose projected value lies in the tissue band (surface stamps and
//! background block it), and a voxel is only classified when its original
//! label equals the seed voxel's label, so growth never leaks across
//! unrelated anatomical labels.

use crate::geom::{BezierSurfaceSource, Point3, SurfaceMesh};

use super::grid::VoxelGrid;

/// First label value used for stamped surfaces and grown regions.
pub const BASE_LABEL: i16 = 100;

/// Label assigned to tissue that remains unclassified after region growing.
pub const REMNANT_LABEL: i16 = 99;

/// Errors raised during margin classification.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("surface mesh has no sample points to rasterize")]
    EmptySurface,
    #[error("seed point ({x}, {y}, {z}) falls outside the label volume")]
    SeedOutsideVolume { x: f64, y: f64, z: f64 },
}

/// Result of one seeded region-growing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedGrowth {
    /// Label assigned to the grown region (`BASE_LABEL + seed_index`).
    pub region_label: i16,
    /// Original label at the seed voxel.
    pub seed_label: i16,
    /// Voxels grown AND matching the seed voxel's original label.
    pub voxel_count: usize,
    /// All voxels reached by the flood fill, before label filtering.
    pub region_size: usize,
}

/// One planning session: the original label volume, the projection volume
/// the resection surfaces are stamped into, and the generated segments
/// output. Region-growth passes over the projection volume are serialized
/// by the mutable receiver.
#[derive(Debug, Clone)]
pub struct PlanningSession {
    labels: VoxelGrid,
    projection: VoxelGrid,
    segments: VoxelGrid,
    projected_surfaces: usize,
}

impl PlanningSession {
    /// Start a session over a label volume. The projection and segments
    /// volumes start as copies of the labels.
    #[must_use]
    pub fn new(labels: VoxelGrid) -> Self {
        let projection = labels.clone();
        let segments = labels.clone();
        Self {
            labels,
            projection,
            segments,
            projected_surfaces: 0,
        }
    }

    #[must_use]
    pub const fn labels(&self) -> &VoxelGrid {
        &self.labels
    }

    #[must_use]
    pub const fn projection(&self) -> &VoxelGrid {
        &self.projection
    }

    #[must_use]
    pub const fn segments(&self) -> &VoxelGrid {
        &self.segments
    }

    #[must_use]
    pub const fn projected_surface_count(&self) -> usize {
        self.projected_surfaces
    }

    /// Rasterize a sampled resection surface into the projection volume,
    /// stamping each in-volume sample point with
    /// `BASE_LABEL + <surfaces already projected>`. Returns the number of
    /// points that landed inside the volume; points outside are skipped.
    pub fn project_surface(&mut self, surface: &SurfaceMesh) -> Result<usize, ClassifyError> {
        if surface.vertex_count() == 0 {
            return Err(ClassifyError::EmptySurface);
        }

        let stamp = BASE_LABEL + self.projected_surfaces as i16;
        let mut projected = 0;
        for point in surface.points() {
            if let Some(index) = self.projection.physical_to_index(point) {
                self.projection.set_value(index, stamp);
                projected += 1;
            }
        }

        log::debug!(
            "projected {projected}/{} surface points with stamp {stamp}",
            surface.vertex_count()
        );
        self.projected_surfaces += 1;
        Ok(projected)
    }

    /// Grow a region from a user-placed seed point (physical coordinates).
    ///
    /// The flood fill spreads through face-connected (6-neighborhood)
    /// voxels whose projected value lies in `[1, BASE_LABEL - 1]`; grown
    /// voxels whose original label equals the seed voxel's label are
    /// written to the segments volume as `BASE_LABEL + seed_index`.
    pub fn grow_from_seed(
        &mut self,
        seed: Point3,
        seed_index: usize,
    ) -> Result<SeedGrowth, ClassifyError> {
        let seed_voxel =
            self.projection
                .physical_to_index(seed)
                .ok_or(ClassifyError::SeedOutsideVolume {
                    x: seed.x,
                    y: seed.y,
                    z: seed.z,
                })?;

        let region_label = BASE_LABEL + seed_index as i16;
        let seed_label = self.labels.value(seed_voxel);

        let region = self.connected_threshold(seed_voxel, 1, BASE_LABEL - 1);

        let mut voxel_count = 0;
        for &index in &region {
            let original = self.labels.value(index);
            if original != 0 && original == seed_label {
                self.segments.set_value(index, region_label);
                voxel_count += 1;
            }
        }

        Ok(SeedGrowth {
            region_label,
            seed_label,
            voxel_count,
            region_size: region.len(),
        })
    }

    /// Face-connectivity flood fill over the projection volume, confined to
    /// voxels whose value lies in `[lower, upper]`.
    fn connected_threshold(
        &self,
        seed: [usize; 3],
        lower: i16,
        upper: i16,
    ) -> Vec<[usize; 3]> {
        let in_band = |index: [usize; 3]| {
            let value = self.projection.value(index);
            value >= lower && value <= upper
        };

        if !in_band(seed) {
            return Vec::new();
        }

        let dims = self.projection.dims();
        let mut visited = vec![false; self.projection.voxel_count()];
        let mut region = Vec::new();
        let mut stack = vec![seed];
        visited[self.projection.linear_index(seed)] = true;

        while let Some(index) = stack.pop() {
            region.push(index);

            for axis in 0..3 {
                for direction in [-1_isize, 1] {
                    let position = index[axis] as isize + direction;
                    if position < 0 || position >= dims[axis] as isize {
                        continue;
                    }
                    let mut neighbor = index;
                    neighbor[axis] = position as usize;

                    let linear = self.projection.linear_index(neighbor);
                    if !visited[linear] && in_band(neighbor) {
                        visited[linear] = true;
                        stack.push(neighbor);
                    }
                }
            }
        }

        region
    }

    /// Relabel tissue that kept its original label through all growing
    /// passes to [`REMNANT_LABEL`]. Background voxels stay 0.
    pub fn relabel_remnant(&mut self) {
        let dims = self.labels.dims();
        for k in 0..dims[2] {
            for j in 0..dims[1] {
                for i in 0..dims[0] {
                    let index = [i, j, k];
                    if self.labels.value(index) != 0 && self.segments.value(index) < BASE_LABEL {
                        self.segments.set_value(index, REMNANT_LABEL);
                    }
                }
            }
        }
    }

    /// Consume the session, returning the generated segments volume.
    #[must_use]
    pub fn into_segments(self) -> VoxelGrid {
        self.segments
    }
}

/// Rasterization resolution for a Bezier resection surface: the longer
/// diagonal arc length of its control net divided by the smallest voxel
/// spacing, and at least 500 samples per axis so the stamped point cloud is
/// dense enough that region growing cannot leak through it.
#[must_use]
pub fn rasterization_resolution(surface: &BezierSurfaceSource, spacing: [f64; 3]) -> usize {
    let arc_length = surface.max_diagonal_arc_length(300);
    let min_spacing = spacing[0].min(spacing[1]).min(spacing[2]);
    let resolution = (arc_length / min_spacing) as usize;
    resolution.max(500)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{MeshCells, SurfaceMesh};

    fn uniform_labels(dim: usize, label: i16) -> VoxelGrid {
        let data = vec![label; dim * dim * dim];
        VoxelGrid::with_data(
            [dim, dim, dim],
            [0.0; 3],
            [1.0; 3],
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            data,
        )
        .unwrap()
    }

    fn wall_mesh(dim: usize, x: f64) -> SurfaceMesh {
        let mut positions = Vec::new();
        for j in 0..dim {
            for k in 0..dim {
                positions.push([x, j as f64, k as f64]);
            }
        }
        SurfaceMesh {
            positions,
            cells: MeshCells::Triangles(vec![]),
            uvs: None,
        }
    }

    #[test]
    fn test_project_surface_stamps_points() {
        let mut session = PlanningSession::new(uniform_labels(8, 1));
        let projected = session.project_surface(&wall_mesh(8, 4.0)).unwrap();

        assert_eq!(projected, 64);
        assert_eq!(session.projection().count_label(BASE_LABEL), 64);
        assert_eq!(session.projected_surface_count(), 1);
    }

    #[test]
    fn test_project_surface_skips_outside_points() {
        let mut session = PlanningSession::new(uniform_labels(4, 1));
        let mesh = SurfaceMesh {
            positions: vec![[1.0, 1.0, 1.0], [100.0, 0.0, 0.0]],
            cells: MeshCells::Triangles(vec![]),
            uvs: None,
        };
        assert_eq!(session.project_surface(&mesh).unwrap(), 1);
    }

    #[test]
    fn test_project_surface_rejects_empty_mesh() {
        let mut session = PlanningSession::new(uniform_labels(4, 1));
        let mesh = SurfaceMesh {
            positions: vec![],
            cells: MeshCells::Triangles(vec![]),
            uvs: None,
        };
        assert!(matches!(
            session.project_surface(&mesh),
            Err(ClassifyError::EmptySurface)
        ));
    }

    #[test]
    fn test_successive_surfaces_stamp_increasing_values() {
        let mut session = PlanningSession::new(uniform_labels(8, 1));
        session.project_surface(&wall_mesh(8, 2.0)).unwrap();
        session.project_surface(&wall_mesh(8, 5.0)).unwrap();

        assert_eq!(session.projection().count_label(BASE_LABEL), 64);
        assert_eq!(session.projection().count_label(BASE_LABEL + 1), 64);
    }

    #[test]
    fn test_growth_confined_by_stamped_surface() {
        let mut session = PlanningSession::new(uniform_labels(8, 1));
        session.project_surface(&wall_mesh(8, 4.0)).unwrap();

        let growth = session
            .grow_from_seed(Point3::new(1.0, 1.0, 1.0), 0)
            .unwrap();

        // Voxels with x < 4 are reachable; the stamped wall and everything
        // beyond it are not.
        assert_eq!(growth.region_label, BASE_LABEL);
        assert_eq!(growth.seed_label, 1);
        assert_eq!(growth.voxel_count, 4 * 8 * 8);
        assert_eq!(growth.region_size, 4 * 8 * 8);
        assert_eq!(session.segments().count_label(BASE_LABEL), 4 * 8 * 8);
    }

    #[test]
    fn test_growth_never_claims_foreign_labels() {
        // Two anatomical labels with no separating surface: the fill crosses
        // the label boundary, but only seed-label voxels are classified.
        let dim = 6;
        let mut data = vec![1_i16; dim * dim * dim];
        for (linear, value) in data.iter_mut().enumerate() {
            let x = linear % dim;
            if x >= 3 {
                *value = 2;
            }
        }
        let labels = VoxelGrid::with_data(
            [dim, dim, dim],
            [0.0; 3],
            [1.0; 3],
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            data,
        )
        .unwrap();

        let mut session = PlanningSession::new(labels);
        let growth = session
            .grow_from_seed(Point3::new(1.0, 1.0, 1.0), 0)
            .unwrap();

        assert_eq!(growth.seed_label, 1);
        assert_eq!(growth.region_size, dim * dim * dim);
        assert_eq!(growth.voxel_count, 3 * dim * dim);

        // No label-2 voxel was relabeled.
        for k in 0..dim {
            for j in 0..dim {
                for i in 3..dim {
                    assert_eq!(session.segments().value([i, j, k]), 2);
                }
            }
        }
    }

    #[test]
    fn test_seed_outside_volume() {
        let mut session = PlanningSession::new(uniform_labels(4, 1));
        assert!(matches!(
            session.grow_from_seed(Point3::new(50.0, 0.0, 0.0), 0),
            Err(ClassifyError::SeedOutsideVolume { .. })
        ));
    }

    #[test]
    fn test_seed_on_stamped_voxel_grows_nothing() {
        let mut session = PlanningSession::new(uniform_labels(8, 1));
        session.project_surface(&wall_mesh(8, 4.0)).unwrap();

        let growth = session
            .grow_from_seed(Point3::new(4.0, 2.0, 2.0), 0)
            .unwrap();
        assert_eq!(growth.region_size, 0);
        assert_eq!(growth.voxel_count, 0);
    }

    #[test]
    fn test_remnant_relabeling() {
        let mut session = PlanningSession::new(uniform_labels(8, 1));
        session.project_surface(&wall_mesh(8, 4.0)).unwrap();
        session
            .grow_from_seed(Point3::new(1.0, 1.0, 1.0), 0)
            .unwrap();
        session.relabel_remnant();

        let segments = session.into_segments();
        assert_eq!(segments.count_label(BASE_LABEL), 4 * 8 * 8);
        // Stamped wall plus the far side of it.
        assert_eq!(segments.count_label(REMNANT_LABEL), 4 * 8 * 8);
        assert_eq!(segments.count_label(1), 0);
    }

    #[test]
    fn test_rasterization_resolution_floor() {
        let surface = BezierSurfaceSource::default();
        // Unit-sized default net: the arc length over fine spacing still
        // clamps to the 500-sample floor.
        assert_eq!(rasterization_resolution(&surface, [1.0, 1.0, 1.0]), 500);
        // Coarse surfaces over fine voxels exceed the floor.
        let mut large = BezierSurfaceSource::default();
        let scaled: Vec<Point3> = large
            .control_points()
            .iter()
            .map(|p| Point3::new(p.x * 2000.0, p.y * 2000.0, p.z))
            .collect();
        large.set_control_points(&scaled).unwrap();
        assert!(rasterization_resolution(&large, [1.0, 1.0, 1.0]) > 500);
    }
}

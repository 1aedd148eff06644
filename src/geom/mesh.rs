//! Sampled-surface mesh output consumed by the rendering back end.
//!
//! A [`SurfaceMesh`] is the hand-off contract: a vertex buffer of 3D
//! positions, an index buffer (triangle or quad cells), and optional
//! per-vertex `(u, v)` texture coordinates. Flat-buffer views are provided
//! for back ends that expect packed numeric arrays.

use super::core::Point3;

/// Whether the sampled grid's opposite parametric edges are stitched into a
/// closed, cylinder-like surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapAround {
    #[default]
    NoWrap,
    AlongU,
    AlongV,
}

/// Cell index buffer: consecutive index triples or quadruples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshCells {
    Triangles(Vec<u32>),
    Quads(Vec<u32>),
}

impl MeshCells {
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        match self {
            Self::Triangles(indices) | Self::Quads(indices) => indices,
        }
    }

    #[must_use]
    pub const fn vertices_per_cell(&self) -> usize {
        match self {
            Self::Triangles(_) => 3,
            Self::Quads(_) => 4,
        }
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.indices().len() / self.vertices_per_cell()
    }
}

/// Evaluated surface samples plus topology and texture coordinates.
///
/// Rebuilt in full on every control-point or resolution change; partial
/// results are never published.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMesh {
    pub positions: Vec<[f64; 3]>,
    pub cells: MeshCells,
    pub uvs: Option<Vec<[f64; 2]>>,
}

impl SurfaceMesh {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    /// Vertex positions as [`Point3`] values.
    pub fn points(&self) -> impl Iterator<Item = Point3> + '_ {
        self.positions.iter().map(|p| Point3::from_array(*p))
    }

    /// Position buffer as a flat slice: `[x0, y0, z0, x1, y1, z1, ...]`.
    #[must_use]
    pub fn positions_flat(&self) -> &[f64] {
        self.positions.as_flattened()
    }

    /// Texture-coordinate buffer as a flat slice: `[u0, v0, u1, v1, ...]`.
    #[must_use]
    pub fn uvs_flat(&self) -> Option<&[f64]> {
        self.uvs.as_deref().map(<[[f64; 2]]>::as_flattened)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cells.indices().len() % self.cells.vertices_per_cell() != 0 {
            return Err("mesh indices are not a whole number of cells".to_string());
        }
        if self
            .positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
        {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        let n = self.positions.len() as u32;
        if self.cells.indices().iter().any(|&i| i >= n) {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if let Some(uvs) = &self.uvs {
            if uvs.len() != self.positions.len() {
                return Err("mesh uv buffer does not match vertex count".to_string());
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Grid topology
// ─────────────────────────────────────────────────────────────────────────────

/// Triangle topology over a `sample_u x sample_v` point grid indexed
/// `i * sample_v + j`, two triangles per cell. When wrapping, a strip of
/// triangles stitches the meeting edges of the seam.
#[must_use]
pub fn triangulate_grid(sample_u: usize, sample_v: usize, wrap: WrapAround) -> MeshCells {
    let mut indices = Vec::with_capacity((sample_u - 1) * (sample_v - 1) * 6);

    for i in 0..sample_u - 1 {
        for j in 0..sample_v - 1 {
            let [a, b, c, d] = cell_corners(i * sample_v + j, sample_v);
            indices.extend_from_slice(&[c, b, a]);
            indices.extend_from_slice(&[d, c, a]);
        }
    }

    match wrap {
        WrapAround::NoWrap => {}
        WrapAround::AlongU => {
            for v in 0..sample_v - 1 {
                let [a, b, c, d] = seam_corners_u(v, sample_u, sample_v);
                indices.extend_from_slice(&[c, b, d]);
                indices.extend_from_slice(&[d, b, a]);
            }
        }
        WrapAround::AlongV => {
            for u in 0..sample_u - 1 {
                let [a, b, c, d] = seam_corners_v(u, sample_v);
                indices.extend_from_slice(&[c, b, d]);
                indices.extend_from_slice(&[d, b, a]);
            }
        }
    }

    MeshCells::Triangles(indices)
}

/// Quad topology over a `sample_u x sample_v` point grid, one quad per cell,
/// with a stitching strip of quads across the wrap seam.
#[must_use]
pub fn quad_grid(sample_u: usize, sample_v: usize, wrap: WrapAround) -> MeshCells {
    let mut indices = Vec::with_capacity((sample_u - 1) * (sample_v - 1) * 4);

    for i in 0..sample_u - 1 {
        for j in 0..sample_v - 1 {
            let [a, b, c, d] = cell_corners(i * sample_v + j, sample_v);
            indices.extend_from_slice(&[c, b, a, d]);
        }
    }

    match wrap {
        WrapAround::NoWrap => {}
        WrapAround::AlongU => {
            for v in 0..sample_v - 1 {
                let [a, b, c, d] = seam_corners_u(v, sample_u, sample_v);
                indices.extend_from_slice(&[c, b, a, d]);
            }
        }
        WrapAround::AlongV => {
            for u in 0..sample_u - 1 {
                let [a, b, c, d] = seam_corners_v(u, sample_v);
                indices.extend_from_slice(&[c, b, a, d]);
            }
        }
    }

    MeshCells::Quads(indices)
}

fn cell_corners(base: usize, sample_v: usize) -> [u32; 4] {
    [
        base as u32,
        (base + 1) as u32,
        (base + sample_v + 1) as u32,
        (base + sample_v) as u32,
    ]
}

fn seam_corners_u(v: usize, sample_u: usize, sample_v: usize) -> [u32; 4] {
    let far = (sample_u - 1) * sample_v;
    [
        v as u32,
        (v + 1) as u32,
        (v + far + 1) as u32,
        (v + far) as u32,
    ]
}

fn seam_corners_v(u: usize, sample_v: usize) -> [u32; 4] {
    let base = u * sample_v;
    [
        base as u32,
        (base + sample_v) as u32,
        (base + sample_v * 2 - 1) as u32,
        (base + sample_v - 1) as u32,
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Core engine for interactive liver-resection planning.
//!
//! Three pillars, matching the planning workflow:
//!
//! - [`geom`] — parametric resection surfaces: a bi-cubic Bezier source over
//!   an interactive control net and a global NURBS interpolation source with
//!   optional wrap-around stitching, both evaluating into vertex/index/
//!   texcoord buffers for the rendering back end.
//! - [`volume`] — vascular-territory and margin classification: resection
//!   surfaces rasterized into a voxel grid, seeded connected-threshold
//!   region growing, and volumetry aggregation.
//! - [`shading`] — the numeric margin/uncertainty color-law contract the
//!   rendering back end applies against a distance-field texture.
//!
//! The host application owns scene nodes, UI and rendering; this crate is
//! purely computational. Surface rebuilds and classification passes are
//! synchronous, idempotent functions of their inputs, so callers react to
//! errors by re-invoking with corrected input and otherwise keep the last
//! good result.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

pub mod geom;
pub mod shading;
pub mod volume;

pub use geom::{
    BezierError, BezierSurfaceSource, MeshCells, NurbsConfig, NurbsDiagnostics, NurbsError,
    NurbsSurfaceSource, Point3, SurfaceMesh, Tolerance, Transform, Vec3, WrapAround,
};
pub use shading::{MarginBand, MarginShadingContract, ResectionParameters, ResectionStatus};
pub use volume::{
    BASE_LABEL, ClassifyError, GridError, PlanningSession, REMNANT_LABEL, SeedGrowth, VoxelGrid,
    VolumetryRow, VolumetryTable,
};

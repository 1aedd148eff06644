mod classify;
mod grid;
mod volumetry;

pub use classify::{
    BASE_LABEL, ClassifyError, PlanningSession, REMNANT_LABEL, SeedGrowth,
    rasterization_resolution,
};
pub use grid::{GridError, VoxelGrid};
pub use volumetry::{VolumetryRow, VolumetryTable};

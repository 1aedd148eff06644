//! Margin shading contract consumed by the rendering back end.
//!
//! The engine does not render; it hands the back end a vertex/index/texcoord
//! buffer set, a distance-field texture and this numeric contract. The
//! four-band piecewise color law implemented here must be reproduced exactly
//! by whatever shading language the back end uses: the banding, the
//! transition inset and the clip threshold are part of the interchange
//! format, not presentation details.

use serde::{Deserialize, Serialize};

use crate::geom::Point3;

/// Distance-field value past which geometry is discarded when clipping is
/// enabled (second texture component).
pub const CLIP_THRESHOLD: f64 = 2.0;

/// Margin band a distance-field sample falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarginBand {
    /// Inside the resection margin: the critical structure is too close.
    Margin,
    /// Inside the uncertainty band around the margin distance.
    Uncertainty,
    /// Thin dark separator at the outer edge of the uncertainty band.
    Transition,
    /// Safely away from critical structures.
    Safe,
}

/// Numeric shading parameters for margin visualization.
///
/// Distances are in physical units (mm). `interpolated_margins` selects
/// linearly blended instead of hard-banded coloring between
/// `resection_margin - uncertainty_margin` and
/// `resection_margin + uncertainty_margin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginShadingContract {
    pub resection_margin: f64,
    pub uncertainty_margin: f64,
    pub resection_margin_color: [f32; 3],
    pub uncertainty_margin_color: [f32; 3],
    pub resection_color: [f32; 3],
    pub interpolated_margins: bool,
    pub clip_out: bool,
}

impl Default for MarginShadingContract {
    fn default() -> Self {
        Self {
            resection_margin: 0.0,
            uncertainty_margin: 0.0,
            resection_margin_color: [1.0, 0.0, 0.0],
            uncertainty_margin_color: [1.0, 1.0, 0.0],
            resection_color: [1.0, 1.0, 1.0],
            interpolated_margins: false,
            clip_out: false,
        }
    }
}

impl MarginShadingContract {
    /// Lower edge of the uncertainty band.
    #[must_use]
    pub fn low_margin(&self) -> f64 {
        self.resection_margin - self.uncertainty_margin
    }

    /// Upper edge of the uncertainty band.
    #[must_use]
    pub fn high_margin(&self) -> f64 {
        self.resection_margin + self.uncertainty_margin
    }

    /// Band for a distance-field sample.
    #[must_use]
    pub fn band_for_distance(&self, distance: f64) -> MarginBand {
        let low = self.low_margin();
        let high = self.high_margin();

        if distance < low {
            MarginBand::Margin
        } else if distance < high - (high - low) * 0.1 {
            MarginBand::Uncertainty
        } else if distance < high {
            MarginBand::Transition
        } else {
            MarginBand::Safe
        }
    }

    /// RGB color for a distance-field sample, applying the interpolated
    /// blend inside the uncertainty band when configured.
    #[must_use]
    pub fn color_for_distance(&self, distance: f64) -> [f32; 3] {
        match self.band_for_distance(distance) {
            MarginBand::Margin => self.resection_margin_color,
            MarginBand::Uncertainty => {
                if self.interpolated_margins {
                    let t = (distance - self.low_margin())
                        / (self.high_margin() - self.low_margin());
                    mix(
                        self.resection_margin_color,
                        self.uncertainty_margin_color,
                        t as f32,
                    )
                } else {
                    self.uncertainty_margin_color
                }
            }
            MarginBand::Transition => [0.0, 0.0, 0.0],
            MarginBand::Safe => self.resection_color,
        }
    }

    /// Whether a fragment with the given second distance-field component is
    /// discarded.
    #[must_use]
    pub fn clips(&self, clip_component: f64) -> bool {
        self.clip_out && clip_component > CLIP_THRESHOLD
    }
}

fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Resection parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of a resection plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResectionStatus {
    #[default]
    Initialization,
    Deformation,
    Completed,
}

/// Persisted parameters of one resection: margins, status and the ordered
/// control points in the flat form the fiducial-CSV serialization contract
/// expects (two initialization markers, sixteen Bezier control points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResectionParameters {
    pub status: ResectionStatus,
    pub resection_margin: f64,
    pub uncertainty_margin: f64,
    pub initialization_points: [Point3; 2],
    pub control_points: [Point3; 16],
}

impl ResectionParameters {
    /// Flat ordered point list as serialized: the two initialization
    /// markers followed by the sixteen control points.
    #[must_use]
    pub fn point_list(&self) -> Vec<Point3> {
        let mut points = Vec::with_capacity(18);
        points.extend_from_slice(&self.initialization_points);
        points.extend_from_slice(&self.control_points);
        points
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

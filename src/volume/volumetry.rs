//! Volumetry aggregation of classified resection regions.
//!
//! Converts per-seed voxel counts into physical volumes and percentages of
//! the target segmentation volume, accumulating rows into a table the host
//! presents to the user.

/// One row of the volumetry table.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VolumetryRow {
    /// User-facing region label.
    pub label: String,
    /// Volume of the target segmentation, in cubic centimeters.
    pub target_volume_cm3: f64,
    /// Voxels counted for this region.
    pub roi_voxels: usize,
    /// Region volume in cubic centimeters.
    pub roi_volume_cm3: f64,
    /// Region volume as a percentage of the target volume.
    pub roi_percent: f64,
}

/// Accumulating volumetry table for one marker list.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumetryTable {
    target_volume_cm3: f64,
    voxel_volume_cm3: f64,
    rows: Vec<VolumetryRow>,
    total_voxels: usize,
}

impl VolumetryTable {
    /// Create a table for a target segmentation volume (cm3) and the voxel
    /// spacing of the classified volume (mm per axis).
    #[must_use]
    pub fn new(target_volume_cm3: f64, spacing: [f64; 3]) -> Self {
        Self {
            target_volume_cm3,
            // mm3 per voxel, scaled to cm3.
            voxel_volume_cm3: spacing[0] * spacing[1] * spacing[2] * 0.001,
            rows: Vec::new(),
            total_voxels: 0,
        }
    }

    /// Append a row for a classified region and return it.
    pub fn add_region(&mut self, label: impl Into<String>, voxel_count: usize) -> VolumetryRow {
        let row = self.make_row(label.into(), voxel_count);
        self.total_voxels += voxel_count;
        self.rows.push(row.clone());
        row
    }

    /// Append the total row over every region added so far and return it.
    pub fn add_total(&mut self, list_name: &str) -> VolumetryRow {
        let row = self.make_row(format!("TotalVolume of List {list_name}"), self.total_voxels);
        self.rows.push(row.clone());
        row
    }

    fn make_row(&self, label: String, voxel_count: usize) -> VolumetryRow {
        let roi_volume_cm3 = voxel_count as f64 * self.voxel_volume_cm3;
        VolumetryRow {
            label,
            target_volume_cm3: self.target_volume_cm3,
            roi_voxels: voxel_count,
            roi_volume_cm3,
            roi_percent: roi_volume_cm3 / self.target_volume_cm3 * 100.0,
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[VolumetryRow] {
        &self.rows
    }

    #[must_use]
    pub const fn total_voxels(&self) -> usize {
        self.total_voxels
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_volume_and_percentage() {
        let mut table = VolumetryTable::new(100.0, [0.5, 0.5, 2.0]);
        let row = table.add_region("Segment 1", 4000);

        // 4000 voxels * 0.5 mm3 = 2000 mm3 = 2 cm3.
        assert!((row.roi_volume_cm3 - 2.0).abs() < 1e-12);
        assert!((row.roi_percent - 2.0).abs() < 1e-12);
        assert_eq!(row.roi_voxels, 4000);
    }

    #[test]
    fn test_total_row_accumulates_regions() {
        let mut table = VolumetryTable::new(50.0, [1.0, 1.0, 1.0]);
        table.add_region("A", 1000);
        table.add_region("B", 3000);
        let total = table.add_total("markers");

        assert_eq!(total.label, "TotalVolume of List markers");
        assert_eq!(total.roi_voxels, 4000);
        assert!((total.roi_volume_cm3 - 4.0).abs() < 1e-12);
        assert!((total.roi_percent - 8.0).abs() < 1e-12);
        assert_eq!(table.rows().len(), 3);
    }

    #[test]
    fn test_zero_voxel_region() {
        let mut table = VolumetryTable::new(10.0, [1.0, 1.0, 1.0]);
        let row = table.add_region("empty", 0);
        assert_eq!(row.roi_volume_cm3, 0.0);
        assert_eq!(row.roi_percent, 0.0);
    }
}

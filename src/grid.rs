//! Structured 3D grid holding the phase and temperature fields.
//!
//! Coordinates are in km with z pointing up; the surface sits at z = 0 so the
//! depth of a point is `-z`. Fields are stored flat, x varying fastest.

use crate::error::{ConfigError, Result};
use crate::thermal::{ProfileFrame, ThermalProfile};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where the grid points sit inside each element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointLayout {
    /// `count + 1` points per axis, including both extents.
    #[default]
    Nodes,
    /// `count` points per axis at element midpoints.
    CellCenters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub z: (f64, f64),
    pub elements: [usize; 3],
    #[serde(default)]
    pub layout: PointLayout,
    #[serde(default)]
    pub background_phase: i32,
    #[serde(default)]
    pub background_temperature: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    extents: [(f64, f64); 3],
    elements: [usize; 3],
    layout: PointLayout,
    coords: [Vec<f64>; 3],
    phase: Vec<i32>,
    temperature: Vec<f64>,
}

const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];

fn axis_coords(extent: (f64, f64), elements: usize, layout: PointLayout) -> Vec<f64> {
    let (min, max) = extent;
    let spacing = (max - min) / elements as f64;
    match layout {
        PointLayout::Nodes => (0..=elements)
            .map(|i| if i == elements { max } else { min + i as f64 * spacing })
            .collect(),
        PointLayout::CellCenters => (0..elements)
            .map(|i| min + (i as f64 + 0.5) * spacing)
            .collect(),
    }
}

impl Grid {
    pub fn allocate(params: GridParams) -> Result<Grid> {
        let extents = [params.x, params.y, params.z];
        for axis in 0..3 {
            let (min, max) = extents[axis];
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(ConfigError::Grid(format!(
                    "{} extent ({}, {}) must be finite and strictly increasing",
                    AXIS_NAMES[axis], min, max
                )));
            }
            if params.elements[axis] == 0 {
                return Err(ConfigError::Grid(format!(
                    "{} element count must be at least 1",
                    AXIS_NAMES[axis]
                )));
            }
        }

        let coords = [
            axis_coords(extents[0], params.elements[0], params.layout),
            axis_coords(extents[1], params.elements[1], params.layout),
            axis_coords(extents[2], params.elements[2], params.layout),
        ];
        let count = coords.iter().map(Vec::len).product();

        log::info!(
            "allocated {:?} grid {}x{}x{} ({} points)",
            params.layout,
            coords[0].len(),
            coords[1].len(),
            coords[2].len(),
            count
        );

        Ok(Grid {
            extents,
            elements: params.elements,
            layout: params.layout,
            coords,
            phase: vec![params.background_phase; count],
            temperature: vec![params.background_temperature; count],
        })
    }

    pub fn extents(&self) -> [(f64, f64); 3] {
        self.extents
    }

    pub fn elements(&self) -> [usize; 3] {
        self.elements
    }

    pub fn layout(&self) -> PointLayout {
        self.layout
    }

    /// Points per axis.
    pub fn shape(&self) -> [usize; 3] {
        [self.coords[0].len(), self.coords[1].len(), self.coords[2].len()]
    }

    pub fn point_count(&self) -> usize {
        self.phase.len()
    }

    pub fn coords(&self, axis: usize) -> &[f64] {
        &self.coords[axis]
    }

    pub fn flat_index(&self, index: [usize; 3]) -> usize {
        let [nx, ny, _] = self.shape();
        index[0] + nx * (index[1] + ny * index[2])
    }

    pub fn index_of(&self, flat: usize) -> [usize; 3] {
        let [nx, ny, _] = self.shape();
        [flat % nx, (flat / nx) % ny, flat / (nx * ny)]
    }

    /// Panics if `index` is out of bounds, like slice indexing.
    pub fn position_of(&self, index: [usize; 3]) -> DVec3 {
        DVec3::new(
            self.coords[0][index[0]],
            self.coords[1][index[1]],
            self.coords[2][index[2]],
        )
    }

    pub fn position_at(&self, flat: usize) -> DVec3 {
        self.position_of(self.index_of(flat))
    }

    /// True if `point` lies within the grid extents (inclusive).
    pub fn contains_point(&self, point: DVec3) -> bool {
        (0..3).all(|axis| {
            let (min, max) = self.extents[axis];
            point[axis] >= min && point[axis] <= max
        })
    }

    pub fn phase(&self) -> &[i32] {
        &self.phase
    }

    pub fn temperature(&self) -> &[f64] {
        &self.temperature
    }

    pub fn phase_at(&self, index: [usize; 3]) -> i32 {
        self.phase[self.flat_index(index)]
    }

    pub fn temperature_at(&self, index: [usize; 3]) -> f64 {
        self.temperature[self.flat_index(index)]
    }

    /// Both fields, mutably, for painting and global adjustments.
    pub fn fields_mut(&mut self) -> (&mut [i32], &mut [f64]) {
        (&mut self.phase, &mut self.temperature)
    }

    /// Distinct phase IDs present in the phase field.
    pub fn phase_ids(&self) -> BTreeSet<i32> {
        self.phase.iter().copied().collect()
    }

    /// Overwrite the whole temperature field from a profile evaluated at
    /// depth `-z` and lateral position `x`, framed by the grid's own extents.
    pub fn fill_temperature(&mut self, profile: &ThermalProfile) -> Result<()> {
        profile.validate()?;
        let frame = ProfileFrame {
            depth_extent: -self.extents[2].0,
            lateral: self.extents[0],
        };
        for flat in 0..self.temperature.len() {
            let position = self.position_at(flat);
            self.temperature[flat] = profile.evaluate(-position.z, position.x, &frame);
        }
        Ok(())
    }
}

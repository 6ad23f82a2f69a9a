//! Paints ordered regions onto the grid's phase and temperature fields.
//!
//! Every grid point is handled independently: it walks the full region list
//! in order and each region that contains it overwrites both its phase and
//! its temperature. Points are distributed over rayon workers; regions are
//! never reordered or processed concurrently.

use crate::error::{ConfigError, GeometryWarning, Result};
use crate::grid::Grid;
use crate::region::{LocalFrame, Region};
use crate::thermal::{ProfileFrame, ThermalAdjustment};
use glam::DVec3;
use rayon::prelude::*;

/// Outcome of painting a region sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaintReport {
    /// Points inside each region, in region order.
    pub painted: Vec<usize>,
    pub warnings: Vec<GeometryWarning>,
}

struct PreparedRegion<'a> {
    region: &'a Region,
    frame: LocalFrame,
    profile_frame: ProfileFrame,
}

impl<'a> PreparedRegion<'a> {
    fn new(region: &'a Region) -> Self {
        let frame = region.frame();
        Self {
            region,
            frame,
            profile_frame: frame.profile_frame(),
        }
    }

    fn contains(&self, position: DVec3) -> bool {
        self.frame.contains(self.frame.to_local(position))
    }

    fn paint_point(&self, position: DVec3, phase: &mut i32, temperature: &mut f64) {
        let local = self.frame.to_local(position);
        if !self.frame.contains(local) {
            return;
        }
        let depth = self.frame.depth(local);

        if let Some(layer_phase) = self.region.layer_phase(depth) {
            *phase = layer_phase;
        }
        if let Some(profile) = &self.region.thermal {
            *temperature = profile.evaluate(depth, local.x, &self.profile_frame);
        }
        if let Some(tlab) = self.region.tlab {
            if *temperature > tlab {
                *phase = self.region.asthenosphere_phase;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionPainter {
    strict: bool,
}

impl RegionPainter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A painter that fails instead of warning when a region misses the grid.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn apply(&self, grid: &mut Grid, region: &Region) -> Result<PaintReport> {
        self.apply_all(grid, std::slice::from_ref(region))
    }

    /// Paint `regions` in order; later regions replace earlier ones where they overlap.
    pub fn apply_all(&self, grid: &mut Grid, regions: &[Region]) -> Result<PaintReport> {
        for region in regions {
            region.validate()?;
        }

        let prepared: Vec<PreparedRegion> = regions.iter().map(PreparedRegion::new).collect();
        let positions: Vec<DVec3> = (0..grid.point_count())
            .into_par_iter()
            .map(|flat| grid.position_at(flat))
            .collect();

        let report = self.survey(grid, &prepared, &positions)?;

        let (phase, temperature) = grid.fields_mut();
        phase
            .par_iter_mut()
            .zip(temperature.par_iter_mut())
            .zip(positions.par_iter())
            .for_each(|((phase, temperature), &position)| {
                for region in &prepared {
                    region.paint_point(position, phase, temperature);
                }
            });

        Ok(report)
    }

    /// Count hits per region and collect geometry warnings before anything is written.
    fn survey(&self, grid: &Grid, prepared: &[PreparedRegion], positions: &[DVec3]) -> Result<PaintReport> {
        let mut report = PaintReport::default();
        let (grid_min, grid_max) = {
            let [x, y, z] = grid.extents();
            (DVec3::new(x.0, y.0, z.0), DVec3::new(x.1, y.1, z.1))
        };

        for region in prepared {
            let painted = positions
                .par_iter()
                .filter(|&&position| region.contains(position))
                .count();
            let name = region.region.name.clone();
            log::debug!("region '{}' covers {} grid points", name, painted);

            let warning = if painted == 0 {
                if self.strict {
                    return Err(ConfigError::Region {
                        name,
                        reason: "does not intersect the grid".to_string(),
                    });
                }
                Some(GeometryWarning::NoIntersection { region: name })
            } else {
                let (lo, hi) = region.frame.world_bounds();
                let inside = grid.contains_point(lo) && grid.contains_point(hi);
                let touches = lo.cmple(grid_max).all() && hi.cmpge(grid_min).all();
                if !inside && touches {
                    Some(GeometryWarning::PartialIntersection { region: name, painted })
                } else {
                    None
                }
            };

            if let Some(warning) = warning {
                log::warn!("{}", warning);
                report.warnings.push(warning);
            }
            report.painted.push(painted);
        }
        Ok(report)
    }

    /// Global temperature adjustment applied after painting.
    pub fn apply_adjustment(&self, grid: &mut Grid, adjustment: &ThermalAdjustment) {
        adjustment.apply_to(grid);
    }
}

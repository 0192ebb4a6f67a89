//! Seed strategy: concentric growth from an interior point.

use super::{
    connect_area, connect_paths, contour_rings, finish_paths, last_position, order_paths,
    pass_step, tool_centre_region, ClearOptions, PassStrategy,
};
use crate::error::{ClearingError, ClearingResult};
use crate::geometry;
use geo::{BoundingRect, Coord, InteriorPoint, LineString, Polygon};

/// Circles around a seed point of each tool-centre component, growing by
/// one step until they pass the component's far corner, clipped to the
/// component.
#[derive(Debug, Clone, Copy, Default)]
pub struct Seed;

impl PassStrategy for Seed {
    fn name(&self) -> &'static str {
        "Seed"
    }

    fn clear(
        &self,
        polygon: &Polygon,
        diameter: f64,
        overlap: f64,
        options: &ClearOptions,
    ) -> ClearingResult<Vec<LineString>> {
        let step = pass_step(diameter, overlap)?;
        let region = tool_centre_region(polygon, diameter)?;

        let mut paths = Vec::new();
        let mut start = None;
        for component in region.iter() {
            let seed = match component.interior_point() {
                Some(p) => p.0,
                None => continue,
            };
            let Some(bbox) = component.bounding_rect() else {
                continue;
            };
            start.get_or_insert(seed);

            let reach = [
                bbox.min(),
                bbox.max(),
                Coord { x: bbox.min().x, y: bbox.max().y },
                Coord { x: bbox.max().x, y: bbox.min().y },
            ]
            .iter()
            .map(|c| geometry::distance(seed, *c))
            .fold(0.0, f64::max);

            let circles: Vec<LineString> = (1..)
                .map(|k| (k as f64 - 0.5) * step)
                .take_while(|radius| *radius <= reach + step)
                .map(|radius| geometry::circle(seed, radius))
                .collect();

            let area = geometry::to_multi(component.clone());
            let arcs = geometry::clip_lines(&circles, &area);
            let mut ordered = order_paths(arcs, seed);
            if options.connect {
                ordered = connect_paths(ordered, &connect_area(&area, diameter), diameter);
            }
            paths.extend(ordered);
        }

        let start = start.ok_or(ClearingError::UnclearableGeometry { diameter })?;
        if options.contour || paths.is_empty() {
            let pos = last_position(&paths, start);
            paths.extend(contour_rings(&region, pos));
        }

        Ok(finish_paths(paths, options.milling))
    }
}

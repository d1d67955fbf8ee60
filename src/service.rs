/// Request-level operations: cell ids, GeoJSON grids and record-count grids
/// for a bounding box or the whole globe.

use std::collections::BTreeSet;

use h3o::{CellIndex, Resolution};
use tracing::info;

use crate::config::SeeH3Config;
use crate::constants::MATCH_ALL_QUERY;
use crate::density;
use crate::error::Result;
use crate::features::{self, FeatureCollection};
use crate::global_grid;
use crate::polygon_cells;
use crate::record_counts::{self, BucketCountSource};
use crate::region::{self, BoundingBox};

/// Cells for a region, or for the globe when `bb` is `None`.
///
/// Regions go through the polygon resolver (adaptive when `resolution` is
/// `None`, targeting `min_cells` or else `config.default_min_cells`); the
/// globe is expanded at `resolution`, defaulting to 0 and capped at 4.
pub fn cells_for_region(
    config: &SeeH3Config,
    bb: Option<&BoundingBox>,
    resolution: Option<Resolution>,
    min_cells: Option<usize>,
    exclude_poles: bool,
) -> BTreeSet<CellIndex> {
    match bb {
        Some(bb) => {
            let min_cells = min_cells.unwrap_or(config.default_min_cells);
            polygon_cells::polygon_to_cells(&bb.ring(), resolution, min_cells, exclude_poles).cells
        }
        None => {
            let res = resolution.map_or(0, |r| i32::from(u8::from(r)));
            global_grid::global_cells(res, exclude_poles)
        }
    }
}

/// GeoJSON grid of the cells for a region
pub fn grid_for_region(
    config: &SeeH3Config,
    bb: Option<&BoundingBox>,
    resolution: Option<Resolution>,
    min_cells: Option<usize>,
    exclude_poles: bool,
) -> FeatureCollection {
    let cells = cells_for_region(config, bb, resolution, min_cells, exclude_poles);
    features::cells_to_features(&cells, None)
}

/// Search query for a counts request: the caller's query and the box filter
/// joined with `AND`, whichever are present, else match-all.
pub fn counts_query(config: &SeeH3Config, bb: Option<&BoundingBox>, q: Option<&str>) -> String {
    let filter = bb.map(|bb| bb.spatial_filter(&config.location_field));
    match (q, filter) {
        (Some(q), Some(filter)) => format!("{q} AND {filter}"),
        (Some(q), None) => q.to_string(),
        (None, Some(filter)) => filter,
        (None, None) => MATCH_ALL_QUERY.to_string(),
    }
}

/// GeoJSON grid of the cells holding records that match `q` within `bb`,
/// each annotated with its normalized record count.
///
/// The box is clipped to valid coordinates first. Without an explicit
/// resolution one is estimated from the box width.
pub async fn counts_for_region<S>(
    source: &S,
    config: &SeeH3Config,
    bb: Option<&BoundingBox>,
    resolution: Option<Resolution>,
    q: Option<&str>,
    exclude_poles: bool,
) -> Result<FeatureCollection>
where
    S: BucketCountSource + ?Sized,
{
    let clipped = bb.map(BoundingBox::clipped);
    let resolution = resolution.unwrap_or_else(|| region::estimate_resolution(clipped.as_ref()));
    let query = counts_query(config, clipped.as_ref(), q);
    let bucket_field = config.bucket_field(resolution);

    info!(%query, resolution = u8::from(resolution), "record count grid");

    let counts = record_counts::get_record_counts(source, &query, &bucket_field, exclude_poles).await?;
    let cells: BTreeSet<CellIndex> = counts.keys().copied().collect();
    let props = density::density_properties(&counts);

    Ok(features::cells_to_features(&cells, Some(&props)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_query_combinations() {
        let config = SeeH3Config::default();
        let bb = BoundingBox::new(-10.0, -5.0, 10.0, 5.0);
        let filter = "producedBy_samplingSite_location_ll:[-5,-10 TO 5,10]";

        assert_eq!(counts_query(&config, None, None), "*:*");
        assert_eq!(counts_query(&config, None, Some("source:SESAR")), "source:SESAR");
        assert_eq!(counts_query(&config, Some(&bb), None), filter);
        assert_eq!(
            counts_query(&config, Some(&bb), Some("source:SESAR")),
            format!("source:SESAR AND {filter}")
        );
    }

    #[test]
    fn test_global_default_resolution() {
        let cells = cells_for_region(&SeeH3Config::default(), None, None, None, true);
        assert!(cells.iter().all(|c| c.resolution() == Resolution::Zero));
        assert_eq!(cells.len(), 120);
    }

    #[test]
    fn test_global_resolution_capped() {
        let cells = cells_for_region(&SeeH3Config::default(), None, Some(Resolution::Seven), None, false);
        assert!(cells.iter().all(|c| c.resolution() == Resolution::Four));
    }

    #[test]
    fn test_region_min_cells_falls_back_to_config() {
        let bb: BoundingBox = "5,45,7,47".parse().unwrap();
        let config = SeeH3Config {
            default_min_cells: 40,
            ..SeeH3Config::default()
        };

        let defaulted = cells_for_region(&config, Some(&bb), None, None, true);
        let explicit = cells_for_region(&config, Some(&bb), None, Some(40), true);
        assert!(defaulted.len() >= 40);
        assert_eq!(defaulted, explicit);

        let looser = cells_for_region(&config, Some(&bb), None, Some(1), true);
        assert!(looser.len() < defaulted.len());
    }
}

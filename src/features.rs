/// GeoJSON features for sets of H3 cells
///
/// Each cell becomes one `Feature` per antimeridian-split piece of its
/// boundary. Every piece carries the same properties: the cell id, its area
/// in km² and whatever per-cell payload the caller supplies (record counts,
/// for instance).

use std::collections::{BTreeSet, HashMap};

use h3o::CellIndex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::antimeridian::{self, Ring};
use crate::constants::{PROP_AREA_KM2, PROP_CELL, PROP_CELL_SET};

/// Extra properties to attach, keyed by cell
pub type CellProperties = HashMap<CellIndex, Map<String, Value>>;

/// GeoJSON geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
}

impl Geometry {
    /// Polygon with a single exterior ring
    pub fn polygon(ring: &[(f64, f64)]) -> Self {
        Geometry::Polygon {
            coordinates: vec![ring.iter().map(|&(lng, lat)| [lng, lat]).collect()],
        }
    }

    /// Exterior ring as `(lng, lat)` pairs
    #[cfg(test)]
    pub fn exterior(&self) -> Ring {
        match self {
            Geometry::Polygon { coordinates } => coordinates
                .first()
                .map(|ring| ring.iter().map(|&[lng, lat]| (lng, lat)).collect())
                .unwrap_or_default(),
        }
    }
}

/// GeoJSON `Feature`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

/// GeoJSON `FeatureCollection` with a top-level property listing its cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    pub properties: Map<String, Value>,
}

impl FeatureCollection {
    /// Cell ids recorded in the top-level properties
    pub fn cell_ids(&self) -> Vec<String> {
        self.properties
            .get(PROP_CELL_SET)
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
            .unwrap_or_default()
    }
}

/// Boundary of a cell as a `(lng, lat)` ring
pub fn cell_boundary_ring(cell: CellIndex) -> Ring {
    cell.boundary()
        .iter()
        .map(|latlng| (latlng.lng(), latlng.lat()))
        .collect()
}

/// Base properties of a cell: id and area in km²
pub fn cell_properties(cell: CellIndex) -> Map<String, Value> {
    let mut props = Map::new();
    props.insert(PROP_CELL.to_owned(), Value::String(cell.to_string()));
    props.insert(PROP_AREA_KM2.to_owned(), Value::from(cell.area_km2()));
    props
}

/// Features for one cell, more than one when the boundary is split on the
/// antimeridian
pub fn cell_to_features(cell: CellIndex, extra: Option<&Map<String, Value>>) -> Vec<Feature> {
    let mut properties = cell_properties(cell);
    if let Some(extra) = extra {
        properties.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    antimeridian::split(&cell_boundary_ring(cell))
        .iter()
        .map(|ring| Feature {
            geometry: Geometry::polygon(ring),
            properties: properties.clone(),
        })
        .collect()
}

/// Feature collection for a set of cells
///
/// `cell_props` entries are merged into the matching cell's properties;
/// cells without an entry get only the base properties.
pub fn cells_to_features(
    cells: &BTreeSet<CellIndex>,
    cell_props: Option<&CellProperties>,
) -> FeatureCollection {
    let features = cells
        .iter()
        .flat_map(|&cell| cell_to_features(cell, cell_props.and_then(|props| props.get(&cell))))
        .collect();

    let ids: Vec<Value> = cells.iter().map(|c| Value::String(c.to_string())).collect();
    let mut properties = Map::new();
    properties.insert(PROP_CELL_SET.to_owned(), Value::Array(ids));

    FeatureCollection {
        features,
        properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use h3o::{LatLng, Resolution};
    use serde_json::json;

    fn cell(lat: f64, lng: f64, res: Resolution) -> CellIndex {
        LatLng::new(lat, lng).unwrap().to_cell(res)
    }

    #[test]
    fn test_inland_cell_single_feature() {
        let c = cell(48.85, 2.35, Resolution::Five);
        let features = cell_to_features(c, None);
        assert_eq!(features.len(), 1);

        let props = &features[0].properties;
        assert_eq!(props[PROP_CELL], json!(c.to_string()));
        assert!(props[PROP_AREA_KM2].as_f64().unwrap() > 0.0);

        let ring = features[0].geometry.exterior();
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring.len(), c.boundary().iter().count() + 1);
    }

    #[test]
    fn test_caller_properties_merged() {
        let a = cell(10.0, 10.0, Resolution::Three);
        let b = cell(-10.0, -50.0, Resolution::Three);
        let cells: BTreeSet<_> = [a, b].into_iter().collect();

        let mut extra = Map::new();
        extra.insert("n".to_owned(), json!(7));
        let props: CellProperties = [(a, extra)].into_iter().collect();

        let fc = cells_to_features(&cells, Some(&props));
        for feature in &fc.features {
            let id = feature.properties[PROP_CELL].as_str().unwrap();
            if id == a.to_string() {
                assert_eq!(feature.properties["n"], json!(7));
            } else {
                assert!(feature.properties.get("n").is_none());
            }
        }

        let mut ids = fc.cell_ids();
        ids.sort();
        let mut expected = vec![a.to_string(), b.to_string()];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_geojson_shape() {
        let cells: BTreeSet<_> = [cell(0.0, 0.0, Resolution::Two)].into_iter().collect();
        let value = serde_json::to_value(cells_to_features(&cells, None)).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["geometry"]["type"], "Polygon");
        assert!(value["properties"][PROP_CELL_SET].is_array());

        let back: FeatureCollection = serde_json::from_value(value).unwrap();
        assert_eq!(back.features.len(), 1);
    }

    #[test]
    fn test_empty_set() {
        let fc = cells_to_features(&BTreeSet::new(), None);
        assert!(fc.features.is_empty());
        assert!(fc.cell_ids().is_empty());
    }
}

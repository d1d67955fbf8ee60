use h3o::Resolution;

// Grid limits
pub const MAX_GLOBAL_RESOLUTION: u8 = 4; // full-sphere expansion cap
pub const MAX_ADAPTIVE_RESOLUTION: Resolution = Resolution::Fifteen;
pub const DEFAULT_MIN_CELLS: usize = 10;
pub const RES0_CELL_COUNT: usize = 122;

// Longitude geometry
pub const ANTIMERIDIAN_LNG: f64 = 180.0;
pub const FULL_TURN_DEG: f64 = 360.0;
pub const POLE_LAT: f64 = 90.0;

// GeoJSON property keys
pub const PROP_CELL: &str = "h3";
pub const PROP_AREA_KM2: &str = "km2";
pub const PROP_CELL_SET: &str = "h3_cells";
pub const PROP_COUNT: &str = "n";
pub const PROP_RELATIVE: &str = "rn";
pub const PROP_LOG_RELATIVE: &str = "ln";

// Aggregation service
pub const COUNT_KEY: &str = "count(*)";
pub const MATCH_ALL_QUERY: &str = "*:*";

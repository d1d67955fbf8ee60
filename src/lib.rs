pub mod antimeridian;
pub mod config;
pub mod constants;
pub mod density;
pub mod error;
pub mod features;
pub mod global_grid;
pub mod pole_registry;
pub mod polygon_cells;
pub mod record_counts;
pub mod region;
pub mod service;

pub use config::SeeH3Config;
pub use error::{Result, SeeH3Error};

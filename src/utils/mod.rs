pub mod config;
pub mod imgbatch_toml;
pub mod logger;
pub mod tempfiles;

pub use config::*;
pub use logger::setup_logging;
pub use tempfiles::{remove_temp, temp_path_for, write_via_temp};

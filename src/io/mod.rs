pub mod config_file;
pub mod demand;
pub mod reporting;

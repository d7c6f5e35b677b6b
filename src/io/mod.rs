pub mod csv_import;
mod file;

pub use file::{load_config, load_tasks};

pub mod config;
pub mod engine;
pub mod framework;
pub mod input;
pub mod prelude;
pub mod render;
pub mod runtime;

pub use runtime::app::{run, run_config_file, run_with_channels};

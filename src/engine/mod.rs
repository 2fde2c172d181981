//! Engine: cancellation, strategies, per-task execution, CLI plumbing.

pub mod arg_parser;
pub mod cancel;
pub mod cli;
pub mod executor;
pub mod progress;
pub mod strategies;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cancel::{CancellationSignal, watch_for_esc};
pub use cli::{handle_run, setup_opts};
pub use executor::TransformExecutor;
pub use strategies::{
    CopyStrategy, NegateStrategy, RemoveStrategy, ScaleStrategy, StrategyOpts, Transform,
    negate_pixels, output_format, scaled_dimensions,
};
pub use tools::{has_image_extension, is_image_file, path_relative_to};

pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{generate_default_monthly_filename, output_file_path};
pub use progress::ProgressReporter;

use crate::models::{ClimateVariable, GridSquareId};
use std::path::{Path, PathBuf};

/// Default monthly series file: output/{mesh_code}-{variable}-monthly.tsv
pub fn generate_default_monthly_filename(id: &GridSquareId, variable: ClimateVariable) -> PathBuf {
    let filename = format!("{}-{}-monthly.tsv", id, variable.file_stem());
    PathBuf::from("output").join(filename)
}

/// Join a report file name onto the output directory
pub fn output_file_path(output_dir: &Path, file_name: &str) -> PathBuf {
    output_dir.join(file_name)
}

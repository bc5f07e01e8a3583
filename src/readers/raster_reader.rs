use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::readers::raster_decoder::PixelGrid;

/// Load a PNG as RGB components, or RGBA when the file carries alpha
pub fn read_pixels(path: &Path) -> Result<PixelGrid> {
    let image = image::open(path)?;

    let grid = if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        PixelGrid::from_raw(height as usize, width as usize, 4, rgba.into_raw())?
    } else {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        PixelGrid::from_raw(height as usize, width as usize, 3, rgb.into_raw())?
    };

    debug!(
        "Read {}x{} pixels from {}",
        grid.rows(),
        grid.cols(),
        path.display()
    );
    Ok(grid)
}

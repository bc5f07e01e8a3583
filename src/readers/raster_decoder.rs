use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{ProcessingError, Result};
use crate::models::RasterGrid;
use crate::readers::GeologyLegend;
use crate::utils::constants::{DATA_PNG_CHANNELS, DATA_PNG_NO_DATA, DATA_PNG_SCALE};

/// Maximum number of 8-bit components packed into one integer
pub const MAX_CHANNELS: usize = 4;

/// How a real value is stored in the leading components of a pixel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_value_encoding"))]
pub struct ValueEncoding {
    #[validate(range(min = 1, max = 4))]
    pub channels: usize,
    /// Read the packed integer as two's complement of `8 * channels` bits
    pub signed: bool,
    pub scale: f64,
    pub offset: f64,
    /// Packed integer that marks a no-data cell
    pub no_data: Option<u32>,
}

impl Default for ValueEncoding {
    fn default() -> Self {
        Self {
            channels: DATA_PNG_CHANNELS,
            signed: true,
            scale: DATA_PNG_SCALE,
            offset: 0.0,
            no_data: Some(DATA_PNG_NO_DATA),
        }
    }
}

fn validate_value_encoding(encoding: &ValueEncoding) -> std::result::Result<(), ValidationError> {
    if !encoding.scale.is_finite() || encoding.scale == 0.0 || !encoding.offset.is_finite() {
        return Err(ValidationError::new("scale_and_offset"));
    }
    Ok(())
}

/// How a category code is stored; categorical pixels have no scale or offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoding {
    pub channels: usize,
    pub no_data: Option<u32>,
}

impl Default for CategoryEncoding {
    fn default() -> Self {
        Self {
            channels: DATA_PNG_CHANNELS,
            no_data: None,
        }
    }
}

/// Row-major pixel components, every pixel carrying the same component count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    rows: usize,
    cols: usize,
    components: usize,
    samples: Vec<u8>,
}

impl PixelGrid {
    /// Wrap an interleaved sample buffer such as `image::RgbImage::into_raw`
    pub fn from_raw(rows: usize, cols: usize, components: usize, samples: Vec<u8>) -> Result<Self> {
        if samples.len() != rows * cols * components {
            return Err(ProcessingError::MalformedRaster(format!(
                "{} samples do not fill {}x{} pixels of {} components",
                samples.len(),
                rows,
                cols,
                components
            )));
        }
        Ok(Self {
            rows,
            cols,
            components,
            samples,
        })
    }

    /// Build from nested rows of component tuples
    pub fn from_rows(rows: Vec<Vec<Vec<u8>>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let components = rows
            .iter()
            .flatten()
            .map(Vec::len)
            .min()
            .unwrap_or(0);
        let row_count = rows.len();
        let mut samples = Vec::with_capacity(row_count * cols * components);

        for (row_index, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(ProcessingError::MalformedRaster(format!(
                    "row {} has {} pixels, expected {}",
                    row_index,
                    row.len(),
                    cols
                )));
            }
            for (col_index, pixel) in row.into_iter().enumerate() {
                if pixel.len() != components {
                    return Err(ProcessingError::MalformedRaster(format!(
                        "pixel ({}, {}) has {} components, expected {}",
                        row_index,
                        col_index,
                        pixel.len(),
                        components
                    )));
                }
                samples.extend(pixel);
            }
        }

        Ok(Self {
            rows: row_count,
            cols,
            components,
            samples,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn components(&self) -> usize {
        self.components
    }

    fn pixels(&self) -> impl Iterator<Item = &[u8]> + '_ {
        // chunks_exact panics on 0, and a zero-component grid has no samples
        self.samples.chunks_exact(self.components.max(1))
    }

    fn check_channels(&self, channels: usize) -> Result<()> {
        if !(1..=MAX_CHANNELS).contains(&channels) {
            return Err(ProcessingError::MalformedRaster(format!(
                "channel count {} outside 1..={}",
                channels, MAX_CHANNELS
            )));
        }
        if self.rows * self.cols > 0 && self.components < channels {
            return Err(ProcessingError::MalformedRaster(format!(
                "pixels have {} components, {} channels requested",
                self.components, channels
            )));
        }
        Ok(())
    }
}

/// Pack components into one integer, first component most significant
///
/// Component `i` of `n` contributes `value * 256^(n-1-i)`, so an RGB pixel
/// packs to `R * 65536 + G * 256 + B`.
pub fn pack_components(components: &[u8]) -> u32 {
    components
        .iter()
        .fold(0u32, |acc, &c| (acc << 8) | u32::from(c))
}

/// Inverse of `pack_components` for `channels` components
pub fn split_components(packed: u32, channels: usize) -> Vec<u8> {
    (0..channels)
        .rev()
        .map(|i| ((packed >> (8 * i)) & 0xFF) as u8)
        .collect()
}

fn to_signed(packed: u32, channels: usize) -> i64 {
    let bits = 8 * channels as u32;
    let packed = i64::from(packed);
    if packed >= 1i64 << (bits - 1) {
        packed - (1i64 << bits)
    } else {
        packed
    }
}

/// Decode a real-valued raster; the sentinel and only the sentinel is no-data
pub fn decode_values(pixels: &PixelGrid, encoding: &ValueEncoding) -> Result<RasterGrid<f64>> {
    pixels.check_channels(encoding.channels)?;

    let cells = pixels
        .pixels()
        .map(|pixel| {
            let packed = pack_components(&pixel[..encoding.channels]);
            if encoding.no_data == Some(packed) {
                return None;
            }
            let raw = if encoding.signed {
                to_signed(packed, encoding.channels)
            } else {
                i64::from(packed)
            };
            Some(raw as f64 * encoding.scale + encoding.offset)
        })
        .collect();

    RasterGrid::from_cells(pixels.rows(), pixels.cols(), cells)
}

/// Decode a categorical raster
///
/// With a legend the packed color is looked up and unlisted colors become
/// no-data; without one the packed integer is the code itself.
pub fn decode_categories(
    pixels: &PixelGrid,
    encoding: &CategoryEncoding,
    legend: Option<&GeologyLegend>,
) -> Result<RasterGrid<u32>> {
    pixels.check_channels(encoding.channels)?;

    let cells = pixels
        .pixels()
        .map(|pixel| {
            let packed = pack_components(&pixel[..encoding.channels]);
            if encoding.no_data == Some(packed) {
                return None;
            }
            match legend {
                Some(legend) => legend.code_for(packed),
                None => Some(packed),
            }
        })
        .collect();

    RasterGrid::from_cells(pixels.rows(), pixels.cols(), cells)
}

/// Packed integer that decodes back to `value` within one quantization step
///
/// `None` when the value is not finite, does not fit the channel width, or
/// would collide with the no-data sentinel.
pub fn encode_value(value: f64, encoding: &ValueEncoding) -> Option<u32> {
    if !value.is_finite() || !(1..=MAX_CHANNELS).contains(&encoding.channels) {
        return None;
    }

    let bits = 8 * encoding.channels as u32;
    let raw = ((value - encoding.offset) / encoding.scale).round();
    let (min, max) = if encoding.signed {
        (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
    } else {
        (0, (1i64 << bits) - 1)
    };
    if raw < min as f64 || raw > max as f64 {
        return None;
    }

    let raw = raw as i64;
    let packed = if raw < 0 { raw + (1i64 << bits) } else { raw };
    let packed = u32::try_from(packed).ok()?;

    if encoding.no_data == Some(packed) {
        return None;
    }
    Some(packed)
}

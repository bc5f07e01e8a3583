pub mod dataset;
pub mod land_use_reader;
pub mod legend_reader;
pub mod raster_decoder;
pub mod raster_reader;
pub mod series_reader;

pub use dataset::{DatasetContext, GridSquareDataset};
pub use land_use_reader::LandUseReader;
pub use legend_reader::GeologyLegend;
pub use raster_decoder::{
    decode_categories, decode_values, encode_value, pack_components, split_components,
    CategoryEncoding, PixelGrid, ValueEncoding,
};
pub use raster_reader::read_pixels;
pub use series_reader::SeriesReader;

pub mod canvas;
pub mod capture;
pub mod decoder;
pub mod gpu;
pub mod raster;

pub use canvas::{Canvas, Color, Palette};
pub use decoder::{GridView, is_alive};
pub use raster::CellRasterizer;

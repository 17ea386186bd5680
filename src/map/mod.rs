use std::{error, io};

use clap_derive::ValueEnum;
use derive_more::{Display, From};

/// Country outlines and where they come from.
mod geometry;
pub use geometry::{Geometry, GeometrySource, Ring, ShapefileSource};

/// Drawing and caching of the map images.
mod renderer;
pub use renderer::{MapImage, MapRenderer};

#[derive(Debug, From, Display)]
pub enum MapError {
    IoError(io::Error),
    ShapefileError(shapefile::Error),
    /// Plotters errors are generic over the backend, so we keep the message
    #[display("error while drawing the map: {_0}")]
    #[from(ignore)]
    DrawingError(String),
    #[display("no geometry named {_0}")]
    #[from(ignore)]
    NotFound(String),
    #[display("{_1} geometries named {_0}")]
    #[from(ignore)]
    Ambiguous(String, usize),
}

impl error::Error for MapError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            MapError::IoError(e) => Some(e),
            MapError::ShapefileError(e) => Some(e),
            _ => None,
        }
    }
}

/// The file format the map images are stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Display)]
pub enum ImageFormat {
    #[default]
    #[display("png")]
    Png,
    #[display("svg")]
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

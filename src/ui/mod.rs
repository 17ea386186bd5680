/// ASCII rendering of raster maps for the terminal.
mod preview;
pub use preview::ascii_preview;

/// The interactive terminal front end.
mod terminal;
pub use terminal::Terminal;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("path must have at least two points")]
    PathTooShort,
    #[error("symbol block must contain at least one symbol")]
    EmptySymbolBlock,
    #[error("minZoom ({min_zoom}) must be <= maxZoom ({max_zoom})")]
    InvalidZoomRange { min_zoom: u8, max_zoom: u8 },
}

/// Error type shared by every module of the core
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("terrain query ({x}, {z}) outside {width}x{depth} grid")]
    OutOfBounds {
        x: f32,
        z: f32,
        width: usize,
        depth: usize,
    },

    #[error("invalid elevation grid: {0}")]
    InvalidGrid(String),

    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("invalid camera settings: {0}")]
    InvalidSettings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode heightmap: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid scene configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry(message.into())
    }
}

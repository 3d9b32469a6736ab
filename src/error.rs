//! Custom error types and result handling for Seihon operations.
//!
//! This module defines the error taxonomy used throughout the binding pipeline.
//! All operations return a [`Result<T>`] which is a type alias for `std::result::Result<T, Error>`.
//!
//! Only [`Error::DecodeFailure`] is recoverable: the offending file is skipped and
//! logged. Every other variant aborts the pipeline, see [`Error::is_fatal`].
use std::path::PathBuf;

/// Type alias for Results with Seihon errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all Seihon operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Image encoding errors
    #[error(transparent)]
    Image(#[from] image::ImageError),
    /// EPUB generation errors
    #[error(transparent)]
    Epub(#[from] epub_builder::Error),
    /// ZIP file operation errors
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// Async task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    PackerBuilder(#[from] crate::packer::PackerConfigBuilderError),
    /// A file could not be decoded as an image. Never fatal.
    #[error("File '{}' is not a decodable image: {reason}", path.display())]
    DecodeFailure { path: PathBuf, reason: String },
    /// A decoded image cannot produce sub-views, so it can be neither cropped nor split.
    #[error("Image '{}' does not support cropping ({kind})", path.display())]
    UnsupportedImageKind { path: PathBuf, kind: String },
    /// The configured double-page mode is not one of the known modes.
    #[error("Unknown double page mode '{0}'")]
    UnknownDoublePageMode(String),
    /// Walking the source tree failed.
    #[error("Failed to walk directory '{}': {source}", path.display())]
    TraversalFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Processing finished without a single usable page.
    #[error("No images found in the directory '{}'", .0.display())]
    EmptyLibrary(PathBuf),
    /// Error for invalid file or directory paths
    #[error("The given path '{}' is invalid: {}", .0.display(), .1)]
    InvalidPath(PathBuf, String),
    /// Error for resources that couldn't be found (e.g., source directory)
    #[error("Not found: {0}")]
    NotFound(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Whether this error must stop the whole pipeline.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::DecodeFailure { .. })
    }
}

// Basic From<String> conversion for convenience
impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

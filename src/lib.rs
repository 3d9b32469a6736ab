//! Seihon - Manga Page Binding Library
//!
//! This crate turns a directory tree of manga page images into a single
//! chaptered ebook. Every page is decoded, stripped of uniform margins, split
//! when it turns out to be a two-page spread, and finally ordered and grouped
//! into chapters following the source directory layout.
//!
//! # Getting Started
//!
//! ```rust,no_run
//! use seihon::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> seihon::error::Result<()> {
//!     let config = PackerConfig::builder()
//!         .root_dir("./my_manga/series_a")
//!         .title("Series A")
//!         .reading_direction(Direction::Rtl)
//!         .double_page_mode(DoublePageMode::SplitOnly)
//!         .output_format(FileFormat::Epub)
//!         .build()?;
//!
//!     config.preflight_check()?;
//!     let written = config.pack().await?;
//!     println!("Wrote {:?}", written);
//!     Ok(())
//! }
//! ```
//!
//! The stages are usable on their own as well: [`crop`] for border detection
//! and splitting, [`pipeline::PagePipeline`] for concurrent processing,
//! [`sequencer`] and [`chapters`] for ordering and grouping, and
//! [`generator`] for writing a [`types::Book`].

pub mod chapters;
pub mod crop;
pub mod error;
pub mod generator;
pub mod packer;
pub mod page;
pub mod pipeline;
pub mod progress;
pub mod sequencer;
pub mod types;
pub mod walker;

pub use packer::{PackerConfig, PackerConfigBuilder};

pub use types::{
    Book, Chapter, Direction, DoublePageMode, EbookMetadata, FileFormat, FileItem, PageRef,
    PageResult,
};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits, allowing you to
/// import everything you need with a single `use seihon::prelude::*;` statement.
pub mod prelude {
    pub use super::{
        Book, Chapter, Direction, DoublePageMode, EbookMetadata, FileFormat, FileItem,
        PackerConfig, PackerConfigBuilder, PageRef, PageResult, error, generator, types,
    };
    pub use crate::page::{Croppable, Decoded, FileDecoder, PageDecoder, PageImage, Rect};
    pub use crate::pipeline::{PagePipeline, PipelineOptions};
    pub use crate::progress::{LogProgress, NoProgress, Progress};
    pub use std::path::{Path, PathBuf};
}

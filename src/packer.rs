use std::path::{Path, PathBuf};

use tokio::fs;

use crate::chapters::assemble_book;
use crate::crop::DEFAULT_MARGIN_FRACTION;
use crate::error::{Error, Result};
use crate::generator::{cbz::Cbz, epub::EPub, write_book};
use crate::pipeline::{PagePipeline, PipelineOptions};
use crate::progress::LogProgress;
use crate::types::{Book, Direction, DoublePageMode, EbookMetadata, FileFormat};

/// The main binding configuration, built declaratively using the builder pattern.
///
/// A `PackerConfig` describes one ebook: where its pages live, how pages are
/// cropped and split, and where the result goes. Once built it can:
///
/// - [`pack`](PackerConfig::pack): run the whole pipeline and write the ebook
/// - [`assemble`](PackerConfig::assemble): stop after assembling the in-memory [`Book`]
///
/// ```rust,no_run
/// # use seihon::prelude::*;
/// # #[tokio::main]
/// # async fn main() -> seihon::error::Result<()> {
/// let config = PackerConfig::builder()
///     .root_dir("./manga/My Series")
///     .author("Jane Doe")
///     .double_page_mode(DoublePageMode::SplitOnly)
///     .output_format(FileFormat::Epub)
///     .build()?;
///
/// let written = config.pack().await?;
/// println!("Wrote {:?}", written);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, derive_builder::Builder)]
#[builder(setter(into, strip_option), build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PackerConfig {
    /// Directory tree holding the page images. Every regular file below it is considered.
    pub root_dir: PathBuf,

    /// Where to write the ebook. Defaults to `<root>/../<root name>.<ext>`.
    #[builder(default)]
    pub output_path: Option<PathBuf>,

    /// Book title. Defaults to the base name of [`root_dir`](PackerConfig::root_dir).
    #[builder(default)]
    pub title: Option<String>,

    #[builder(default)]
    pub author: Option<String>,

    #[builder(default = "\"ja\".to_string()")]
    pub language: String,

    /// Reading direction of the book.
    ///
    /// - [`Direction::Rtl`]: right halves of spreads come first (manga default)
    /// - [`Direction::Ltr`]: left halves of spreads come first
    #[builder(default = "Direction::Rtl")]
    pub reading_direction: Direction,

    /// Skip margin cropping entirely.
    #[builder(default = "false")]
    pub disable_crop: bool,

    /// Maximum fraction of the average page dimension cropped from each side.
    #[builder(default = "DEFAULT_MARGIN_FRACTION")]
    pub margin_fraction: f32,

    /// Treatment of landscape pages, see [`DoublePageMode`].
    #[builder(default)]
    pub double_page_mode: DoublePageMode,

    /// Number of concurrent page workers.
    #[builder(default = "num_cpus::get()")]
    pub parallelism: usize,

    /// Output container.
    ///
    /// - [`FileFormat::Epub`]: image EPUB with chapters in the table of contents
    /// - [`FileFormat::Cbz`]: Comic Book Archive with ComicInfo.xml metadata
    #[builder(default)]
    pub output_format: FileFormat,
}

impl PackerConfig {
    /// Creates a new builder for configuring `PackerConfig`.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::default()
    }

    /// Checks that the root directory is usable before any work starts.
    pub fn preflight_check(&self) -> Result<&Self> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(Error::InvalidPath(
                self.root_dir.clone(),
                "Root directory must be set.".to_string(),
            ));
        }
        if !self.root_dir.exists() {
            return Err(Error::NotFound(format!(
                "Root directory does not exist: '{}'",
                self.root_dir.display()
            )));
        }
        if !self.root_dir.is_dir() {
            return Err(Error::InvalidPath(
                self.root_dir.clone(),
                "Root path is not a directory.".to_string(),
            ));
        }
        Ok(self)
    }

    /// Base name of the root directory, used for default title and output name.
    fn root_name(&self) -> String {
        self.root_dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "book".to_string())
    }

    pub fn metadata(&self) -> EbookMetadata {
        let title = match &self.title {
            Some(title) if !title.is_empty() => title.clone(),
            _ => self.root_name(),
        };

        EbookMetadata {
            title,
            authors: self.author.iter().filter(|a| !a.is_empty()).cloned().collect(),
            language: self.language.clone(),
            reading_direction: self.reading_direction,
            ..Default::default()
        }
    }

    /// Resolved output file path.
    pub fn output_file_path(&self) -> PathBuf {
        if let Some(path) = &self.output_path {
            return path.clone();
        }
        let file_name = format!("{}.{}", self.root_name(), self.output_format.extension());
        match self.root_dir.parent() {
            Some(parent) => parent.join(file_name),
            None => self.root_dir.join("..").join(file_name),
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            disable_crop: self.disable_crop,
            margin_fraction: self.margin_fraction,
            double_page_mode: self.double_page_mode,
            reading_direction: self.reading_direction,
            parallelism: self.parallelism,
        }
    }

    /// A pipeline configured from this config, reporting progress through `log`.
    pub fn pipeline(&self) -> PagePipeline {
        PagePipeline::new(self.pipeline_options()).with_progress(LogProgress)
    }

    /// Runs the page pipeline and assembles the in-memory book.
    pub async fn assemble(&self) -> Result<Book> {
        self.assemble_with(&self.pipeline()).await
    }

    /// Like [`assemble`](PackerConfig::assemble) with a caller-provided pipeline.
    pub async fn assemble_with(&self, pipeline: &PagePipeline) -> Result<Book> {
        self.preflight_check()?;
        let pages = pipeline.run_sequenced(&self.root_dir).await?;
        let book = assemble_book(pages, self.metadata());
        log::info!(
            "Assembled '{}': {} chapter(s), {} page(s)",
            book.metadata.title,
            book.chapters.len(),
            book.page_count()
        );
        Ok(book)
    }

    /// Builds the ebook and writes it, returning the written path.
    ///
    /// Nothing is written when the pipeline fails, including when it produced
    /// no pages at all.
    pub async fn pack(&self) -> Result<PathBuf> {
        let book = self.assemble().await?;
        self.write(&book).await
    }

    /// Writes an assembled book in the configured format.
    pub async fn write(&self, book: &Book) -> Result<PathBuf> {
        let output = self.output_file_path();
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let written = match self.output_format {
            FileFormat::Epub => write_book::<EPub>(book, &output).await,
            FileFormat::Cbz => write_book::<Cbz>(book, &output).await,
        };

        if let Err(e) = written {
            remove_partial(&output).await;
            return Err(e);
        }
        Ok(output)
    }
}

async fn remove_partial(path: &Path) {
    if fs::remove_file(path).await.is_ok() {
        log::debug!("Removed partial output '{}'", path.display());
    }
}

impl PackerConfigBuilder {
    /// Sets the double-page mode from its textual name, failing early on unknown names.
    pub fn double_page_mode_name(&mut self, name: &str) -> Result<&mut Self> {
        let mode: DoublePageMode = name.parse()?;
        self.double_page_mode = Some(mode);
        Ok(self)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(0) = self.parallelism {
            return Err("Parallelism must be at least 1.".to_string());
        }
        if let Some(fraction) = self.margin_fraction {
            if !fraction.is_finite() || !(0.0..=0.5).contains(&fraction) {
                return Err(format!(
                    "Margin fraction must be between 0.0 and 0.5, got {}",
                    fraction
                ));
            }
        }
        Ok(())
    }
}

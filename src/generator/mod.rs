//! Generator module provides the encoder interface and its implementations.
//!
//! The pipeline hands a fully assembled [`Book`] to [`write_book`], which
//! encodes every page once and then drives a [`Generator`] chapter by chapter.

use std::path::Path;

use async_trait::async_trait;
use rayon::prelude::*;
use tokio::task::spawn_blocking;

use crate::error::{Error, Result};
use crate::types::{Book, EbookMetadata, PageRef};

pub mod cbz;
pub mod epub;

/// A page encoded for packaging.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    pub page: PageRef,
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl EncodedPage {
    /// Stable file stem of this page inside the container, e.g. `page_0007`.
    pub fn file_stem(&self) -> String {
        format!("page_{}", self.page)
    }
}

/// Common interface for all ebook containers.
#[async_trait]
pub trait Generator: Send {
    /// Creates a generator that will write to `output_path`.
    fn new(output_path: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Sets book-level metadata.
    ///
    /// # Parameters
    /// * `metadata` - Title, authors, language, direction and dates
    /// * `chapter_titles` - Titles of all chapters in book order
    /// * `total_pages` - Number of page images in the book
    async fn set_metadata(
        &mut self,
        metadata: &EbookMetadata,
        chapter_titles: &[String],
        total_pages: usize,
    ) -> Result<&mut Self>
    where
        Self: Sized;

    /// Sets the cover image. Containers whose readers use the first page need not override this.
    async fn set_cover(&mut self, _cover: &EncodedPage) -> Result<&mut Self>
    where
        Self: Sized,
    {
        Ok(self)
    }

    /// Appends a titled chapter made of `pages`, in order.
    async fn add_chapter(
        &mut self,
        chapter_index: usize,
        title: &str,
        pages: &[&EncodedPage],
    ) -> Result<&mut Self>
    where
        Self: Sized;

    /// Finalizes the container and writes it to disk.
    async fn save(self) -> Result<()>;
}

/// Escapes text for use inside XML elements and attributes.
pub(crate) fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Encodes every image of the book to JPEG, in parallel.
pub async fn encode_book(book: &Book) -> Result<Vec<EncodedPage>> {
    let images = book.images.clone();

    spawn_blocking(move || {
        images
            .par_iter()
            .enumerate()
            .map(|(position, image)| {
                Ok(EncodedPage {
                    page: PageRef::from_position(position),
                    width: image.width(),
                    height: image.height(),
                    jpeg: image.encode_jpeg()?,
                })
            })
            .collect::<Result<Vec<_>>>()
    })
    .await?
}

/// Encodes `book` and writes it through generator `G` to `output_path`.
pub async fn write_book<G>(book: &Book, output_path: &Path) -> Result<()>
where
    G: Generator + Send,
{
    let pages = encode_book(book).await?;
    let cover = pages
        .first()
        .ok_or_else(|| Error::EmptyLibrary(output_path.to_path_buf()))?;

    let chapter_titles: Vec<String> = book.chapters.iter().map(|c| c.title.clone()).collect();

    let mut generator = G::new(output_path)?;
    generator
        .set_metadata(&book.metadata, &chapter_titles, pages.len())
        .await?;
    generator.set_cover(cover).await?;

    for (index, chapter) in book.chapters.iter().enumerate() {
        let chapter_pages: Vec<&EncodedPage> = chapter
            .page_refs
            .iter()
            .filter_map(|page| pages.get(page.index()))
            .collect();
        generator
            .add_chapter(index + 1, &chapter.title, &chapter_pages)
            .await?;
    }

    generator.save().await
}

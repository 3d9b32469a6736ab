//! Chapter grouping and book assembly.

use std::path::Path;

use crate::types::{Book, Chapter, EbookMetadata, PageRef, PageResult};

/// Name of the directory a page lives in, used as its chapter title.
pub fn chapter_title(path: &Path) -> String {
    path.parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string())
}

/// Groups sequenced pages into chapters.
///
/// A new chapter starts whenever the parent directory name changes between
/// two consecutive pages, so a directory that shows up twice in the sequence
/// yields two chapters. Every image of a page gets its own [`PageRef`], in
/// emission order, numbered across the whole book.
pub fn group_chapters(pages: &[PageResult]) -> Vec<Chapter> {
    let mut chapters: Vec<Chapter> = Vec::new();
    let mut position = 0;

    for page in pages {
        let title = chapter_title(&page.source_path);

        match chapters.last_mut() {
            Some(current) if current.title == title => {}
            _ => chapters.push(Chapter {
                title,
                page_refs: Vec::new(),
            }),
        }

        if let Some(current) = chapters.last_mut() {
            for _ in &page.images {
                current.page_refs.push(PageRef::from_position(position));
                position += 1;
            }
        }
    }

    chapters
}

/// Flattens sequenced pages into a [`Book`] whose page references index
/// `images` in order.
pub fn assemble_book(pages: Vec<PageResult>, metadata: EbookMetadata) -> Book {
    let chapters = group_chapters(&pages);
    let images = pages.into_iter().flat_map(|page| page.images).collect();

    Book {
        metadata,
        chapters,
        images,
    }
}

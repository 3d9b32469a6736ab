use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use epub_builder::{EpubBuilder, EpubContent, EpubVersion, ZipLibrary};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::generator::{EncodedPage, Generator, escape_xml};
use crate::types::EbookMetadata;

const PAGE_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
  <title>%title%</title>
  <meta name="viewport" content="width=%width%, height=%height%"/>
  <link rel="stylesheet" type="text/css" href="stylesheet.css"/>
</head>
<body>
  <div class="page"><img src="%src%" alt="%alt%"/></div>
</body>
</html>
"#;

const STYLESHEET: &str = r#"html, body {
  margin: 0;
  padding: 0;
}

div.page {
  text-align: center;
}

img {
  margin: 0;
  padding: 0;
  display: block;
  vertical-align: baseline;
  max-width: 100%;
  max-height: 100%;
}
"#;

/// Generates the XHTML wrapper for a single page image.
fn generate_xhtml(page: &EncodedPage, image_source: &str, page_title: &str) -> String {
    let title = escape_xml(page_title);
    PAGE_TEMPLATE
        .replace("%title%", &title)
        .replace("%alt%", &title)
        .replace("%src%", image_source)
        .replace("%width%", &page.width.to_string())
        .replace("%height%", &page.height.to_string())
}

/// Package identifier derived from the title, so rebuilding a book keeps its identity.
fn book_uuid(metadata: &EbookMetadata) -> Uuid {
    Uuid::from_u128(metadata.unique_id() as u128)
}

/// A generator for fixed-layout image EPUB files.
///
/// Each page image becomes its own XHTML document; the first page of every
/// chapter carries the chapter title into the table of contents.
pub struct EPub {
    epub: EpubBuilder<ZipLibrary>,
    output_path: PathBuf,
}

#[async_trait]
impl Generator for EPub {
    fn new(output_path: &Path) -> Result<Self> {
        let mut epub = EpubBuilder::new(ZipLibrary::new()?)?;
        epub.epub_version(EpubVersion::V30);
        epub.stylesheet(STYLESHEET.as_bytes())?;

        Ok(EPub {
            epub,
            output_path: output_path.to_path_buf(),
        })
    }

    async fn set_metadata(
        &mut self,
        metadata: &EbookMetadata,
        _chapter_titles: &[String],
        _total_pages: usize,
    ) -> Result<&mut Self> {
        self.epub.metadata("title", &metadata.title)?;
        for author in &metadata.authors {
            self.epub.metadata("author", author)?;
        }
        self.epub.metadata("lang", &metadata.language)?;
        self.epub
            .metadata("direction", metadata.reading_direction.to_string())?;
        self.epub.metadata("generator", "seihon")?;
        self.epub.set_uuid(book_uuid(metadata));
        self.epub.set_publication_date(metadata.created);
        self.epub.set_modified_date(metadata.created);
        Ok(self)
    }

    async fn set_cover(&mut self, cover: &EncodedPage) -> Result<&mut Self> {
        self.epub.add_cover_image(
            "images/cover.jpg",
            Cursor::new(cover.jpeg.as_slice()),
            "image/jpeg",
        )?;
        Ok(self)
    }

    async fn add_chapter(
        &mut self,
        _chapter_index: usize,
        title: &str,
        pages: &[&EncodedPage],
    ) -> Result<&mut Self> {
        for (i, page) in pages.iter().enumerate() {
            let stem = page.file_stem();
            let image_name = format!("images/{}.jpg", stem);
            self.epub.add_resource(
                &image_name,
                Cursor::new(page.jpeg.as_slice()),
                "image/jpeg",
            )?;

            let page_title = if i == 0 {
                title.to_string()
            } else {
                format!("{} - Page {}", title, i + 1)
            };
            let xhtml = generate_xhtml(page, &image_name, &page_title);

            let mut content =
                EpubContent::new(format!("{}.xhtml", stem), xhtml.as_bytes()).title(&page_title);
            if i > 0 {
                content = content.level(2);
            }
            self.epub.add_content(content)?;
        }
        Ok(self)
    }

    async fn save(mut self) -> Result<()> {
        let file = File::create(&self.output_path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create EPUB file '{}': {}",
                    self.output_path.display(),
                    e
                ),
            ))
        })?;

        self.epub.generate(file)?;
        log::info!("Wrote '{}'", self.output_path.display());
        Ok(())
    }
}

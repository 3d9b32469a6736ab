use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Datelike;
use tokio::task::spawn_blocking;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::generator::{EncodedPage, Generator, escape_xml};
use crate::types::{Direction, EbookMetadata};

const COMIC_INFO_TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ComicInfo xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <Title>%title%</Title>
  <Writer>%writer%</Writer>
  <Year>%year%</Year>
  <Month>%month%</Month>
  <Day>%day%</Day>
  <PageCount>%pagecount%</PageCount>
  <LanguageISO>%language%</LanguageISO>
  <Manga>%manga%</Manga>
  <Notes>Unique ID: %uniqueid%
Chapters: %chaptertitles%</Notes>
</ComicInfo>
"#;

/// Renders `ComicInfo.xml` for the book.
fn comic_info(metadata: &EbookMetadata, chapter_titles: &[String], total_pages: usize) -> String {
    let manga = match metadata.reading_direction {
        Direction::Rtl => "YesAndRightToLeft",
        Direction::Ltr => "Yes",
    };

    COMIC_INFO_TEMPLATE
        .replace("%title%", &escape_xml(&metadata.title))
        .replace("%writer%", &escape_xml(&metadata.authors.join(", ")))
        .replace("%year%", &metadata.created.year().to_string())
        .replace("%month%", &metadata.created.month().to_string())
        .replace("%day%", &metadata.created.day().to_string())
        .replace("%pagecount%", &total_pages.to_string())
        .replace("%language%", &escape_xml(&metadata.language))
        .replace("%manga%", manga)
        .replace("%uniqueid%", &metadata.unique_id().to_string())
        .replace("%chaptertitles%", &escape_xml(&chapter_titles.join(", ")))
}

/// A generator for creating CBZ (Comic Book ZIP) files.
///
/// Pages are stored uncompressed in book order, named so that a plain
/// lexical listing of the archive matches the reading order.
pub struct Cbz {
    zip: Option<ZipWriter<File>>,
    output_path: PathBuf,
    options: SimpleFileOptions,
}

impl Cbz {
    fn zip(&mut self) -> Result<&mut ZipWriter<File>> {
        self.zip
            .as_mut()
            .ok_or_else(|| Error::Other("Zip writer not available".to_string()))
    }
}

#[async_trait]
impl Generator for Cbz {
    fn new(output_path: &Path) -> Result<Self> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        let file = File::create(output_path)?;

        Ok(Cbz {
            zip: Some(ZipWriter::new(file)),
            output_path: output_path.to_path_buf(),
            options,
        })
    }

    async fn set_metadata(
        &mut self,
        metadata: &EbookMetadata,
        chapter_titles: &[String],
        total_pages: usize,
    ) -> Result<&mut Self> {
        let xml = comic_info(metadata, chapter_titles, total_pages);
        let options = self.options;

        let zip = self.zip()?;
        zip.start_file("ComicInfo.xml", options)?;
        zip.write_all(xml.as_bytes())?;
        Ok(self)
    }

    async fn add_chapter(
        &mut self,
        _chapter_index: usize,
        _title: &str,
        pages: &[&EncodedPage],
    ) -> Result<&mut Self> {
        // JPEG data does not deflate any further.
        let options = self.options.compression_method(CompressionMethod::Stored);

        let zip = self.zip()?;
        for page in pages {
            zip.start_file(format!("{}.jpg", page.file_stem()), options)?;
            zip.write_all(&page.jpeg)?;
        }
        Ok(self)
    }

    async fn save(mut self) -> Result<()> {
        let zip = self
            .zip
            .take()
            .ok_or_else(|| Error::Other("Zip writer not available".to_string()))?;

        spawn_blocking(move || zip.finish().map(|_| ()).map_err(Error::Zip)).await??;
        log::info!("Wrote '{}'", self.output_path.display());
        Ok(())
    }
}

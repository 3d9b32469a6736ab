//! Core data types, enums, and metadata for the Seihon binding library.
//!
//! This module defines the fundamental data structures used throughout Seihon:
//! - Configuration enumerations (`DoublePageMode`, `Direction`, `FileFormat`)
//! - Pipeline items (`FileItem`, `PageResult`)
//! - Packaging structures (`Chapter`, `PageRef`, `Book`)
//! - Book-level metadata (`EbookMetadata`)

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::page::PageImage;

/// What to do with pages detected as two-page spreads.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DoublePageMode {
    /// Emit only the two halves.
    #[default]
    SplitOnly,
    /// Emit both halves, then the whole spread.
    SplitThenWhole,
    /// Emit the whole spread, then both halves.
    WholeThenSplit,
    /// Never split; the spread stays a single page.
    KeepWhole,
}

impl DoublePageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoublePageMode::SplitOnly => "split-only",
            DoublePageMode::SplitThenWhole => "split-then-whole",
            DoublePageMode::WholeThenSplit => "whole-then-split",
            DoublePageMode::KeepWhole => "keep-whole",
        }
    }
}

impl FromStr for DoublePageMode {
    type Err = Error;

    /// Accepts the canonical names as well as the legacy
    /// `only-split` / `split-then-double` / `double-then-split` / `only-double`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "split-only" | "only-split" => Ok(DoublePageMode::SplitOnly),
            "split-then-whole" | "split-then-double" => Ok(DoublePageMode::SplitThenWhole),
            "whole-then-split" | "double-then-split" => Ok(DoublePageMode::WholeThenSplit),
            "keep-whole" | "only-double" => Ok(DoublePageMode::KeepWhole),
            _ => Err(Error::UnknownDoublePageMode(s.to_string())),
        }
    }
}

impl fmt::Display for DoublePageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reading direction of the book. Also decides the order split halves are emitted in.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    Ltr,
    #[default]
    Rtl,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ltr => f.write_str("ltr"),
            Direction::Rtl => f.write_str("rtl"),
        }
    }
}

/// Defines the output file format for the generated ebook.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FileFormat {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "EPUB"))]
    Epub,
    #[cfg_attr(feature = "serde", serde(rename = "CBZ"))]
    Cbz,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Epub => "epub",
            FileFormat::Cbz => "cbz",
        }
    }
}

/// Book-level metadata handed to the encoder.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EbookMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub language: String, // e.g., "en", "ja"
    pub reading_direction: Direction,
    pub created: DateTime<Utc>,
}

impl Default for EbookMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            authors: Vec::new(),
            language: "ja".to_string(),
            reading_direction: Direction::Rtl,
            created: DateTime::<Utc>::default(), // Unix epoch
        }
    }
}

impl EbookMetadata {
    /// Creates a default `EbookMetadata` instance with a specified title.
    pub fn default_with_title(title: String) -> Self {
        Self {
            title,
            ..Default::default()
        }
    }

    /// Numeric book identifier derived from the title.
    pub fn unique_id(&self) -> u32 {
        fnv1_32(self.title.as_bytes())
    }
}

/// 32-bit FNV-1 (multiply, then xor).
pub fn fnv1_32(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    bytes.iter().fold(OFFSET_BASIS, |hash, &byte| {
        hash.wrapping_mul(PRIME) ^ byte as u32
    })
}

/// A regular file discovered under the root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    pub path: PathBuf,
}

/// The pages produced from one source file, in emission order.
#[derive(Debug, Clone)]
pub struct PageResult {
    pub source_path: PathBuf,
    pub images: Vec<PageImage>,
}

/// Opaque, order-stable reference to a page image of a [`Book`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageRef(u32);

impl PageRef {
    /// References are 1-based positions.
    pub(crate) fn from_position(position: usize) -> Self {
        PageRef(position as u32 + 1)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// A contiguous run of pages sharing a source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    pub page_refs: Vec<PageRef>,
}

/// Everything an encoder needs: metadata, chapters and the flat image list.
#[derive(Debug, Clone)]
pub struct Book {
    pub metadata: EbookMetadata,
    pub chapters: Vec<Chapter>,
    pub images: Vec<PageImage>,
}

impl Book {
    pub fn image(&self, page: PageRef) -> Option<&PageImage> {
        self.images.get(page.index())
    }

    /// The first page doubles as the cover.
    pub fn cover(&self) -> Option<&PageImage> {
        self.images.first()
    }

    pub fn page_count(&self) -> usize {
        self.images.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_page_mode_parsing() {
        assert_eq!(
            "split-only".parse::<DoublePageMode>().unwrap(),
            DoublePageMode::SplitOnly
        );
        assert_eq!(
            "only-split".parse::<DoublePageMode>().unwrap(),
            DoublePageMode::SplitOnly
        );
        assert_eq!(
            "Double-Then-Split".parse::<DoublePageMode>().unwrap(),
            DoublePageMode::WholeThenSplit
        );
        assert_eq!(
            "only-double".parse::<DoublePageMode>().unwrap(),
            DoublePageMode::KeepWhole
        );
        let err = "triple".parse::<DoublePageMode>().unwrap_err();
        assert!(matches!(err, Error::UnknownDoublePageMode(ref m) if m == "triple"));
    }

    #[test]
    fn test_double_page_mode_display_round_trips() {
        for mode in [
            DoublePageMode::SplitOnly,
            DoublePageMode::SplitThenWhole,
            DoublePageMode::WholeThenSplit,
            DoublePageMode::KeepWhole,
        ] {
            assert_eq!(mode.to_string().parse::<DoublePageMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_fnv1_known_values() {
        assert_eq!(fnv1_32(b""), 0x811c_9dc5);
        assert_eq!(fnv1_32(b"a"), 0x050c_5d7e);
        assert_eq!(fnv1_32(b"foobar"), 0x31f0_b262);
    }

    #[test]
    fn test_unique_id_depends_on_byte_order() {
        let ab = EbookMetadata::default_with_title("ab".to_string());
        let ba = EbookMetadata::default_with_title("ba".to_string());
        assert_ne!(ab.unique_id(), ba.unique_id());
        assert_eq!(ab.unique_id(), ab.clone().unique_id());
    }

    #[test]
    fn test_page_ref_is_one_based() {
        let r = PageRef::from_position(0);
        assert_eq!(r.get(), 1);
        assert_eq!(r.index(), 0);
        assert_eq!(r.to_string(), "0001");
    }
}

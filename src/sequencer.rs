//! Deterministic ordering of processed pages.
//!
//! Workers finish in arbitrary order, so the page order of the book is rebuilt
//! here from source paths alone. Files of one directory sort naturally by
//! name; different directories are ordered component by component, with a
//! nested directory sorting before the directory that contains it.

use std::cmp::Ordering;
use std::path::{Component, Path};

use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;

use crate::error::{Error, Result};
use crate::types::PageResult;

lazy_static! {
    /// Splits a string into alternating runs of ASCII digits and non-digits.
    static ref NATURAL_CHUNK_REGEX: Regex = Regex::new(r"[0-9]+|[^0-9]+").unwrap();
}

/// Digit-aware string comparison: `"page2" < "page10"`.
///
/// Numeric runs compare by value, everything else byte-wise. Strings that
/// only differ in leading zeros fall back to a plain comparison so that the
/// order stays total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chunks = NATURAL_CHUNK_REGEX.find_iter(a).map(|m| m.as_str());
    let mut b_chunks = NATURAL_CHUNK_REGEX.find_iter(b).map(|m| m.as_str());

    loop {
        match (a_chunks.next(), b_chunks.next()) {
            (Some(x), Some(y)) => match compare_chunks(x, y) {
                Ordering::Equal => continue,
                order => return order,
            },
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (None, None) => return a.cmp(b),
        }
    }
}

fn compare_chunks(x: &str, y: &str) -> Ordering {
    let is_number = |s: &str| s.as_bytes().first().is_some_and(u8::is_ascii_digit);

    if is_number(x) && is_number(y) {
        // Compare by magnitude without parsing, so arbitrarily long runs work.
        let x = x.trim_start_matches('0');
        let y = y.trim_start_matches('0');
        x.len().cmp(&y.len()).then_with(|| x.cmp(y))
    } else {
        x.cmp(y)
    }
}

/// Orders two source paths.
///
/// - same parent directory: natural order of the full paths
/// - one directory nested inside the other: the nested one first
/// - otherwise: natural order of the directories, component by component
pub fn compare_paths(a: &Path, b: &Path) -> Ordering {
    let a_dir = a.parent().unwrap_or(Path::new(""));
    let b_dir = b.parent().unwrap_or(Path::new(""));

    if a_dir == b_dir {
        return natural_cmp(&a.to_string_lossy(), &b.to_string_lossy());
    }
    compare_dirs(a_dir, b_dir)
}

fn compare_dirs(a: &Path, b: &Path) -> Ordering {
    let mut a_components = a.components();
    let mut b_components = b.components();

    loop {
        match (a_components.next(), b_components.next()) {
            (Some(x), Some(y)) => match natural_cmp(&component_str(x), &component_str(y)) {
                Ordering::Equal => continue,
                order => return order,
            },
            // `a` lives below `b`
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        }
    }
}

fn component_str(component: Component<'_>) -> std::borrow::Cow<'_, str> {
    component.as_os_str().to_string_lossy()
}

/// Sorts every processed page into book order.
///
/// The sort is stable, so identical source paths keep their emission order.
/// Fails with [`Error::EmptyLibrary`] when nothing was produced under `root`.
pub fn sequence_pages(mut pages: Vec<PageResult>, root: &Path) -> Result<Vec<PageResult>> {
    if pages.is_empty() {
        return Err(Error::EmptyLibrary(root.to_path_buf()));
    }

    pages.par_sort_by(|a, b| compare_paths(&a.source_path, &b.source_path));
    Ok(pages)
}

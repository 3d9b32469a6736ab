//! Common test utilities and constants for the Seihon crate.
//!
//! Provides functions for setting up test directories and writing synthetic
//! page images with known borders and aspect ratios.

use image::{Rgb, RgbImage};
use rand::{Rng, distributions::Alphanumeric};
use seihon::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);
#[allow(dead_code)]
pub const LONG_TEST_TIMEOUT: Duration = Duration::from_secs(120);

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Paths of a fresh, uniquely named test directory.
#[allow(dead_code)]
pub struct TestDirs {
    pub test_dir: PathBuf,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
}

/// Creates a clean test directory with `source` and `target` subdirectories.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let test_dir = PathBuf::from(TEST_TMP_DIR).join(format!("{}-{}", sub_path, rand_string));
    if test_dir.exists() {
        fs::remove_dir_all(&test_dir).await.unwrap();
    }
    let source_dir = test_dir.join("source");
    let target_dir = test_dir.join("target");

    fs::create_dir_all(&source_dir).await.unwrap();
    fs::create_dir_all(&target_dir).await.unwrap();

    TestDirs {
        test_dir,
        source_dir,
        target_dir,
    }
}

/// Removes a test directory created by [`setup_test_dirs`].
#[allow(dead_code)]
pub async fn cleanup(test_dirs: &TestDirs) {
    let _ = fs::remove_dir_all(&test_dirs.test_dir).await;
}

/// A white page with a black block inset by `border` pixels on every side.
#[allow(dead_code)]
pub fn bordered_page(width: u32, height: u32, border: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let inside = x >= border && x < width - border && y >= border && y < height - border;
        if inside { BLACK } else { WHITE }
    })
}

/// A spread whose left half is black and right half white, so halves are told apart after splitting.
#[allow(dead_code)]
pub fn half_black_spread(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| if x < width / 2 { BLACK } else { WHITE })
}

/// Writes `img` as PNG, creating parent directories.
#[allow(dead_code)]
pub async fn write_png(path: &Path, img: RgbImage) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let path_clone = path.to_path_buf();
    tokio::task::spawn_blocking(move || img.save_with_format(path_clone, image::ImageFormat::Png))
        .await
        .map_err(Error::Join)?
        .map_err(Error::Image)?;
    Ok(())
}

/// Writes a JPEG of the given size filled with black content, creating parent directories.
#[allow(dead_code)]
pub async fn write_jpeg(path: &Path, width: u32, height: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let img = RgbImage::from_pixel(width, height, BLACK);
    let path_clone = path.to_path_buf();
    tokio::task::spawn_blocking(move || img.save_with_format(path_clone, image::ImageFormat::Jpeg))
        .await
        .map_err(Error::Join)?
        .map_err(Error::Image)?;
    Ok(())
}

/// Writes a file that is not an image.
#[allow(dead_code)]
pub async fn write_garbage(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, b"definitely not an image").await?;
    Ok(())
}

/// Lists the entry names of a ZIP based file (CBZ or EPUB).
#[allow(dead_code)]
pub fn zip_entries(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Reads one entry of a ZIP based file as text.
#[allow(dead_code)]
pub fn zip_text(path: &Path, name: &str) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = String::new();
    std::io::Read::read_to_string(&mut entry, &mut content).unwrap();
    content
}

//! Unit tests for the Seihon configuration surface.
//!
//! Tests builder validation, preflight checks and derived settings without
//! running the page pipeline.

use seihon::error::{Error, Result};
use seihon::prelude::*;

mod common;
use common::{cleanup, setup_test_dirs};

#[test]
fn test_builder_defaults() -> Result<()> {
    let config = PackerConfig::builder().root_dir("/library/My Series").build()?;

    assert_eq!(config.margin_fraction, 0.1);
    assert_eq!(config.double_page_mode, DoublePageMode::SplitOnly);
    assert_eq!(config.reading_direction, Direction::Rtl);
    assert_eq!(config.output_format, FileFormat::Epub);
    assert!(!config.disable_crop);
    assert!(config.parallelism >= 1);
    Ok(())
}

#[test]
fn test_builder_requires_root_dir() {
    let result = PackerConfig::builder().title("No Root").build();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("root_dir"));
}

#[test]
fn test_builder_validation() {
    let result = PackerConfig::builder()
        .root_dir("/tmp")
        .parallelism(0usize)
        .build();
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Parallelism must be at least 1")
    );

    let result = PackerConfig::builder()
        .root_dir("/tmp")
        .margin_fraction(0.75f32)
        .build();
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Margin fraction must be between")
    );

    let result = PackerConfig::builder()
        .root_dir("/tmp")
        .margin_fraction(f32::NAN)
        .build();
    assert!(result.is_err());
}

#[test]
fn test_double_page_mode_by_name() -> Result<()> {
    let mut builder = PackerConfig::builder();
    builder.root_dir("/tmp").double_page_mode_name("double-then-split")?;
    assert_eq!(
        builder.build()?.double_page_mode,
        DoublePageMode::WholeThenSplit
    );

    let mut builder = PackerConfig::builder();
    let Err(err) = builder.double_page_mode_name("sideways") else {
        panic!("unknown mode name must be rejected");
    };
    assert!(matches!(err, Error::UnknownDoublePageMode(ref name) if name == "sideways"));
    assert!(err.is_fatal());
    Ok(())
}

#[test]
fn test_metadata_defaults_to_root_name() -> Result<()> {
    let config = PackerConfig::builder()
        .root_dir("/library/Blue Period")
        .build()?;
    let metadata = config.metadata();
    assert_eq!(metadata.title, "Blue Period");
    assert!(metadata.authors.is_empty());
    assert_eq!(metadata.reading_direction, Direction::Rtl);
    assert_eq!(metadata.created.timestamp(), 0);

    let config = PackerConfig::builder()
        .root_dir("/library/Blue Period")
        .title("Custom")
        .author("Tsubasa")
        .reading_direction(Direction::Ltr)
        .build()?;
    let metadata = config.metadata();
    assert_eq!(metadata.title, "Custom");
    assert_eq!(metadata.authors, vec!["Tsubasa".to_string()]);
    assert_eq!(metadata.reading_direction, Direction::Ltr);
    Ok(())
}

#[test]
fn test_unique_id_is_stable_per_title() -> Result<()> {
    let a = PackerConfig::builder().root_dir("/x/One").build()?.metadata();
    let b = PackerConfig::builder()
        .root_dir("/y/Two")
        .title("One")
        .build()?
        .metadata();
    assert_eq!(a.unique_id(), b.unique_id());
    assert_eq!(a.unique_id(), seihon::types::fnv1_32(b"One"));
    Ok(())
}

#[test]
fn test_output_file_path() -> Result<()> {
    let config = PackerConfig::builder()
        .root_dir("/library/Series")
        .output_format(FileFormat::Cbz)
        .build()?;
    assert_eq!(
        config.output_file_path(),
        PathBuf::from("/library/Series.cbz")
    );

    let config = PackerConfig::builder()
        .root_dir("/library/Series")
        .output_path("/out/book.epub")
        .build()?;
    assert_eq!(config.output_file_path(), PathBuf::from("/out/book.epub"));
    Ok(())
}

#[test]
fn test_pipeline_options_follow_config() -> Result<()> {
    let config = PackerConfig::builder()
        .root_dir("/tmp")
        .disable_crop(true)
        .margin_fraction(0.2f32)
        .double_page_mode(DoublePageMode::KeepWhole)
        .parallelism(3usize)
        .build()?;
    let options = config.pipeline_options();
    assert!(options.disable_crop);
    assert_eq!(options.margin_fraction, 0.2);
    assert_eq!(options.double_page_mode, DoublePageMode::KeepWhole);
    assert_eq!(options.parallelism, 3);
    Ok(())
}

#[tokio::test]
async fn test_preflight_check() -> Result<()> {
    let test_dirs = setup_test_dirs("preflight_check").await;

    let config = PackerConfig::builder()
        .root_dir(test_dirs.source_dir.clone())
        .build()?;
    assert!(config.preflight_check().is_ok());

    let config = PackerConfig::builder()
        .root_dir(test_dirs.source_dir.join("nonexistent"))
        .build()?;
    let result = config.preflight_check();
    assert!(matches!(result, Err(Error::NotFound(_))));

    let file = test_dirs.source_dir.join("file.txt");
    tokio::fs::write(&file, b"x").await?;
    let config = PackerConfig::builder().root_dir(file).build()?;
    assert!(matches!(
        config.preflight_check(),
        Err(Error::InvalidPath(_, _))
    ));

    cleanup(&test_dirs).await;
    Ok(())
}

#[test]
fn test_error_messages_show_plain_paths() {
    let path = PathBuf::from("library/vol 1/01.png");
    let messages = [
        Error::DecodeFailure {
            path: path.clone(),
            reason: "bad header".to_string(),
        }
        .to_string(),
        Error::UnsupportedImageKind {
            path: path.clone(),
            kind: "Stream".to_string(),
        }
        .to_string(),
        Error::TraversalFailure {
            path: path.clone(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
        .to_string(),
        Error::EmptyLibrary(path.clone()).to_string(),
        Error::InvalidPath(path.clone(), "not a directory".to_string()).to_string(),
    ];
    for message in messages {
        assert!(message.contains("'library/vol 1/01.png'"), "{}", message);
        assert!(!message.contains('"'), "{}", message);
    }
}

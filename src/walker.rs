//! Recursive directory walker feeding the page workers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{ReadDir, read_dir};
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::progress::Progress;
use crate::types::FileItem;

fn traversal_failure(path: &Path, source: std::io::Error) -> Error {
    Error::TraversalFailure {
        path: path.to_path_buf(),
        source,
    }
}

async fn open_dir(path: PathBuf) -> Result<(PathBuf, ReadDir)> {
    match read_dir(&path).await {
        Ok(entries) => Ok((path, entries)),
        Err(e) => Err(traversal_failure(&path, e)),
    }
}

/// Walks `root` depth-first and sends one [`FileItem`] per non-directory entry.
///
/// Entries are emitted in the order the filesystem lists them. Sending waits
/// while the queue is full. Cancellation, or every receiver going away, ends
/// the walk early without an error. Any I/O failure while listing a directory
/// is returned as [`Error::TraversalFailure`].
///
/// Returns the number of files emitted.
pub async fn walk(
    root: PathBuf,
    tx: Sender<FileItem>,
    token: CancellationToken,
    progress: Arc<dyn Progress>,
) -> Result<usize> {
    let mut stack = vec![open_dir(root).await?];
    let mut emitted = 0;

    loop {
        if token.is_cancelled() {
            return Ok(emitted);
        }

        let (dir, entries) = match stack.last_mut() {
            Some(top) => (top.0.clone(), &mut top.1),
            None => break,
        };

        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                stack.pop();
                continue;
            }
            Err(e) => return Err(traversal_failure(&dir, e)),
        };

        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| traversal_failure(&path, e))?;

        if file_type.is_dir() {
            stack.push(open_dir(path).await?);
            continue;
        }

        log::debug!("Discovered '{}'", path.display());
        tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(emitted),
            sent = tx.send(FileItem { path }) => {
                if sent.is_err() {
                    return Ok(emitted);
                }
            }
        }
        emitted += 1;
        progress.discovered(1);
    }

    Ok(emitted)
}

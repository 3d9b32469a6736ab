//! Concurrent page processing: walker, worker pool and collector.
//!
//! One walker task discovers files and feeds a bounded queue; `parallelism`
//! workers pull from it, decode, crop and split on blocking threads, and push
//! [`PageResult`]s into a second bounded queue drained by the collector.
//!
//! Every blocking point (both queue ends, on every task) also waits on one
//! shared [`CancellationToken`]. The first fatal error is recorded and the
//! token cancelled, which wakes every waiting task at once. Files that fail to
//! decode are logged and skipped without cancelling anything.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use tokio::spawn;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::{JoinHandle, spawn_blocking};
use tokio_util::sync::CancellationToken;

use crate::crop::{DEFAULT_MARGIN_FRACTION, crop_with_limit, split_if_spread};
use crate::error::{Error, Result};
use crate::page::{FileDecoder, PageDecoder, PageImage};
use crate::progress::{NoProgress, Progress};
use crate::sequencer::sequence_pages;
use crate::types::{Direction, DoublePageMode, FileItem, PageResult};
use crate::walker::walk;

/// Backlog of both the file queue and the page queue.
pub const QUEUE_CAPACITY: usize = 100;

/// Per-page processing settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub disable_crop: bool,
    pub margin_fraction: f32,
    pub double_page_mode: DoublePageMode,
    pub reading_direction: Direction,
    pub parallelism: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            disable_crop: false,
            margin_fraction: DEFAULT_MARGIN_FRACTION,
            double_page_mode: DoublePageMode::SplitOnly,
            reading_direction: Direction::Rtl,
            parallelism: num_cpus::get(),
        }
    }
}

/// Orders the parts of a page for emission.
///
/// Portrait pages, and spreads kept whole, come back unchanged. Spreads are
/// split and their halves follow the reading direction: right before left for
/// right-to-left books.
pub fn arrange_spread(
    page: PageImage,
    mode: DoublePageMode,
    direction: Direction,
) -> Vec<PageImage> {
    if !page.is_spread() || mode == DoublePageMode::KeepWhole {
        return vec![page];
    }

    let (left, right) = split_if_spread(&page);
    let (first, second) = match direction {
        Direction::Rtl => (right, left),
        Direction::Ltr => (left, right),
    };

    match mode {
        DoublePageMode::SplitOnly => vec![first, second],
        DoublePageMode::SplitThenWhole => vec![first, second, page],
        DoublePageMode::WholeThenSplit => vec![page, first, second],
        DoublePageMode::KeepWhole => vec![page],
    }
}

/// Decodes, crops and splits a single file.
///
/// Returns [`Error::DecodeFailure`] for files that are not images, and
/// [`Error::UnsupportedImageKind`] when the decoded image cannot be sub-viewed.
pub fn process_file(
    options: &PipelineOptions,
    decoder: &dyn PageDecoder,
    path: &Path,
) -> Result<PageResult> {
    let page = decoder.decode(path)?.into_croppable(path)?;

    let page = if options.disable_crop {
        page
    } else {
        crop_with_limit(&page, options.margin_fraction)
    };

    Ok(PageResult {
        source_path: path.to_path_buf(),
        images: arrange_spread(page, options.double_page_mode, options.reading_direction),
    })
}

/// First fatal error of a run plus the token broadcasting it.
#[derive(Clone, Default)]
struct Abort {
    token: CancellationToken,
    first: Arc<Mutex<Option<Error>>>,
}

impl Abort {
    fn fail(&self, error: Error) {
        {
            let mut first = self.first.lock().unwrap_or_else(|e| e.into_inner());
            if first.is_none() {
                log::error!("Aborting: {}", error);
                *first = Some(error);
            } else {
                log::debug!("Suppressed follow-up error: {}", error);
            }
        }
        self.token.cancel();
    }

    fn take(&self) -> Option<Error> {
        self.first.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

struct WorkerContext {
    options: PipelineOptions,
    decoder: Arc<dyn PageDecoder>,
    progress: Arc<dyn Progress>,
}

async fn run_worker(
    id: usize,
    inbox: Arc<tokio::sync::Mutex<Receiver<FileItem>>>,
    outbox: Sender<PageResult>,
    context: Arc<WorkerContext>,
    token: CancellationToken,
) -> Result<()> {
    loop {
        let item = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            item = async { inbox.lock().await.recv().await } => match item {
                Some(item) => item,
                None => break,
            },
        };

        let task_context = Arc::clone(&context);
        let path = item.path;
        let outcome = spawn_blocking(move || {
            process_file(
                &task_context.options,
                task_context.decoder.as_ref(),
                &path,
            )
        })
        .await?;

        let page = match outcome {
            Ok(page) => page,
            Err(e) if !e.is_fatal() => {
                log::warn!("{}", e);
                context.progress.skipped(1);
                continue;
            }
            Err(e) => return Err(e),
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(()),
            sent = outbox.send(page) => {
                if sent.is_err() {
                    return Ok(());
                }
            }
        }
        context.progress.processed(1);
    }

    log::debug!("Worker {} drained its queue", id);
    Ok(())
}

/// The discovery → worker → collector pipeline.
pub struct PagePipeline {
    options: PipelineOptions,
    decoder: Arc<dyn PageDecoder>,
    progress: Arc<dyn Progress>,
}

impl PagePipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            decoder: Arc::new(FileDecoder),
            progress: Arc::new(NoProgress),
        }
    }

    /// Replaces the default file decoder.
    pub fn with_decoder(mut self, decoder: impl PageDecoder) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    pub fn with_progress(mut self, progress: impl Progress + 'static) -> Self {
        self.progress = Arc::new(progress);
        self
    }

    /// Processes every file under `root`, returning pages in completion order.
    ///
    /// The first fatal error cancels the walker and all workers and is
    /// returned; nothing collected up to that point is kept.
    pub async fn run(&self, root: &Path) -> Result<Vec<PageResult>> {
        let abort = Abort::default();
        let (file_tx, file_rx) = mpsc::channel::<FileItem>(QUEUE_CAPACITY);
        let (page_tx, mut page_rx) = mpsc::channel::<PageResult>(QUEUE_CAPACITY);

        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(self.options.parallelism + 1);

        let walker_root: PathBuf = root.to_path_buf();
        let walker_abort = abort.clone();
        let walker_progress = Arc::clone(&self.progress);
        handles.push(spawn(async move {
            let token = walker_abort.token.clone();
            match walk(walker_root, file_tx, token, walker_progress).await {
                Ok(count) => log::debug!("Walker finished after {} file(s)", count),
                Err(e) => walker_abort.fail(e),
            }
        }));

        let context = Arc::new(WorkerContext {
            options: self.options.clone(),
            decoder: Arc::clone(&self.decoder),
            progress: Arc::clone(&self.progress),
        });
        let inbox = Arc::new(tokio::sync::Mutex::new(file_rx));

        for id in 0..self.options.parallelism.max(1) {
            let inbox = Arc::clone(&inbox);
            let outbox = page_tx.clone();
            let context = Arc::clone(&context);
            let worker_abort = abort.clone();
            handles.push(spawn(async move {
                let token = worker_abort.token.clone();
                if let Err(e) = run_worker(id, inbox, outbox, context, token).await {
                    worker_abort.fail(e);
                }
            }));
        }
        // Only workers hold senders now, so the queue closes once they are all done.
        drop(page_tx);

        let mut pages = Vec::new();
        loop {
            tokio::select! {
                biased;
                _ = abort.token.cancelled() => break,
                page = page_rx.recv() => match page {
                    Some(page) => pages.push(page),
                    None => break,
                },
            }
        }
        drop(page_rx);

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                abort.fail(Error::Join(e));
            }
        }

        if let Some(error) = abort.take() {
            return Err(error);
        }

        log::info!(
            "Processed {} file(s) into {} image(s)",
            pages.len(),
            pages.iter().map(|p| p.images.len()).sum::<usize>()
        );
        Ok(pages)
    }

    /// Runs the pipeline and sorts the result into book order.
    pub async fn run_sequenced(&self, root: &Path) -> Result<Vec<PageResult>> {
        let pages = self.run(root).await?;
        sequence_pages(pages, root)
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

/// Counters shared by the parallel parse phase of `Project::load`.
#[derive(Clone)]
pub struct LoadProgress {
    inner: Arc<Inner>,
}

struct Inner {
    files_total: AtomicUsize,
    files_parsed: AtomicUsize,
    statements_found: AtomicUsize,
    started_at: Instant,
    bar: Option<ProgressBar>,
}

pub struct LoadSnapshot {
    pub files_total: usize,
    pub files_parsed: usize,
    pub statements_found: usize,
    pub elapsed_ms: u64,
}

impl LoadProgress {
    /// Silent counters.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Counters mirrored on a terminal progress bar.
    pub fn with_bar() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner} parsing [{bar:30}] {pos}/{len} files")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        Self::build(Some(bar))
    }

    fn build(bar: Option<ProgressBar>) -> Self {
        Self {
            inner: Arc::new(Inner {
                files_total: AtomicUsize::new(0),
                files_parsed: AtomicUsize::new(0),
                statements_found: AtomicUsize::new(0),
                started_at: Instant::now(),
                bar,
            }),
        }
    }

    pub fn start(&self, total_files: usize) {
        self.inner.files_total.store(total_files, Ordering::Release);
        if let Some(bar) = &self.inner.bar {
            bar.set_length(total_files as u64);
        }
    }

    pub fn inc(&self, statements: usize) {
        self.inner.files_parsed.fetch_add(1, Ordering::Relaxed);
        self.inner
            .statements_found
            .fetch_add(statements, Ordering::Relaxed);
        if let Some(bar) = &self.inner.bar {
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.inner.bar {
            bar.finish_and_clear();
        }
    }

    pub fn snapshot(&self) -> LoadSnapshot {
        LoadSnapshot {
            files_total: self.inner.files_total.load(Ordering::Acquire),
            files_parsed: self.inner.files_parsed.load(Ordering::Acquire),
            statements_found: self.inner.statements_found.load(Ordering::Acquire),
            elapsed_ms: self.inner.started_at.elapsed().as_millis() as u64,
        }
    }
}

impl Default for LoadProgress {
    fn default() -> Self {
        Self::new()
    }
}

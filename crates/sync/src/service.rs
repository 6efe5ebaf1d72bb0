use crate::{LibrarySource, LibrarySync, ObjectSource, ObjectSync};
use deken_index::QueryEngine;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Summary of one [`RefreshService::refresh_all`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshPass {
    /// `None` without a library source, or when it failed.
    pub library: Option<LibrarySync>,
    /// Summed over all object sources that could be listed.
    pub objects: ObjectSync,
    /// Sources that failed as a whole.
    pub errors: usize,
}

/// Owns the sources feeding a [`QueryEngine`]'s indexes and refreshes them
/// periodically.
pub struct RefreshService {
    engine: QueryEngine,
    library: Option<LibrarySource>,
    objects: Vec<ObjectSource>,
    interval: Duration,
}
impl RefreshService {
    /// Intervals below one second are raised to one second.
    pub fn new(engine: QueryEngine, interval: Duration) -> Self {
        Self {
            engine,
            library: None,
            objects: Vec::new(),
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn with_library(mut self, source: LibrarySource) -> Self {
        self.library = Some(source);
        self
    }

    pub fn with_objects(mut self, source: ObjectSource) -> Self {
        self.objects.push(source);
        self
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One pass over every source: the library list first, then each object
    /// backend in turn. Failures are logged and leave the affected index
    /// as it was; they never stop the pass.
    pub async fn refresh_all(&mut self) -> RefreshPass {
        let mut pass = RefreshPass::default();
        if let Some(library) = self.library.as_mut() {
            match library.refresh(self.engine.libraries()).await {
                Ok(outcome) => pass.library = Some(outcome),
                Err(err) => {
                    tracing::warn!(error = ?err, "Library refresh failed; keeping last-good index");
                    pass.errors += 1;
                },
            }
        }
        for source in &mut self.objects {
            match source.sync(self.engine.objects()).await {
                Ok(counts) => pass.objects += counts,
                Err(err) => {
                    tracing::warn!(backend = source.name(), error = ?err, "Object sync failed; keeping last-good index");
                    pass.errors += 1;
                },
            }
        }
        tracing::info!(
            libraries = self.engine.libraries().len(),
            objects = self.engine.objects().len(),
            updated = pass.objects.updated,
            retracted = pass.objects.retracted,
            errors = pass.errors,
            "Refresh pass complete"
        );
        pass
    }

    /// Refreshes now, then once per interval, until `shutdown` resolves.
    ///
    /// Shutdown is only noticed between passes.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Refresh service started");
        let mut ticker = tokio::time::interval(self.interval);
        // A slow pass pushes the schedule back rather than causing a burst.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = std::pin::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.refresh_all().await;
                },
            }
        }
        tracing::info!("Refresh service stopped");
    }
}

//! Discovery of files to dispatch.
//!
//! The collector subscribes to live changes first, then reconciles files
//! already sitting in the source directory. Both paths feed the same
//! unprocessed queue. A live file is only dispatched once it has stopped
//! changing for the settle period, so writers are never raced.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError};
use std::time::{Duration, SystemTime};

use filedispatch_common::{Message, enqueue, enqueue_on};
use glob::{MatchOptions, Pattern};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::runtime::Handle;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{Result, WatcherError};
use crate::event::{Change, ChangeKind};
use crate::rules::RuleTable;

/// Capacity of the queue between the notify thread and the intake task.
const CHANGE_QUEUE_CAPACITY: usize = 1024;

/// Default quiet period before a new file is dispatched.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(1);

/// Collector lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectorState {
    #[default]
    Idle,
    Reconciling,
    Watching,
    Stopping,
    Stopped,
}

impl CollectorState {
    fn is_active(self) -> bool {
        matches!(self, Self::Reconciling | Self::Watching)
    }
}

/// Watches one source directory and emits a [`Message`] per file to
/// dispatch.
pub struct Collector {
    intake: Arc<Intake>,
    settle: Duration,
    state: Arc<RwLock<CollectorState>>,
    runtime: Mutex<Runtime>,
}

#[derive(Default)]
struct Runtime {
    watcher: Option<RecommendedWatcher>,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
    feeder: Option<JoinHandle<()>>,
}

/// Turns candidate paths into messages.
struct Intake {
    source: PathBuf,
    rules: Arc<RuleTable>,
    tx: mpsc::Sender<Message>,
    reconciled: std::sync::Mutex<Reconciled>,
}

/// Files found by the last reconciliation pass.
#[derive(Default)]
struct Reconciled {
    at: Option<Instant>,
    paths: HashSet<PathBuf>,
}

impl Collector {
    /// Create an idle collector for `source`.
    ///
    /// The source is canonicalized so that paths reported by the watch
    /// backend compare equal to it.
    pub fn new(
        source: impl AsRef<Path>,
        rules: Arc<RuleTable>,
        tx: mpsc::Sender<Message>,
    ) -> Result<Self> {
        let source = source.as_ref();
        let source = std::fs::canonicalize(source)
            .map_err(|_| WatcherError::DirectoryNotFound(source.display().to_string()))?;
        if !source.is_dir() {
            return Err(WatcherError::NotADirectory(source.display().to_string()));
        }

        Ok(Self {
            intake: Arc::new(Intake {
                source,
                rules,
                tx,
                reconciled: std::sync::Mutex::new(Reconciled::default()),
            }),
            settle: DEFAULT_SETTLE,
            state: Arc::new(RwLock::new(CollectorState::Idle)),
            runtime: Mutex::new(Runtime::default()),
        })
    }

    /// Set how long a new file must stay unchanged before it is dispatched.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Canonical source directory.
    pub fn source(&self) -> &Path {
        &self.intake.source
    }

    pub async fn state(&self) -> CollectorState {
        *self.state.read().await
    }

    /// Watch the source directory, then reconcile what is already there.
    ///
    /// Returns once the scan is done; reconciled messages are handed to the
    /// queue in the background so a full queue never delays the watch.
    pub async fn start(&self) -> Result<()> {
        let mut runtime = self.runtime.lock().await;

        if self.state.read().await.is_active() {
            return Ok(());
        }

        *self.state.write().await = CollectorState::Reconciling;

        let (change_tx, change_rx) = mpsc::channel(CHANGE_QUEUE_CAPACITY);
        let watcher = match watch(&self.intake.source, change_tx, Handle::current()) {
            Ok(watcher) => watcher,
            Err(e) => {
                *self.state.write().await = CollectorState::Stopped;
                return Err(e);
            }
        };

        let cancel = CancellationToken::new();
        runtime.handle = Some(tokio::spawn(follow(
            self.intake.clone(),
            change_rx,
            self.settle,
            cancel.clone(),
        )));
        runtime.watcher = Some(watcher);
        runtime.cancel = Some(cancel.clone());

        let messages = match self.intake.scan().await {
            Ok(messages) => messages,
            Err(e) => {
                shutdown(&mut runtime).await;
                *self.state.write().await = CollectorState::Stopped;
                return Err(e);
            }
        };
        info!(source = %self.source().display(), found = messages.len(), "Reconciliation complete");

        runtime.feeder = Some(tokio::spawn(feed(self.intake.tx.clone(), messages, cancel)));

        *self.state.write().await = CollectorState::Watching;
        info!(source = %self.source().display(), "Watching for new files");

        Ok(())
    }

    /// Cancel the watch subscription.
    ///
    /// Messages already handed over are left to the consumers. Files still
    /// settling are picked up by the next reconciliation.
    pub async fn stop(&self) {
        let mut runtime = self.runtime.lock().await;

        if !self.state.read().await.is_active() {
            return;
        }

        *self.state.write().await = CollectorState::Stopping;
        shutdown(&mut runtime).await;
        *self.state.write().await = CollectorState::Stopped;
        info!(source = %self.source().display(), "Collector stopped");
    }

    /// Enqueue every matching file already in the source directory.
    ///
    /// Returns the number of messages sent.
    pub async fn reconcile(&self) -> Result<usize> {
        let messages = self.intake.scan().await?;
        let found = messages.len();
        for message in messages {
            self.intake
                .tx
                .send(message)
                .await
                .map_err(|_| WatcherError::ChannelClosed)?;
        }
        Ok(found)
    }
}

async fn shutdown(runtime: &mut Runtime) {
    // Dropping the watcher closes the change queue.
    runtime.watcher = None;

    if let Some(cancel) = runtime.cancel.take() {
        cancel.cancel();
    }
    if let Some(handle) = runtime.handle.take()
        && let Err(e) = handle.await
    {
        error!("Change intake ended abnormally: {e}");
    }
    if let Some(feeder) = runtime.feeder.take()
        && let Err(e) = feeder.await
    {
        error!("Reconciliation feed ended abnormally: {e}");
    }
}

/// Subscribe to changes directly inside `source`.
///
/// The callback runs on the backend's thread and never blocks it: sends
/// that do not fit are deferred onto `runtime`.
fn watch(
    source: &Path,
    change_tx: mpsc::Sender<Change>,
    runtime: Handle,
) -> Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(
        move |res: std::result::Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                for change in Change::from_event(event) {
                    enqueue_on(&runtime, &change_tx, change, "changes");
                }
            }
            Err(e) => error!("Watch error: {e}"),
        },
    )?;

    watcher.watch(source, RecursiveMode::NonRecursive)?;
    debug!(source = %source.display(), "Watch subscription active");

    Ok(watcher)
}

/// Hand reconciled messages to the unprocessed queue until done or
/// cancelled.
async fn feed(tx: mpsc::Sender<Message>, messages: Vec<Message>, cancel: CancellationToken) {
    for message in messages {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Reconciliation feed cancelled");
                return;
            }
            sent = tx.send(message) => {
                if sent.is_err() {
                    debug!("Unprocessed queue closed, ending reconciliation feed");
                    return;
                }
            }
        }
    }
}

/// Process changes until cancelled or the watcher is gone.
async fn follow(
    intake: Arc<Intake>,
    mut changes: mpsc::Receiver<Change>,
    settle: Duration,
    cancel: CancellationToken,
) {
    let mut pending = Pending::new(settle);

    loop {
        let wake = pending.next_deadline();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            change = changes.recv() => match change {
                Some(change) => intake.observe(&mut pending, change).await,
                None => break,
            },
            _ = tokio::time::sleep_until(wake.unwrap_or_else(Instant::now)), if wake.is_some() => {
                for (path, first_seen) in pending.settled(Instant::now()).await {
                    intake.dispatch(path, first_seen).await;
                }
            }
        }
    }

    if !pending.is_empty() {
        debug!(unsettled = pending.len(), "Dropping files that had not settled");
    }
}

/// Size and modification time of a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    len: u64,
    modified: Option<SystemTime>,
}

impl Snapshot {
    /// `None` when the path is gone or is not a regular file.
    async fn take(path: &Path) -> Option<Self> {
        let metadata = tokio::fs::symlink_metadata(path).await.ok()?;
        metadata.is_file().then(|| Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

/// New files waiting to stop changing.
struct Pending {
    settle: Duration,
    files: HashMap<PathBuf, Settling>,
}

struct Settling {
    first_seen: Instant,
    deadline: Instant,
    snapshot: Option<Snapshot>,
}

impl Pending {
    fn new(settle: Duration) -> Self {
        Self {
            settle,
            files: HashMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.files.len()
    }

    fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.files.values().map(|file| file.deadline).min()
    }

    /// Start settling `path`, or restart its quiet period.
    async fn track(&mut self, path: PathBuf, now: Instant) {
        let snapshot = Snapshot::take(&path).await;
        let deadline = now + self.settle;

        self.files
            .entry(path)
            .and_modify(|file| {
                file.deadline = deadline;
                file.snapshot = snapshot;
            })
            .or_insert(Settling {
                first_seen: now,
                deadline,
                snapshot,
            });
    }

    fn forget(&mut self, path: &Path) {
        self.files.remove(path);
    }

    /// Remove and return files whose quiet period is over and whose size
    /// and modification time did not move since they were last seen.
    ///
    /// Files that changed without an event get a new quiet period. Files
    /// that vanished or stopped being regular files are dropped.
    async fn settled(&mut self, now: Instant) -> Vec<(PathBuf, Instant)> {
        let due: Vec<PathBuf> = self
            .files
            .iter()
            .filter(|(_, file)| file.deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();

        let mut ready = Vec::new();
        for path in due {
            let current = Snapshot::take(&path).await;
            let Some(file) = self.files.get_mut(&path) else {
                continue;
            };

            match current {
                None => {
                    debug!(path = %path.display(), "Dropping vanished or non-regular file");
                    self.files.remove(&path);
                }
                Some(current) if file.snapshot == Some(current) => {
                    let first_seen = file.first_seen;
                    self.files.remove(&path);
                    ready.push((path, first_seen));
                }
                Some(current) => {
                    debug!(path = %path.display(), len = current.len, "File still changing");
                    file.snapshot = Some(current);
                    file.deadline = now + self.settle;
                }
            }
        }

        ready
    }
}

impl Intake {
    /// Destination for a live change to `path`, if it is a direct child of
    /// the source with a rule.
    fn accepts(&self, path: &Path) -> Option<String> {
        if path.parent() != Some(self.source.as_path()) {
            debug!(path = %path.display(), "Ignoring change outside the source directory");
            return None;
        }

        let destination = self.rules.resolve(path);
        if destination.is_none() {
            debug!(path = %path.display(), "No rule for file, skipping");
        }
        destination.map(str::to_owned)
    }

    /// Feed one change into the settle table.
    async fn observe(&self, pending: &mut Pending, change: Change) {
        let now = Instant::now();

        match change.kind {
            ChangeKind::Added => {
                if self.accepts(&change.path).is_some() {
                    debug!(path = %change.path.display(), "File added, waiting for it to settle");
                    pending.track(change.path, now).await;
                }
            }
            ChangeKind::Modified | ChangeKind::Other => {
                if pending.contains(&change.path) {
                    pending.track(change.path, now).await;
                }
            }
            ChangeKind::Deleted => pending.forget(&change.path),
        }
    }

    /// Enqueue a settled file unless reconciliation already did.
    ///
    /// Returns whether a message was enqueued.
    async fn dispatch(&self, path: PathBuf, first_seen: Instant) -> bool {
        if self.was_reconciled(&path, first_seen) {
            debug!(path = %path.display(), "Already reconciled, skipping");
            return false;
        }

        match tokio::fs::symlink_metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => {
                debug!(path = %path.display(), "Ignoring non-regular file");
                return false;
            }
            Err(e) => {
                debug!(path = %path.display(), "Ignoring vanished path: {e}");
                return false;
            }
        }

        let Some(destination) = self.rules.resolve(&path) else {
            return false;
        };

        info!(path = %path.display(), destination, "New file detected");
        enqueue(&self.tx, Message::new(path, destination), "unprocessed");
        true
    }

    /// Whether `path` was first seen before the last scan finished and that
    /// scan found it.
    fn was_reconciled(&self, path: &Path, first_seen: Instant) -> bool {
        let reconciled = self
            .reconciled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        reconciled.at.is_some_and(|at| first_seen <= at) && reconciled.paths.contains(path)
    }

    /// One reconciliation pass over the source directory.
    async fn scan(&self) -> Result<Vec<Message>> {
        let source = self.source.clone();
        let extensions: Vec<String> = self.rules.extensions().map(str::to_string).collect();

        let candidates = tokio::task::spawn_blocking(move || scan(&source, &extensions))
            .await
            .map_err(|e| WatcherError::Io(std::io::Error::other(e)))?;

        let messages: Vec<Message> = candidates
            .into_iter()
            .filter_map(|path| {
                let destination = self.rules.resolve(&path)?;
                debug!(path = %path.display(), destination, "Reconciled file");
                Some(Message::new(path, destination))
            })
            .collect();

        let mut reconciled = self
            .reconciled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        reconciled.at = Some(Instant::now());
        reconciled.paths = messages
            .iter()
            .map(|message| message.source().to_path_buf())
            .collect();

        Ok(messages)
    }
}

/// Regular files directly inside `source` with one of `extensions`,
/// matched case-insensitively and without duplicates.
fn scan(source: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let root = Pattern::escape(&source.to_string_lossy());

    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for extension in extensions {
        let pattern = format!("{root}/*.{}", Pattern::escape(extension));
        let paths = match glob::glob_with(&pattern, options) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(pattern, "Invalid glob pattern: {e}");
                continue;
            }
        };

        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Skipping unreadable candidate: {e}");
                    continue;
                }
            };

            match std::fs::symlink_metadata(&path) {
                Ok(metadata) if metadata.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    warn!(path = %path.display(), "Cannot stat candidate: {e}");
                    continue;
                }
            }

            if seen.insert(path.clone()) {
                found.push(path);
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::config::FolderRule;

    fn rules() -> Arc<RuleTable> {
        Arc::new(RuleTable::new(&[
            FolderRule::new("/mnt/video", &["mp4"]),
            FolderRule::new("http://localhost:8000/upload", &["mp3"]),
        ]))
    }

    fn touch(path: &Path) {
        std::fs::write(path, b"content").unwrap();
    }

    async fn drain(rx: &mut mpsc::Receiver<Message>) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages.sort_by(|a, b| a.source().cmp(b.source()));
        messages
    }

    #[tokio::test]
    async fn test_reconcile_enqueues_matching_direct_children() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("clip.mp4"));
        touch(&dir.path().join("LOUD.MP3"));
        touch(&dir.path().join("notes.txt"));
        std::fs::create_dir(dir.path().join("folder.mp4")).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested").join("deep.mp4"));

        let (tx, mut rx) = mpsc::channel(16);
        let collector = Collector::new(dir.path(), rules(), tx).unwrap();

        assert_eq!(collector.reconcile().await.unwrap(), 2);

        let messages = drain(&mut rx).await;
        let source = collector.source();
        assert_eq!(
            messages,
            vec![
                Message::new(source.join("LOUD.MP3"), "http://localhost:8000/upload"),
                Message::new(source.join("clip.mp4"), "/mnt/video"),
            ]
        );
    }

    #[tokio::test]
    async fn test_reconcile_is_one_message_per_file_per_pass() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.mp4"));
        touch(&dir.path().join("b.mp4"));

        let (tx, mut rx) = mpsc::channel(16);
        let collector = Collector::new(dir.path(), rules(), tx).unwrap();

        assert_eq!(collector.reconcile().await.unwrap(), 2);
        assert_eq!(drain(&mut rx).await.len(), 2);
        assert_eq!(collector.reconcile().await.unwrap(), 2);
        assert_eq!(drain(&mut rx).await.len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reconcile_skips_symlinks() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("real.mp4");
        touch(&target);
        std::os::unix::fs::symlink(&target, dir.path().join("link.mp4")).unwrap();

        let (tx, _rx) = mpsc::channel(16);
        let collector = Collector::new(dir.path(), rules(), tx).unwrap();

        assert_eq!(collector.reconcile().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_observe_only_tracks_qualifying_additions() {
        let dir = TempDir::new().unwrap();
        let (tx, _rx) = mpsc::channel(16);
        let collector = Collector::new(dir.path(), rules(), tx).unwrap();
        let source = collector.source().to_path_buf();
        let intake = collector.intake.clone();
        let mut pending = Pending::new(Duration::from_secs(60));

        let clip = source.join("clip.mp4");
        touch(&clip);
        let unmapped = source.join("notes.txt");
        touch(&unmapped);
        std::fs::create_dir(source.join("nested")).unwrap();
        let nested = source.join("nested").join("deep.mp4");
        touch(&nested);

        intake.observe(&mut pending, Change::new(ChangeKind::Modified, &clip)).await;
        assert!(pending.is_empty());

        intake.observe(&mut pending, Change::new(ChangeKind::Added, &unmapped)).await;
        intake.observe(&mut pending, Change::new(ChangeKind::Added, &nested)).await;
        intake.observe(&mut pending, Change::new(ChangeKind::Added, &clip)).await;
        assert_eq!(pending.len(), 1);
        assert!(pending.contains(&clip));

        intake.observe(&mut pending, Change::new(ChangeKind::Deleted, &clip)).await;
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_settled_waits_for_quiet_period_and_stable_size() {
        let dir = TempDir::new().unwrap();
        let clip = dir.path().join("clip.mp4");
        touch(&clip);

        let settle = Duration::from_secs(5);
        let mut pending = Pending::new(settle);
        let start = Instant::now();
        pending.track(clip.clone(), start).await;

        assert!(pending.settled(start).await.is_empty());

        // Grown without an event: the quiet period starts over.
        std::fs::OpenOptions::new()
            .append(true)
            .open(&clip)
            .unwrap()
            .write_all(b" and more")
            .unwrap();
        let due = start + settle;
        assert!(pending.settled(due).await.is_empty());
        assert_eq!(pending.next_deadline(), Some(due + settle));

        let ready = pending.settled(due + settle).await;
        assert_eq!(ready, vec![(clip, start)]);
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_settled_drops_vanished_and_non_regular_paths() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("gone.mp4");
        touch(&gone);
        let folder = dir.path().join("folder.mp4");
        std::fs::create_dir(&folder).unwrap();

        let mut pending = Pending::new(Duration::ZERO);
        let now = Instant::now();
        pending.track(gone.clone(), now).await;
        pending.track(folder, now).await;
        std::fs::remove_file(&gone).unwrap();

        assert!(pending.settled(now).await.is_empty());
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_skips_files_found_by_reconciliation() {
        let dir = TempDir::new().unwrap();
        let (tx, mut rx) = mpsc::channel(16);
        let collector = Collector::new(dir.path(), rules(), tx).unwrap();
        let intake = collector.intake.clone();

        let clip = collector.source().join("clip.mp4");
        touch(&clip);
        let seen_during_scan = Instant::now();
        assert_eq!(intake.scan().await.unwrap().len(), 1);

        assert!(!intake.dispatch(clip.clone(), seen_during_scan).await);
        assert!(intake.dispatch(clip.clone(), Instant::now()).await);
        assert_eq!(drain(&mut rx).await, vec![Message::new(&clip, "/mnt/video")]);
    }

    #[tokio::test]
    async fn test_new_rejects_missing_source() {
        let (tx, _rx) = mpsc::channel(1);
        let result = Collector::new("/nonexistent/source/12345", rules(), tx);

        assert!(matches!(result, Err(WatcherError::DirectoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_start_reconciles_then_watches() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("existing.mp4"));

        let (tx, mut rx) = mpsc::channel(16);
        let collector = Collector::new(dir.path(), rules(), tx)
            .unwrap()
            .with_settle(Duration::from_millis(100));
        assert_eq!(collector.state().await, CollectorState::Idle);

        collector.start().await.unwrap();
        assert_eq!(collector.state().await, CollectorState::Watching);

        let existing = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(existing.filename(), "existing.mp4");

        touch(&collector.source().join("fresh.mp4"));
        let fresh = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fresh.filename(), "fresh.mp4");

        collector.stop().await;
        assert_eq!(collector.state().await, CollectorState::Stopped);
    }

    #[tokio::test]
    async fn test_file_written_in_two_chunks_is_dispatched_once_complete() {
        let dir = TempDir::new().unwrap();
        let (tx, mut rx) = mpsc::channel(16);
        let collector = Collector::new(dir.path(), rules(), tx)
            .unwrap()
            .with_settle(Duration::from_millis(400));
        collector.start().await.unwrap();

        let clip = collector.source().join("clip.mp4");
        let mut file = std::fs::File::create(&clip).unwrap();
        file.write_all(&[0u8; 1000]).unwrap();
        file.flush().unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(rx.try_recv().is_err());

        file.write_all(&[1u8; 1000]).unwrap();
        file.flush().unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(rx.try_recv().is_err());

        let message = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.source(), clip.as_path());
        assert_eq!(std::fs::metadata(&clip).unwrap().len(), 2000);

        drop(file);
        collector.stop().await;
    }

    #[tokio::test]
    async fn test_start_does_not_wait_for_a_full_queue() {
        let dir = TempDir::new().unwrap();
        for index in 0..6 {
            touch(&dir.path().join(format!("existing-{index}.mp4")));
        }

        let (tx, mut rx) = mpsc::channel(2);
        let collector = Collector::new(dir.path(), rules(), tx)
            .unwrap()
            .with_settle(Duration::from_millis(50));

        tokio::time::timeout(Duration::from_secs(2), collector.start())
            .await
            .unwrap()
            .unwrap();

        let fresh = collector.source().join("fresh.mp4");
        touch(&fresh);

        let mut names = Vec::new();
        while names.len() < 7 {
            let message = tokio::time::timeout(Duration::from_secs(10), rx.recv())
                .await
                .unwrap()
                .unwrap();
            names.push(message.filename());
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());

        names.sort();
        let mut expected: Vec<String> = (0..6).map(|index| format!("existing-{index}.mp4")).collect();
        expected.push("fresh.mp4".to_string());
        assert_eq!(names, expected);

        collector.stop().await;
    }
}

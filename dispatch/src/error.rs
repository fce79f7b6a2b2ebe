use filedispatch_directory_watcher::WatcherError;
use filedispatch_notifier::NotifierError;
use filedispatch_workers::WorkerError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors raised while building or starting the pipeline.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Watcher(#[from] WatcherError),

    #[error(transparent)]
    Notifier(#[from] NotifierError),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

use std::{error::Error, sync::Arc};

use thiserror::Error;

/// Error value carried by the `error` channel of every `Observer`.
///
/// Producers wrap their own error types in an `Arc` before signalling them so the
/// same error can be multicast to many observers.
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// Errors produced by `rxkit` itself.
#[derive(Debug, Error)]
pub enum RxError {
    /// A user supplied transformation returned an error.
    #[error("`{operator}` operator failed: {source}")]
    Operator {
        operator: &'static str,
        #[source]
        source: Box<dyn Error + Send + Sync + 'static>,
    },

    /// Awaiting the task or thread behind a subscription failed.
    #[error("failed to join observable: {0}")]
    Join(String),

    /// Blocking `join` was called on a subscription driven by a Tokio task.
    #[error("observable is driven by a Tokio task, use `join_concurrent().await` instead")]
    BlockingJoinOnTask,

    /// A Tokio backed scheduler was requested outside of a Tokio runtime.
    #[error("no Tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

impl RxError {
    pub(crate) fn operator(
        operator: &'static str,
        source: impl Error + Send + Sync + 'static,
    ) -> SharedError {
        Arc::new(RxError::Operator {
            operator,
            source: Box::new(source),
        })
    }
}

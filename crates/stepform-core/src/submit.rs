//! Submit callback seam

use crate::error::SubmitError;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use stepform_schema::FormValueTree;

/// Receives the full value tree once every step validates
///
/// Implementations wrap the transport (REST call, queue, file write). The engine
/// calls `submit` at most once per user trigger and never retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    /// Deliver the form data
    ///
    /// # Errors
    /// `Rejected` when the receiver refuses the data, `Transport` when it was unreachable
    async fn submit(&self, data: FormValueTree) -> Result<(), SubmitError>;
}

/// Adapter turning an async closure into a [`SubmitHandler`]
pub struct FnSubmitHandler<F> {
    f: F,
}

impl<F> fmt::Debug for FnSubmitHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSubmitHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> SubmitHandler for FnSubmitHandler<F>
where
    F: Fn(FormValueTree) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), SubmitError>> + Send,
{
    async fn submit(&self, data: FormValueTree) -> Result<(), SubmitError> {
        (self.f)(data).await
    }
}

/// Wrap an async closure as a shared handler
#[must_use]
pub fn submit_fn<F, Fut>(f: F) -> Arc<dyn SubmitHandler>
where
    F: Fn(FormValueTree) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SubmitError>> + Send + 'static,
{
    Arc::new(FnSubmitHandler { f })
}

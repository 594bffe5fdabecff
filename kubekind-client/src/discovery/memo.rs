//! Single-flight, write-once cells for discovery stages
use std::{future::Future, sync::Arc};

use futures::{
    future::{BoxFuture, Shared},
    FutureExt, TryFutureExt,
};
use parking_lot::Mutex;

use crate::Error;

type SharedResult<T> = Shared<BoxFuture<'static, Result<T, Arc<Error>>>>;

/// A cell computing its value at most once per process
///
/// The first caller installs the computation and every caller, concurrent or
/// later, awaits that same computation. Failures are stored like values, so a
/// failed stage is never retried and all callers observe the same error.
pub(crate) struct Memo<T> {
    cell: Mutex<Option<SharedResult<T>>>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self { cell: Mutex::new(None) }
    }
}

impl<T> Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Value of the cell, running `init` if no computation has been installed yet
    ///
    /// `init` is only called to construct the future and must not block.
    /// A failure that is itself a shared [`Error::Discovery`] is stored as is,
    /// so a chain of stages reports the same root error.
    pub(crate) async fn get_or_init<F, Fut>(&self, init: F) -> Result<T, Arc<Error>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let shared = {
            let mut cell = self.cell.lock();
            cell.get_or_insert_with(|| {
                tracing::trace!("Starting memoized computation");
                init()
                    .map_err(|err| match err {
                        Error::Discovery(shared) => shared,
                        other => Arc::new(other),
                    })
                    .boxed()
                    .shared()
            })
            .clone()
        };
        shared.await
    }

    /// Whether a computation has been installed
    pub(crate) fn is_initialized(&self) -> bool {
        self.cell.lock().is_some()
    }

    /// The settled outcome, without starting or waiting on a computation
    pub(crate) fn peek(&self) -> Option<Result<T, Arc<Error>>> {
        self.cell.lock().as_ref().and_then(Shared::peek).cloned()
    }
}

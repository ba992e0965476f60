//! Cancellable, shareable catalog fetches
//!
//! [`RemoteFetcher`] turns one [`Transport`] call into a [`PendingFetch`]:
//! a cloneable handle whose outcome every holder observes, and which can be
//! aborted from anywhere. Aborting settles all waiters with
//! [`FetchFailure::Cancelled`] instead of leaving them hanging.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{AbortHandle, Abortable, BoxFuture, FutureExt, Shared};
use tracing::debug;

use crate::client::Transport;
use crate::error::FetchFailure;
use crate::types::RemoteResponse;

/// Result every holder of a [`PendingFetch`] observes
pub type FetchOutcome = std::result::Result<Arc<RemoteResponse>, FetchFailure>;

static NEXT_FETCH_ID: AtomicU64 = AtomicU64::new(1);

/// An in-flight GET that any number of callers may await.
#[derive(Clone)]
pub struct PendingFetch {
    id: u64,
    url: Arc<str>,
    outcome: Shared<BoxFuture<'static, FetchOutcome>>,
    abort: AbortHandle,
}

impl PendingFetch {
    /// Process-unique id, used to tell fetches for the same key apart
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Wait for the shared outcome.
    pub async fn outcome(&self) -> FetchOutcome {
        self.outcome.clone().await
    }

    /// Abort the request. Safe to call repeatedly or after completion.
    pub fn abort(&self) {
        debug!(fetch_id = self.id, url = %self.url, "aborting fetch");
        self.abort.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_aborted()
    }
}

impl fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFetch")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

/// Issues catalog GETs through a shared [`Transport`].
#[derive(Clone)]
pub struct RemoteFetcher {
    transport: Arc<dyn Transport>,
}

impl RemoteFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Start a GET for `url`.
    ///
    /// The request runs when the returned handle is first awaited. Any status
    /// outside 2xx settles as [`FetchFailure::Status`].
    pub fn fetch(&self, url: &str) -> PendingFetch {
        let id = NEXT_FETCH_ID.fetch_add(1, Ordering::Relaxed);
        let url: Arc<str> = Arc::from(url);
        let transport = Arc::clone(&self.transport);
        let request_url = Arc::clone(&url);

        let request = async move {
            let response = transport.get(&request_url).await?;
            if !(200..300).contains(&response.status) {
                return Err(FetchFailure::Status(response.status));
            }
            Ok(Arc::new(response))
        };

        let (abort, registration) = AbortHandle::new_pair();
        let outcome = Abortable::new(request, registration)
            .map(|result| result.unwrap_or(Err(FetchFailure::Cancelled)))
            .boxed()
            .shared();

        PendingFetch {
            id,
            url,
            outcome,
            abort,
        }
    }
}

impl fmt::Debug for RemoteFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFetcher").finish_non_exhaustive()
    }
}

use tokio::sync::OnceCell;
use tracing::info;

use crate::error::ClientResult;
use crate::gateway::ApiClient;
use crate::model::Session;

/// Process-wide session state.
///
/// The token is created at most once per process lifetime. Concurrent
/// callers of [`get_or_create`](Self::get_or_create) share the same
/// in-flight request; a failed creation leaves the cell empty so the
/// caller may retry. Readers never wait: [`current`](Self::current) simply
/// reports whether a token exists right now.
#[derive(Debug, Default)]
pub struct SessionManager {
    cell: OnceCell<Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking read of the cached session. Components building
    /// requests call this and proceed tokenless when it is `None`.
    pub fn current(&self) -> Option<&Session> {
        self.cell.get()
    }

    /// Fetch the cached session, creating it on first call.
    pub async fn get_or_create(&self, api: &ApiClient) -> ClientResult<&Session> {
        self.cell
            .get_or_try_init(|| async {
                let session: Session = api.post_empty("/session", &[]).await?;
                info!(token = %session.token, "session created");
                Ok(session)
            })
            .await
    }
}

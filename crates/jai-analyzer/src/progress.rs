//! Work-done progress reporting via the LSP `$/progress` notification.
//!
//! Compiler runs can take seconds, so go-to-definition and startup indexing
//! announce themselves with a `Begin` / `End` pair that the editor shows in
//! its activity indicator.
//!
//! ```ignore
//! let token = ProgressToken::begin(&client, "Indexing", Some("Compiling build.jai".into())).await;
//! token.end(Some("Indexed 120 definitions".into())).await;
//! ```

use std::{
    panic::AssertUnwindSafe,
    sync::atomic::{AtomicU64, Ordering},
};

use futures::FutureExt;
use tower_lsp::{Client, lsp_types::*};
use tracing::{debug, warn};

static NEXT_PROGRESS_ID: AtomicU64 = AtomicU64::new(1);
const PROGRESS_TITLE_PREFIX: &str = "jai-analyzer:";

/// An open progress session; ended by [`end`](Self::end) or, failing that,
/// by `Drop` with a "Cancelled" message.
pub struct ProgressToken {
    session: Option<(Client, NumberOrString)>,
}

impl ProgressToken {
    /// Create the token on the client and send `Begin`.
    ///
    /// The create request runs on its own task: editors that do not support
    /// it still render the notifications, and a slow reply must not hold up
    /// the request being reported on.
    pub async fn begin(
        client: &Client,
        title: &str,
        message: Option<String>,
    ) -> Self {
        let id = NEXT_PROGRESS_ID.fetch_add(1, Ordering::Relaxed);
        let token = NumberOrString::String(format!("jaiAnalyzer/{title}/{id}"));

        let create_client = client.clone();
        let create_token = token.clone();
        tokio::spawn(async move {
            let params = WorkDoneProgressCreateParams {
                token: create_token,
            };
            match AssertUnwindSafe(create_client.send_request::<request::WorkDoneProgressCreate>(params))
                .catch_unwind()
                .await
            {
                Ok(Ok(())) => {},
                Ok(Err(error)) => debug!("workDoneProgress/create rejected: {error}"),
                Err(_) => warn!("workDoneProgress/create panicked (client may have disconnected)"),
            }
        });

        let begin = WorkDoneProgress::Begin(WorkDoneProgressBegin {
            title: prefixed_progress_title(title),
            cancellable: Some(false),
            message,
            percentage: None,
        });
        if !send_progress(client, token.clone(), begin).await {
            warn!("progress begin for {title} not delivered");
            return Self {
                session: None,
            };
        }

        Self {
            session: Some((client.clone(), token)),
        }
    }

    pub async fn end(
        mut self,
        message: Option<String>,
    ) {
        if let Some((client, token)) = self.session.take() {
            send_progress(&client, token, end_progress(message)).await;
        }
    }
}

impl Drop for ProgressToken {
    fn drop(&mut self) {
        if let Some((client, token)) = self.session.take() {
            debug!("progress cancelled (drop): {token:?}");
            tokio::spawn(async move {
                send_progress(&client, token, end_progress(Some("Cancelled".to_string()))).await;
            });
        }
    }
}

fn end_progress(message: Option<String>) -> WorkDoneProgress {
    WorkDoneProgress::End(WorkDoneProgressEnd {
        message,
    })
}

/// Returns `false` when the client went away mid-send.
async fn send_progress(
    client: &Client,
    token: NumberOrString,
    value: WorkDoneProgress,
) -> bool {
    let params = ProgressParams {
        token,
        value: ProgressParamsValue::WorkDone(value),
    };
    AssertUnwindSafe(client.send_notification::<notification::Progress>(params)).catch_unwind().await.is_ok()
}

fn prefixed_progress_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.starts_with(PROGRESS_TITLE_PREFIX) {
        return trimmed.to_owned();
    }
    format!("{PROGRESS_TITLE_PREFIX} {trimmed}")
}

#[cfg(test)]
#[path = "../tests/src/progress_tests.rs"]
mod tests;

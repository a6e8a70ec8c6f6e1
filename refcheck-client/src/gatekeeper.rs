//! Request gatekeeper: the single chokepoint for outbound calls.
//!
//! Attaches credentials, serializes dispatches during the exclusion
//! window, and classifies HTTP failures into the [`SyncError`] taxonomy
//! with exactly one user notice per failed response.

use crate::config::RetryConfig;
use crate::error::SyncError;
use crate::notify::Notifier;
use crate::session::SessionAuthority;
use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};
use refcheck_core::Severity;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Header carrying the anti-forgery token on every call.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

pub struct Gatekeeper {
    transport: Arc<dyn Transport>,
    session: Arc<SessionAuthority>,
    notifier: Arc<dyn Notifier>,
    retry: RetryConfig,
    /// Exclusion window. Held while a 401 is handled or the token is
    /// rotated; dispatches queue behind it in FIFO order.
    window: Mutex<()>,
}

impl Gatekeeper {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<SessionAuthority>,
        notifier: Arc<dyn Notifier>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            transport,
            session,
            notifier,
            retry,
            window: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &SessionAuthority {
        &self.session
    }

    /// Acquire the exclusion window. While the returned guard lives, every
    /// dispatch queues behind it; used while rotating the anti-forgery
    /// token after re-authentication.
    pub async fn exclusion_window(&self) -> MutexGuard<'_, ()> {
        self.window.lock().await
    }

    /// Dispatch one request.
    ///
    /// Waits out any active exclusion window, attaches the current
    /// anti-forgery token, executes the call, and classifies failures.
    /// The result is returned to the caller unchanged apart from those
    /// side effects: failed responses are never retried, and nothing is
    /// swallowed.
    pub async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, SyncError> {
        // Wait until no window is held, then release before the network
        // call so concurrent requests stay concurrent.
        drop(self.window.lock().await);

        let mut headers = Vec::new();
        if let Some(token) = self.session.csrf_token() {
            headers.push((CSRF_HEADER.to_string(), token));
        }

        debug!(method = request.method.as_str(), path = %request.path, "dispatch");
        let response = match self.send_with_retry(request, &headers).await {
            Ok(response) => response,
            Err(err) => {
                warn!(path = %request.path, error = %err, "transport failure");
                self.notifier
                    .notify(&format!("Network error: {err}"), Severity::Error);
                return Err(SyncError::Network(err));
            }
        };

        if response.is_success() {
            return Ok(response);
        }

        match response.status {
            401 => {
                // Hold the window while the expiry is recorded so queued
                // dispatches observe the flag and the notice fires once
                // per observed expiry.
                let _window = self.window.lock().await;
                if self.session.mark_expired() {
                    warn!(path = %request.path, "session expired");
                    self.notifier
                        .notify("Session expired or unauthorized", Severity::Error);
                }
                Err(SyncError::SessionExpired)
            }
            403 => {
                warn!(path = %request.path, "permission denied");
                self.notifier
                    .notify("Insufficient permission", Severity::Warning);
                Err(SyncError::PermissionDenied)
            }
            status => {
                let body = body_text(&response.body);
                warn!(path = %request.path, status, "request failed");
                self.notifier.notify(
                    &format!("Request failed ({status}): {body}"),
                    Severity::Error,
                );
                Err(SyncError::Http { status, body })
            }
        }
    }

    /// Execute the transport call, retrying transport-level failures up
    /// to the configured attempt count. HTTP responses are never retried;
    /// with the default of one attempt this never retries at all.
    async fn send_with_retry(
        &self,
        request: &ApiRequest,
        headers: &[(String, String)],
    ) -> Result<ApiResponse, TransportError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.transport.send(request, headers).await {
                Ok(response) => return Ok(response),
                Err(err) if attempt < self.retry.max_attempts => {
                    debug!(path = %request.path, attempt, error = %err, "retrying");
                    if self.retry.backoff_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(self.retry.backoff_ms)).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn body_text(body: &Value) -> String {
    match body {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_text_forms() {
        assert_eq!(body_text(&Value::Null), "");
        assert_eq!(body_text(&json!("oops")), "oops");
        assert_eq!(body_text(&json!({"error": "oops"})), r#"{"error":"oops"}"#);
    }
}

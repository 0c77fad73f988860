use crate::throttle::RefreshThrottle;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use url::Url;

/// Session identity used when the backend has not told us who we are yet.
pub const ANONYMOUS_SESSION: &str = "anonymous";

/// Capabilities the analysis client needs from the session layer.
///
/// `trigger_refresh` asks the backend to re-establish credentials and reports
/// whether the trigger itself was accepted; `check_session` probes whether a
/// valid session currently exists. Neither call blocks on user interaction.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Identifier of the current session, if one is known.
    async fn session_id(&self) -> Option<String>;

    /// Ask the backend to re-establish credentials.
    async fn trigger_refresh(&self) -> bool;

    /// Probe whether the backend considers the current session valid.
    async fn check_session(&self) -> bool;
}

#[derive(Deserialize)]
struct SessionInfo {
    session_id: String,
}

/// Session store backed by the backend's auth endpoints. Credentials live in
/// the cookie store of the reqwest client shared with the rest of the
/// application, so a successful refresh is visible to every later call.
pub struct HttpSessionStore {
    http: reqwest::Client,
    base_url: Url,
    throttle: RefreshThrottle,
    current: RwLock<Option<String>>,
}

impl HttpSessionStore {
    pub fn new(http: reqwest::Client, base_url: Url, throttle: RefreshThrottle) -> Self {
        HttpSessionStore {
            http,
            base_url,
            throttle,
            current: RwLock::new(None),
        }
    }

    fn endpoint(&self, path: &str) -> Option<Url> {
        self.base_url.join(path).ok()
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn session_id(&self) -> Option<String> {
        self.current.read().clone()
    }

    async fn trigger_refresh(&self) -> bool {
        let marker = self
            .current
            .read()
            .clone()
            .unwrap_or_else(|| ANONYMOUS_SESSION.to_string());

        // A trigger for this session went out within the throttle window;
        // report it as accepted and let the caller's probe decide.
        if self.throttle.recently_triggered(&marker) {
            tracing::debug!("auth refresh triggered recently, skipping");
            return true;
        }

        let Some(url) = self.endpoint("api/auth/refresh") else {
            return false;
        };

        match self.http.post(url).send().await {
            Ok(response) if response.status().is_success() => {
                self.throttle.mark(&marker);
                true
            }
            Ok(response) => {
                tracing::warn!(status = %response.status(), "auth refresh trigger rejected");
                false
            }
            Err(err) => {
                tracing::warn!("auth refresh trigger failed: {err}");
                false
            }
        }
    }

    async fn check_session(&self) -> bool {
        let Some(url) = self.endpoint("api/auth/session") else {
            return false;
        };

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!("session probe failed: {err}");
                return false;
            }
        };

        if !response.status().is_success() {
            return false;
        }

        // The probe body names the session; remember it for request keying.
        if let Ok(info) = response.json::<SessionInfo>().await {
            *self.current.write() = Some(info.session_id);
        }
        true
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Why a website was judged inactive. Never surfaced past the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("site unreachable: {0}")]
    Unreachable(String),
    #[error("site answered with status {0}")]
    Status(u16),
}

/// Reachability check behind the "active website" criterion.
///
/// Implementations make a single attempt; the engine never retries.
#[async_trait]
pub trait WebsiteProbe: Send + Sync {
    async fn probe(&self, url: &Url) -> Result<(), ProbeError>;
}

/// HEAD request against the candidate's site; any 2xx answer counts as active.
#[derive(Debug, Clone)]
pub struct HttpWebsiteProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpWebsiteProbe {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl WebsiteProbe for HttpWebsiteProbe {
    async fn probe(&self, url: &Url) -> Result<(), ProbeError> {
        let request = self.client.head(url.clone()).send();

        match tokio::time::timeout(self.timeout, request).await {
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
            Ok(Err(err)) if err.is_timeout() => Err(ProbeError::Timeout(self.timeout)),
            Ok(Err(err)) => Err(ProbeError::Unreachable(err.to_string())),
            Ok(Ok(response)) if response.status().is_success() => Ok(()),
            Ok(Ok(response)) => Err(ProbeError::Status(response.status().as_u16())),
        }
    }
}

/// Probe used when network checks are switched off; every site counts as inactive.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProbe;

#[async_trait]
impl WebsiteProbe for OfflineProbe {
    async fn probe(&self, _url: &Url) -> Result<(), ProbeError> {
        Err(ProbeError::Unreachable("website probing disabled".to_string()))
    }
}

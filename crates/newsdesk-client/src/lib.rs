pub mod client_ext;
pub mod config;
pub mod endp;
pub mod result;

use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::client_ext::backend::ClientBackendExt;
pub use crate::config::ClientConfig;
pub use crate::endp::{ApiCall, Deadline, NewsSubmission};
pub use crate::result::RequestResult;

pub mod prelude {
    pub use crate::client_ext::backend::ClientBackendExt as BackendExt;
    pub use crate::{endp, ApiCall, Backend, ClientConfig, RequestResult, Transport};

    pub fn build_client(config: &crate::ClientConfig) -> Result<reqwest::Client, crate::ClientError> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .build()?;
        Ok(client)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid api url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("api url {0:?} cannot carry endpoint paths")]
    CannotBeABase(String),
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Anything that can carry an [`ApiCall`] to the backend.
///
/// Implementations must not fail: every problem is reported inside the [`RequestResult`].
pub trait Transport: Clone + Send + Sync + 'static {
    fn send(&self, call: ApiCall) -> impl Future<Output = RequestResult> + Send;
}

/// The analytics backend over HTTP.
#[derive(Debug, Clone)]
pub struct Backend {
    http: Client,
    base_url: Url,
    config: Arc<ClientConfig>,
}

impl Backend {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| ClientError::InvalidUrl {
            url: config.base_url.clone(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::CannotBeABase(config.base_url));
        }
        let http = prelude::build_client(&config)?;
        log::debug!("backend client ready for {base_url}");
        Ok(Self {
            http,
            base_url,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The backend's detailed health document, passed through untouched. Transport failures
    /// come back as `{"error": "<message>"}`.
    pub async fn health_details(&self) -> String {
        let result = self.send(endp::health_details()).await;
        match result.body() {
            Some(body) => body.to_string(),
            None => serde_json::json!({ "error": result.error() }).to_string(),
        }
    }
}

impl Transport for Backend {
    async fn send(&self, call: ApiCall) -> RequestResult {
        let timeout = self.config.timeout_for(call.deadline);
        self.http.call(&self.base_url, &call, timeout).await
    }
}

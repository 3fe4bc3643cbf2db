use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use url::Url;

use crate::endp::ApiCall;
use crate::result::RequestResult;

pub trait ClientBackendExt {
    fn call(
        &self,
        base: &Url,
        call: &ApiCall,
        timeout: Duration,
    ) -> impl Future<Output = RequestResult> + Send;
}

/// Add-on methods for [`reqwest::Client`].
///
/// [`reqwest::Client`]: https://docs.rs/reqwest/latest/reqwest/struct.Client.html
impl ClientBackendExt for Client {
    /// Send `call` below `base` and fold whatever happens into a [`RequestResult`]; this
    /// never fails.
    ///
    /// [`RequestResult`]: ../../struct.RequestResult.html
    async fn call(&self, base: &Url, call: &ApiCall, timeout: Duration) -> RequestResult {
        let url = match call.url(base) {
            Ok(url) => url,
            Err(e) => {
                log::error!("{call}: cannot build url below {base}: {e}");
                return RequestResult::from_failure(format!("invalid url: {e}"));
            }
        };

        let mut request = self
            .request(call.method.clone(), url.clone())
            .timeout(timeout);
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        log::trace!("{call} -> {url} (timeout {timeout:?})");
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("{call} failed: {e}");
                return RequestResult::from_failure(describe(&e, timeout));
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => {
                let result = RequestResult::from_response(status, body);
                log::debug!("{call}: {result}");
                result
            }
            Err(e) => {
                log::warn!("{call}: unreadable response body: {e}");
                RequestResult::from_failure(describe(&e, timeout))
            }
        }
    }
}

fn describe(e: &reqwest::Error, timeout: Duration) -> String {
    if e.is_timeout() {
        format!("request timed out after {}s", timeout.as_secs())
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}

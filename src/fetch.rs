use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Can't build HTTP client: {0}")]
    ClientError(#[source] reqwest::Error),
    #[error("ReqwestError fetching {url} after {attempts} attempt(s): {source}")]
    ReqwestError {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Blocking page fetcher with a bounded retry on transport failures.
pub struct Fetcher {
    client: Client,
    retries: u32,
    backoff: Duration,
}

impl Fetcher {

    /// `timeout` of `None` waits for the server indefinitely.
    pub fn new(timeout: Option<Duration>, retries: u32, backoff: Duration) -> Result<Self> {
        let builder = Client::builder().timeout(timeout);

        // Tests talk to a localhost server; keep ambient proxy settings out.
        #[cfg(test)]
        let builder = builder.no_proxy();

        let client = builder.build().map_err(FetchError::ClientError)?;

        Ok(Self { client, retries, backoff })
    }

    /// Returns the response body whatever the status code.
    pub fn fetch(&self, url: &str) -> Result<String> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.fetch_once(url) {
                Ok(body) => return Ok(body),
                Err(e) if attempt <= self.retries && is_transient(&e) => {
                    let wait = self.backoff.saturating_mul(2u32.saturating_pow(attempt - 1));
                    warn!(
                        url,
                        attempt,
                        retries = self.retries,
                        error = %e,
                        "fetch failed, backing off {:.1}s",
                        wait.as_secs_f64()
                    );
                    std::thread::sleep(wait);
                }
                Err(source) => {
                    return Err(FetchError::ReqwestError {
                        url: url.to_string(),
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }

    fn fetch_once(&self, url: &str) -> std::result::Result<String, reqwest::Error> {
        debug!(url, "sending GET");

        let response = self.client.get(url).send()?;
        let status = response.status();
        let body = response.text()?;

        debug!(url, %status, bytes = body.len(), "response received");
        Ok(body)
    }
}

// Malformed URLs and other builder errors fail the same way every time.
fn is_transient(e: &reqwest::Error) -> bool {
    !e.is_builder()
}

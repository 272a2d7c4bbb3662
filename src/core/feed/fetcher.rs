use std::time::Duration;

use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};

/// Cache validators returned by a previous fetch of the same URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub body: Vec<u8>,
    pub validators: Validators,
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Updated(FetchedDocument),
    NotModified,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),
}

impl FetchError {
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Request(_) => true,
            FetchError::HttpStatus(code) => *code >= 500,
        }
    }
}

/// Conditional GET. When validators from an earlier fetch are supplied and
/// the document is unchanged, the server answers 304 and no body travels.
pub async fn fetch_document(
    client: &reqwest::Client,
    url: &str,
    validators: &Validators,
) -> Result<FetchOutcome, FetchError> {
    let mut request = client.get(url);
    if let Some(value) = &validators.etag {
        request = request.header(IF_NONE_MATCH, value);
    }
    if let Some(value) = &validators.last_modified {
        request = request.header(IF_MODIFIED_SINCE, value);
    }

    let response = request.send().await?;
    let status = response.status();
    if status.as_u16() == 304 {
        return Ok(FetchOutcome::NotModified);
    }
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let etag = response
        .headers()
        .get(ETAG)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    let last_modified = response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    let body = response.bytes().await?.to_vec();

    Ok(FetchOutcome::Updated(FetchedDocument {
        body,
        validators: Validators {
            etag,
            last_modified,
        },
    }))
}

/// Retries transient failures (connection errors and 5xx) with a short
/// linear backoff. Client errors are returned immediately.
pub async fn fetch_document_with_retry(
    client: &reqwest::Client,
    url: &str,
    validators: &Validators,
    max_retries: usize,
) -> Result<FetchOutcome, FetchError> {
    let mut attempt = 0_usize;
    loop {
        match fetch_document(client, url, validators).await {
            Ok(outcome) => return Ok(outcome),
            Err(error) => {
                if !error.is_transient() || attempt >= max_retries {
                    return Err(error);
                }
                attempt += 1;
                tracing::debug!(url, attempt, %error, "retrying feed fetch");
                tokio::time::sleep(Duration::from_millis(40 * attempt as u64)).await;
            }
        }
    }
}

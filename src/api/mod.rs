//! HTTP clients for the LLM vendors.

pub mod chat_completions;
pub mod gemini_api;

use reqwest::Response;
use tracing::warn;
use url::Url;

use crate::error::{LawdeskError, UpstreamError};

/// Append path segments to a base URL, with or without a trailing slash.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, LawdeskError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| LawdeskError::Config(format!("not a base url: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-2xx vendor response into [`LawdeskError::UpstreamStatus`].
pub(crate) async fn ensure_success(resp: Response) -> Result<Response, LawdeskError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.unwrap_or_default();
    let upstream = UpstreamError::from_body(&body);
    warn!(
        %status,
        upstream = %upstream.as_ref().map(ToString::to_string).unwrap_or_default(),
        "LLM vendor returned an error"
    );
    Err(LawdeskError::UpstreamStatus(status, upstream))
}

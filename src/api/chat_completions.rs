use backon::{ExponentialBuilder, Retryable};
use tracing::warn;
use url::Url;

use super::{endpoint, ensure_success};
use crate::error::LawdeskError;
use crate::types::chat_completions::{ChatCompletionRequest, ChatCompletionResponse};

/// GLM-4 compatible `chat/completions` endpoint.
pub struct ChatCompletionsApi;

impl ChatCompletionsApi {
    pub async fn try_post(
        client: &reqwest::Client,
        base_url: &Url,
        api_key: &str,
        retry_policy: ExponentialBuilder,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<ChatCompletionResponse, LawdeskError> {
        let url = endpoint(base_url, &["chat", "completions"])?;

        (|| async {
            let resp = client
                .post(url.clone())
                .bearer_auth(api_key)
                .json(body)
                .send()
                .await
                .map_err(reqwest::Error::without_url)?;
            let resp = ensure_success(resp).await?;
            let parsed = resp
                .json::<ChatCompletionResponse>()
                .await
                .map_err(reqwest::Error::without_url)?;
            Ok::<_, LawdeskError>(parsed)
        })
        .retry(retry_policy)
        .when(LawdeskError::is_retryable)
        .notify(|err: &LawdeskError, dur| {
            warn!(error = %err, retry_in = ?dur, "chat completion failed, retrying");
        })
        .await
    }
}

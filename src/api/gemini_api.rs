use backon::{ExponentialBuilder, Retryable};
use tracing::warn;
use url::Url;

use super::{endpoint, ensure_success};
use crate::error::LawdeskError;
use crate::types::gemini::{GenerateContentRequest, GenerateContentResponse};

pub struct GeminiApi;

impl GeminiApi {
    pub async fn try_generate(
        client: &reqwest::Client,
        base_url: &Url,
        api_key: &str,
        model: &str,
        retry_policy: ExponentialBuilder,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LawdeskError> {
        let method = format!("{model}:generateContent");
        let url = endpoint(base_url, &["models", &method])?;

        (|| async {
            let resp = client
                .post(url.clone())
                .header("x-goog-api-key", api_key)
                .json(body)
                .send()
                .await
                .map_err(reqwest::Error::without_url)?;
            let resp = ensure_success(resp).await?;
            let parsed = resp
                .json::<GenerateContentResponse>()
                .await
                .map_err(reqwest::Error::without_url)?;
            Ok::<_, LawdeskError>(parsed)
        })
        .retry(retry_policy)
        .when(LawdeskError::is_retryable)
        .notify(|err: &LawdeskError, dur| {
            warn!(error = %err, retry_in = ?dur, "Gemini request failed, retrying");
        })
        .await
    }
}

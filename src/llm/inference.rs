use async_trait::async_trait;
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderValue, AUTHORIZATION } };

use super::{ error_for_status, BackendError, InferenceBackend };
use crate::models::payload::{ InferenceResponse, Payload };

/// Client for the hosted inference API. The chatbot id is appended to the endpoint as-is,
/// so the endpoint is expected to end with `/`.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: HttpClient,
    endpoint: String,
}

impl InferenceClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            http: HttpClient::new(),
            endpoint,
        }
    }

    pub fn url_for(&self, chatbot: &str) -> String {
        format!("{}{}", self.endpoint, chatbot)
    }
}

#[async_trait]
impl InferenceBackend for InferenceClient {
    async fn generate(
        &self,
        chatbot: &str,
        payload: &Payload,
        authorization: &str
    ) -> Result<Option<String>, BackendError> {
        let url = self.url_for(chatbot);
        debug!("Inference request to {}", url);
        let mut auth = HeaderValue::from_str(authorization)?;
        auth.set_sensitive(true);

        let resp = self.http.post(&url).header(AUTHORIZATION, auth).json(payload).send().await?;
        let resp = error_for_status(resp).await?;
        let body = resp.json::<InferenceResponse>().await?;

        Ok(body.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn posts_payload_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let payload = Payload::with_context("hello", &[Some("earlier reply".to_string())]);
        let mock = server
            .mock("POST", "/models/deepparag/Aeona")
            .match_header("authorization", "Bearer tok-1")
            .match_body(Matcher::Json(serde_json::to_value(&payload).unwrap()))
            .with_header("content-type", "application/json")
            .with_body(json!({ "generated_text": "hi!" }).to_string())
            .create_async().await;

        let client = InferenceClient::new(format!("{}/models/", server.url()));
        let text = client.generate("deepparag/Aeona", &payload, "Bearer tok-1").await.unwrap();

        assert_eq!(text.as_deref(), Some("hi!"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn loading_model_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/some/bot")
            .with_status(503)
            .with_body(r#"{"error":"Model some/bot is currently loading"}"#)
            .create_async().await;

        let client = InferenceClient::new(format!("{}/models/", server.url()));
        let err = client.generate("some/bot", &Payload::new("hi"), "Bearer t").await.unwrap_err();

        assert!(matches!(err, BackendError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn undecodable_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", "/models/bot").with_body("<html>oops</html>").create_async().await;

        let client = InferenceClient::new(format!("{}/models/", server.url()));
        let err = client.generate("bot", &Payload::new("hi"), "Bearer t").await.unwrap_err();

        assert!(matches!(err, BackendError::Transport(_)));
    }
}

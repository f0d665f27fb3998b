use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;

use super::{ error_for_status, BackendError, DialogueBackend };

/// Client for the AIML dialogue engine: `GET <endpoint>?id=<user>&text=<message>`.
#[derive(Debug, Clone)]
pub struct AimlClient {
    http: HttpClient,
    endpoint: String,
}

impl AimlClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            http: HttpClient::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl DialogueBackend for AimlClient {
    async fn reply(&self, user_id: &str, message: &str) -> Result<String, BackendError> {
        debug!("AIML request for user {} to {}", user_id, self.endpoint);
        let resp = self.http
            .get(&self.endpoint)
            .query(&[("id", user_id), ("text", message)])
            .send().await?;
        let resp = error_for_status(resp).await?;
        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn sends_user_and_text_as_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/aiml")
            .match_query(
                Matcher::AllOf(
                    vec![
                        Matcher::UrlEncoded("id".into(), "user-7".into()),
                        Matcher::UrlEncoded("text".into(), "what is rust?".into())
                    ]
                )
            )
            .with_body("A language.")
            .create_async().await;

        let client = AimlClient::new(format!("{}/aiml", server.url()));
        let reply = client.reply("user-7", "what is rust?").await.unwrap();

        assert_eq!(reply, "A language.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/aiml")
            .match_query(Matcher::Any)
            .with_status(502)
            .with_body("bad gateway")
            .create_async().await;

        let client = AimlClient::new(format!("{}/aiml", server.url()));
        let err = client.reply("u", "hi").await.unwrap_err();

        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}

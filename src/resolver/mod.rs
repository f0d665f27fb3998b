pub mod validity;

use log::{ debug, error, info, warn };
use std::sync::{ Arc, Mutex, MutexGuard };
use std::time::Duration;

use crate::cache::{ CacheKey, ReplyCache };
use crate::credentials::CredentialSet;
use crate::llm::{ DialogueBackend, InferenceBackend };
use crate::models::payload::Payload;
use self::validity::PrimaryOutcome;

pub const MODEL_UNAVAILABLE_REPLY: &str =
    "Hmm, there was an error loading up the model. Please wait and try again later.";
pub const NO_RESPONSE_REPLY: &str = "No response.";

const LINE_BREAK_MARKERS: [&str; 2] = ["<br/>", "<br />"];

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub default_chatbot: String,
    pub cache_ttl: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_chatbot: "deepparag/Aeona".to_string(),
            cache_ttl: Duration::from_secs(300),
            max_retries: 5,
            backoff_base: Duration::from_millis(100),
        }
    }
}

/// Delay before the next inference attempt: `base * 2^retry`.
pub fn backoff_delay(base: Duration, retry: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(retry))
}

/// Turns the backends' line-break markers into newlines.
pub fn normalize_reply(reply: &str) -> String {
    LINE_BREAK_MARKERS.iter().fold(reply.to_string(), |acc, marker| acc.replace(marker, "\n"))
}

enum FallbackOutcome {
    Reply(String),
    Empty,
    Exhausted,
}

/// Picks a reply for a message, trying the AIML engine first and the inference API after it.
pub struct ReplyResolver {
    config: ResolverConfig,
    cache: ReplyCache,
    credentials: Mutex<CredentialSet>,
    dialogue: Option<Arc<dyn DialogueBackend>>,
    inference: Arc<dyn InferenceBackend>,
}

impl ReplyResolver {
    pub fn new(
        config: ResolverConfig,
        credentials: CredentialSet,
        dialogue: Option<Arc<dyn DialogueBackend>>,
        inference: Arc<dyn InferenceBackend>
    ) -> Self {
        Self {
            cache: ReplyCache::new(config.cache_ttl),
            credentials: Mutex::new(credentials),
            config,
            dialogue,
            inference,
        }
    }

    /// 1-based position of the token the next inference request will use.
    pub fn credential_cursor(&self) -> usize {
        self.credentials().cursor()
    }

    fn credentials(&self) -> MutexGuard<'_, CredentialSet> {
        self.credentials.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Always yields text: a reply, [`MODEL_UNAVAILABLE_REPLY`] or [`NO_RESPONSE_REPLY`].
    ///
    /// A missing or empty `chatbot` is replaced by the default id before the cache key is
    /// built, so it shares cache entries with requests naming the default model explicitly.
    /// Only inference replies are cached; the AIML engine keeps per-user state and is asked
    /// on every uncached request.
    pub async fn resolve(
        &self,
        message: &str,
        user_id: &str,
        context: &[Option<String>],
        chatbot: Option<&str>
    ) -> String {
        let chatbot = chatbot
            .filter(|c| !c.is_empty())
            .unwrap_or(self.config.default_chatbot.as_str());
        let key = CacheKey::new(user_id, message, chatbot);
        if let Some(reply) = self.cache.get(&key) {
            info!("Returning cached response for user {}", user_id);
            return reply;
        }

        let payload = Payload::with_context(message, context);

        if let Some(dialogue) = self.primary_for(chatbot, message) {
            match PrimaryOutcome::classify(dialogue.reply(user_id, message).await) {
                PrimaryOutcome::Valid(text) => {
                    info!("AIML response: {}", text);
                    return normalize_reply(&text);
                }
                PrimaryOutcome::Invalid(text) => {
                    debug!("AIML response rejected: {:?}", text);
                }
                PrimaryOutcome::Unavailable(e) => {
                    error!("AIML Error: {}", e);
                }
            }
        }

        match self.query_model(chatbot, &payload).await {
            FallbackOutcome::Reply(text) => {
                let reply = normalize_reply(&text);
                info!("AI response: {}", reply);
                self.cache.insert(key, reply.clone());
                debug!("Reply cache holds {} entries", self.cache.len());
                reply
            }
            FallbackOutcome::Empty => NO_RESPONSE_REPLY.to_string(),
            FallbackOutcome::Exhausted => MODEL_UNAVAILABLE_REPLY.to_string(),
        }
    }

    fn primary_for(&self, chatbot: &str, message: &str) -> Option<&Arc<dyn DialogueBackend>> {
        if chatbot != self.config.default_chatbot || message.contains(':') {
            return None;
        }
        self.dialogue.as_ref()
    }

    /// Failures drive backoff, rotation and the terminal outcome. Empty replies are
    /// bounded by a separate budget of the same size and leave those untouched.
    async fn query_model(&self, chatbot: &str, payload: &Payload) -> FallbackOutcome {
        let mut retry_count = 0;
        let mut empty_count = 0;

        while retry_count < self.config.max_retries && empty_count < self.config.max_retries {
            let authorization = self.credentials().authorization();

            match self.inference.generate(chatbot, payload, &authorization).await {
                Ok(Some(text)) if !text.is_empty() => {
                    return FallbackOutcome::Reply(text);
                }
                Ok(_) => {
                    warn!("Model {} returned no generated text", chatbot);
                    empty_count += 1;
                }
                Err(e) => {
                    error!("Model Error: {}", e);
                    let delay = backoff_delay(self.config.backoff_base, retry_count);
                    info!("Retrying in {} ms...", delay.as_millis());
                    tokio::time::sleep(delay).await;

                    retry_count += 1;
                    if retry_count == self.config.max_retries {
                        return FallbackOutcome::Exhausted;
                    }
                    let mut credentials = self.credentials();
                    credentials.rotate();
                    debug!("Switched to inference token #{}", credentials.cursor());
                }
            }
        }

        FallbackOutcome::Empty
    }
}

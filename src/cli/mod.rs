use clap::Parser;
use std::time::Duration;

use crate::credentials::{ CredentialError, CredentialSet };
use crate::resolver::ResolverConfig;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:3000")]
    pub server_addr: String,

    /// Port override. When set, replaces the port part of SERVER_ADDR.
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Key every client must pass as the `key` query parameter.
    #[arg(long, env = "API_KEY")]
    pub api_key: String,

    // --- Backend Args ---
    /// Base URL of the hosted inference API. The chatbot id is appended verbatim.
    #[arg(
        long,
        env = "INFERENCE_ENDPOINT",
        default_value = "https://api-inference.huggingface.co/models/"
    )]
    pub inference_endpoint: String,

    /// Endpoint of the pattern-dialogue (AIML) engine. Without it every request goes to the inference API.
    #[arg(long, env = "AIML_ENDPOINT")]
    pub aiml_endpoint: Option<String>,

    /// Bearer tokens for the inference API, rotated on failure.
    #[arg(long, env = "AUTH1")]
    pub auth1: Option<String>,

    #[arg(long, env = "AUTH2")]
    pub auth2: Option<String>,

    #[arg(long, env = "AUTH3")]
    pub auth3: Option<String>,

    #[arg(long, env = "AUTH4")]
    pub auth4: Option<String>,

    // --- Resolution Args ---
    /// Model queried when the client does not pick one. Also the only model that tries the AIML engine first.
    #[arg(long, env = "DEFAULT_CHATBOT", default_value = "deepparag/Aeona")]
    pub default_chatbot: String,

    /// Time-to-live in seconds for cached replies.
    #[arg(long, env = "CACHE_TTL", default_value = "300")]
    pub cache_ttl: u64,

    /// Number of inference attempts before giving up.
    #[arg(long, env = "MAX_RETRIES", default_value = "5")]
    pub max_retries: u32,

    /// Base delay in milliseconds, doubled after every failed inference attempt.
    #[arg(long, env = "BACKOFF_BASE_MS", default_value = "100")]
    pub backoff_base_ms: u64,

    // --- TLS Args ---
    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    /// Address the server binds to, with PORT applied.
    pub fn listen_addr(&self) -> String {
        match self.port {
            Some(port) => {
                let host = self.server_addr
                    .rsplit_once(':')
                    .map(|(host, _)| host)
                    .unwrap_or(self.server_addr.as_str());
                format!("{}:{}", host, port)
            }
            None => self.server_addr.clone(),
        }
    }

    /// Configured tokens in AUTH1..AUTH4 order, blank ones dropped.
    pub fn auth_tokens(&self) -> Vec<String> {
        [&self.auth1, &self.auth2, &self.auth3, &self.auth4]
            .into_iter()
            .flatten()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn credential_set(&self) -> Result<CredentialSet, CredentialError> {
        CredentialSet::new(self.auth_tokens())
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            default_chatbot: self.default_chatbot.clone(),
            cache_ttl: Duration::from_secs(self.cache_ttl),
            max_retries: self.max_retries,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
        }
    }

    pub fn tls_enabled(&self) -> bool {
        self.enable_tls && self.tls_cert_path.is_some() && self.tls_key_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["chat-relay", "--api-key", "secret"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("args should parse")
    }

    #[test]
    fn defaults_match_relay_behaviour() {
        let args = parse(&["--auth1", "a"]);
        let config = args.resolver_config();
        assert_eq!(config.default_chatbot, "deepparag/Aeona");
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.backoff_base, Duration::from_millis(100));
        assert_eq!(args.inference_endpoint, "https://api-inference.huggingface.co/models/");
        assert!(args.aiml_endpoint.is_none());
    }

    #[test]
    fn blank_tokens_are_skipped() {
        let args = parse(&["--auth1", "a", "--auth2", "  ", "--auth4", "d"]);
        assert_eq!(args.auth_tokens(), vec!["a".to_string(), "d".to_string()]);
    }

    #[test]
    fn missing_tokens_fail_credential_setup() {
        let args = parse(&[]);
        assert!(args.credential_set().is_err());
    }

    #[test]
    fn port_overrides_listen_port() {
        let args = parse(&["--server-addr", "127.0.0.1:4000", "--port", "8080"]);
        assert_eq!(args.listen_addr(), "127.0.0.1:8080");
        let args = parse(&["--server-addr", "127.0.0.1:4000"]);
        assert_eq!(args.listen_addr(), "127.0.0.1:4000");
    }

    #[test]
    fn tls_needs_both_paths() {
        let args = parse(&["--enable-tls", "--tls-cert-path", "cert.pem"]);
        assert!(!args.tls_enabled());
        let args = parse(&["--enable-tls", "--tls-cert-path", "c.pem", "--tls-key-path", "k.pem"]);
        assert!(args.tls_enabled());
    }
}

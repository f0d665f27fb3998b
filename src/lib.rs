pub mod cache;
pub mod cli;
pub mod credentials;
pub mod llm;
pub mod models;
pub mod resolver;
pub mod server;

use cli::Args;
use llm::DialogueBackend;
use llm::dialogue::AimlClient;
use llm::inference::InferenceClient;
use log::{ info, warn };
use resolver::ReplyResolver;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub fn build_resolver(args: &Args) -> Result<ReplyResolver, Box<dyn Error + Send + Sync>> {
    let credentials = args.credential_set()?;
    let dialogue = args.aiml_endpoint
        .as_ref()
        .filter(|e| !e.trim().is_empty())
        .map(|e| Arc::new(AimlClient::new(e.clone())) as Arc<dyn DialogueBackend>);
    if dialogue.is_none() {
        warn!("AIML_ENDPOINT not set. Every message goes straight to the inference API.");
    }
    let inference = Arc::new(InferenceClient::new(args.inference_endpoint.clone()));

    Ok(ReplyResolver::new(args.resolver_config(), credentials, dialogue, inference))
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.listen_addr());
    info!("Inference Endpoint: {}", args.inference_endpoint);
    info!("AIML Endpoint: {}", args.aiml_endpoint.as_deref().unwrap_or("disabled"));
    info!("Inference Tokens: {}", args.auth_tokens().len());
    info!("Default Chatbot: {}", args.default_chatbot);
    info!("Cache TTL: {}s", args.cache_ttl);
    info!("Max Retries: {}", args.max_retries);
    info!("Backoff Base: {}ms", args.backoff_base_ms);
    info!("TLS Enabled: {}", args.tls_enabled());
    info!("-------------------------");

    let resolver = Arc::new(build_resolver(&args)?);
    let addr = args.listen_addr();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, resolver, args.api_key.clone(), args.clone());
    server.run().await?;

    Ok(())
}

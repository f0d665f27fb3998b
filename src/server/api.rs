use crate::resolver::ReplyResolver;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    routing::get,
    Router,
    extract::{ State, Query },
    response::IntoResponse,
    http::StatusCode,
};
use serde::Deserialize;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, error, warn };

pub const INVALID_KEY_REPLY: &str = "Invalid API key";

/// Query string of `GET /`.
#[derive(Deserialize, Debug, Default)]
pub struct RelayQuery {
    pub key: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub chatbot: Option<String>,
    pub context: Option<String>,
    pub context1: Option<String>,
    pub context2: Option<String>,
    pub context3: Option<String>,
    pub context4: Option<String>,
    pub context5: Option<String>,
    pub context6: Option<String>,
    pub context7: Option<String>,
}

impl RelayQuery {
    /// Prior turns in their fixed positional order, absent ones included.
    pub fn context_turns(&self) -> Vec<Option<String>> {
        vec![
            self.context.clone(),
            self.context1.clone(),
            self.context2.clone(),
            self.context3.clone(),
            self.context4.clone(),
            self.context5.clone(),
            self.context6.clone(),
            self.context7.clone()
        ]
    }
}

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<ReplyResolver>,
    pub api_key: Arc<str>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(relay_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    addr: &str,
    state: AppState,
    tls: Option<(String, String)>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = router(state);

    if let Some((cert_path, key_path)) = tls {
        info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("Server is running on https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
            e
        })?;

        info!("Server is running on http://{}", addr);
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}

async fn relay_handler(
    State(state): State<AppState>,
    Query(query): Query<RelayQuery>,
) -> impl IntoResponse {
    if query.key.as_deref() != Some(&*state.api_key) {
        warn!("Rejected request with invalid API key");
        return (StatusCode::OK, INVALID_KEY_REPLY.to_string());
    }

    let context = query.context_turns();
    let text = query.text.unwrap_or_default();
    let user_id = query.user_id.unwrap_or_default();
    let chatbot = query.chatbot;
    let resolver = state.resolver.clone();

    let task = tokio::spawn(async move {
        resolver.resolve(&text, &user_id, &context, chatbot.as_deref()).await
    });

    match task.await {
        Ok(reply) => (StatusCode::OK, reply),
        Err(e) => {
            error!("Error: {}", e);
            (StatusCode::OK, format!("There was an error: {}", e))
        }
    }
}

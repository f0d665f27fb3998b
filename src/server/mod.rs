pub mod api;

use crate::cli::Args;
use crate::resolver::ReplyResolver;
use self::api::AppState;
use log::error;
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    addr: String,
    resolver: Arc<ReplyResolver>,
    api_key: String,
    args: Args,
}

impl Server {
    pub fn new(addr: String, resolver: Arc<ReplyResolver>, api_key: String, args: Args) -> Self {
        Self {
            addr,
            resolver,
            api_key,
            args,
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let state = AppState {
            resolver: self.resolver.clone(),
            api_key: Arc::from(self.api_key.as_str()),
        };

        let tls = if self.args.enable_tls {
            match (&self.args.tls_cert_path, &self.args.tls_key_path) {
                (Some(cert_path), Some(key_path)) => Some((cert_path.clone(), key_path.clone())),
                (Some(_), None) | (None, Some(_)) => {
                    error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                    return Err("Missing TLS certificate or key path".into());
                }
                (None, None) => {
                    error!("--enable-tls was set but no certificate/key paths provided.");
                    return Err("TLS enabled without cert/key".into());
                }
            }
        } else {
            None
        };

        api::start_http_server(&self.addr, state, tls).await
    }
}

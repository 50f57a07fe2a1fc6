//! Credential-holding proxy for the Volcengine "Jimeng" smart-drawing model,
//! plus the prompt form that talks to it.

pub mod client;
pub mod config;
pub mod form;
pub mod handler;
pub mod routes;
pub mod signer;
pub mod volc;

use config::Config;

pub struct AppState {
    pub config: Config,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let http_client = config.http_client();
        Self {
            config,
            http_client,
        }
    }
}

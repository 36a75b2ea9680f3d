use std::sync::Arc;

use crate::config::ServerConfig;
use crate::service::LeagueService;

#[derive(Clone)]
pub struct AppState {
    pub service: LeagueService,
    pub server: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(service: LeagueService) -> Self {
        Self::with_server(service, ServerConfig::default())
    }

    pub fn with_server(service: LeagueService, server: ServerConfig) -> Self {
        Self {
            service,
            server: Arc::new(server),
        }
    }
}

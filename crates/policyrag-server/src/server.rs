use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use policyrag_answer::{AnswerComposer, Retriever};
use policyrag_router::AgentLoop;

use crate::error::ServeError;
use crate::router::build_router;

/// Services shared by every request. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub retriever: Retriever,
    pub composer: AnswerComposer,
    pub agent: Arc<AgentLoop>,
    /// Cancelled on shutdown; routed requests get a child token.
    pub shutdown: CancellationToken,
}

pub struct PolicyServer {
    host: String,
    port: u16,
    max_body_size: usize,
    state: AppState,
}

impl PolicyServer {
    /// `host` may be an IP literal or a name resolved at bind time.
    pub fn new(host: &str, port: u16, state: AppState) -> Self {
        Self { host: host.to_string(), port, max_body_size: 65_536, state }
    }

    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    pub fn bind_target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Serve until the state's shutdown token is cancelled, then drain.
    pub async fn serve(self) -> Result<(), ServeError> {
        let target = self.bind_target();
        let shutdown = self.state.shutdown.clone();
        let router = build_router(self.state, self.max_body_size);

        let listener = tokio::net::TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(|e| ServeError::Bind(target.clone(), e))?;
        match listener.local_addr() {
            Ok(addr) => tracing::info!("listening on http://{}", addr),
            Err(_) => tracing::info!("listening on http://{}", target),
        }

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("shutting down");
            })
            .await
            .map_err(|e| ServeError::Server(e.to_string()))
    }
}

//! # REST Gateway
//!
//! Thin HTTP front end over the chaincode dispatcher and the content store.
//!
//! | Method | Path | Chaincode |
//! |--------|------|-----------|
//! | `GET` | `/health` | - |
//! | `POST` | `/ecg/upload` | content put, then `storeRecord` |
//! | `GET` | `/ecg/access/:patient_id` | `accessRecord`, then content get |
//! | `POST` | `/ecg/grant-access` | `grantAccess` |
//! | `POST` | `/ecg/revoke-access` | `revokeAccess` |
//! | `GET` | `/ecg/audit/:patient_id` | `getAuditTrail` |
//!
//! The caller identity is taken verbatim from the [`IDENTITY_HEADER`]
//! header. Authentication happens in front of the gateway.

pub mod handlers;

use crate::adapters::InMemoryContentStore;
use crate::errors::{ContentStoreError, GatewayError};
use crate::runtime::LedgerService;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ecg_01_record_ledger::adapters::{ChaincodeDispatcher, TxContext};
use ecg_01_record_ledger::errors::RecordError;
use serde_json::{json, Value};
use shared_types::identity::Identity;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Header carrying the caller's ledger identity.
pub const IDENTITY_HEADER: &str = "x-ecg-identity";

/// The dispatcher shared by the runtime and the gateway.
pub type NodeDispatcher = ChaincodeDispatcher<Arc<LedgerService>>;

/// Handler state.
#[derive(Clone)]
pub struct GatewayState {
    dispatcher: Arc<NodeDispatcher>,
    content: Arc<InMemoryContentStore>,
}

impl GatewayState {
    pub fn new(dispatcher: Arc<NodeDispatcher>, content: Arc<InMemoryContentStore>) -> Self {
        Self {
            dispatcher,
            content,
        }
    }

    /// Invoke a chaincode function and parse its JSON response.
    fn invoke(
        &self,
        caller: &Identity,
        function: &str,
        args: &[&str],
    ) -> Result<Value, GatewayError> {
        let ctx = TxContext::now(caller.clone());
        let response = self.dispatcher.invoke(&ctx, function, args)?;
        Ok(serde_json::from_str(&response)?)
    }
}

/// Build the gateway router.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ecg/upload", post(handlers::upload))
        .route("/ecg/access/:patient_id", get(handlers::access))
        .route("/ecg/grant-access", post(handlers::grant_access))
        .route("/ecg/revoke-access", post(handlers::revoke_access))
        .route("/ecg/audit/:patient_id", get(handlers::audit_trail))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` turns true.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "Gateway listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            // A dropped sender also stops the server.
            let _ = shutdown.wait_for(|stopped| *stopped).await;
        })
        .await?;
    info!("Gateway stopped");
    Ok(())
}

// =============================================================================
// CALLER EXTRACTION
// =============================================================================

/// The identity a request acts as.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Caller(Identity::new(value)))
            .ok_or(GatewayError::MissingIdentity(IDENTITY_HEADER))
    }
}

// =============================================================================
// ERROR RESPONSES
// =============================================================================

impl GatewayError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingIdentity(_) => StatusCode::UNAUTHORIZED,
            Self::MissingFields(_) => StatusCode::BAD_REQUEST,
            Self::Ledger(e) => match e {
                RecordError::NotFound { .. } | RecordError::GranteeNotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                RecordError::Unauthorized { .. } => StatusCode::FORBIDDEN,
                RecordError::InvalidState { .. } | RecordError::Conflict(_) => {
                    StatusCode::CONFLICT
                }
                RecordError::Validation(_) => StatusCode::BAD_REQUEST,
                RecordError::InvariantViolation(_)
                | RecordError::Store(_)
                | RecordError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Content(ContentStoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Content(ContentStoreError::EmptyContent) => StatusCode::BAD_REQUEST,
            Self::Content(ContentStoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "Gateway request failed");
        }
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));
        (status, body).into_response()
    }
}

//! Route handlers. Request and response bodies use camelCase field names.

use super::{Caller, GatewayState};
use crate::errors::GatewayError;
use crate::ports::ContentStore;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use shared_types::identity::Identity;
use tracing::info;

/// `POST /ecg/upload` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub patient_id: Option<String>,
    pub ecg_data: Option<Value>,
    pub metadata: Option<Value>,
    pub owner: Option<String>,
    pub original_timestamp: Option<String>,
}

/// `POST /ecg/grant-access` and `/ecg/revoke-access` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessChange {
    pub patient_id: Option<String>,
    pub user_id: Option<String>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "UP", "version": crate::VERSION }))
}

/// Put the ECG into the content store, then record its hash on the ledger.
pub async fn upload(
    State(state): State<GatewayState>,
    Caller(caller): Caller,
    Json(body): Json<UploadRequest>,
) -> Result<Json<Value>, GatewayError> {
    const FIELDS: &str = "patientId, ecgData, owner";

    let patient_id = required(body.patient_id, FIELDS)?;
    let owner = required(body.owner, FIELDS)?;
    let ecg_data = body
        .ecg_data
        .filter(|data| !data.is_null())
        .ok_or(GatewayError::MissingFields(FIELDS))?;
    let metadata = match body.metadata {
        None | Some(Value::Null) => String::new(),
        Some(metadata) => metadata.to_string(),
    };
    let original_timestamp = body.original_timestamp.unwrap_or_default();

    let content_hash = state.content.put(serde_json::to_vec(&ecg_data)?).await?;
    let response = state.invoke(
        &caller,
        "storeRecord",
        &[
            patient_id.as_str(),
            content_hash.as_str(),
            original_timestamp.as_str(),
            metadata.as_str(),
            owner.as_str(),
        ],
    )?;
    info!(patient_id = %patient_id, content_hash = %content_hash, "ECG uploaded");

    Ok(Json(json!({
        "status": "success",
        "contentHash": content_hash,
        "ledgerResponse": response,
    })))
}

/// Read the record, then fetch the content it points at.
pub async fn access(
    State(state): State<GatewayState>,
    Caller(caller): Caller,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    let record = state.invoke(&caller, "accessRecord", &[patient_id.as_str()])?;
    let content_hash = record["contentHash"].as_str().unwrap_or_default();
    let content = state.content.get(content_hash).await?;
    let ecg_data: Value = serde_json::from_slice(&content)?;

    Ok(Json(json!({
        "status": "success",
        "metadata": record,
        "ecgData": ecg_data,
    })))
}

pub async fn grant_access(
    State(state): State<GatewayState>,
    Caller(caller): Caller,
    Json(body): Json<AccessChange>,
) -> Result<Json<Value>, GatewayError> {
    change_access(&state, &caller, "grantAccess", body)
}

pub async fn revoke_access(
    State(state): State<GatewayState>,
    Caller(caller): Caller,
    Json(body): Json<AccessChange>,
) -> Result<Json<Value>, GatewayError> {
    change_access(&state, &caller, "revokeAccess", body)
}

pub async fn audit_trail(
    State(state): State<GatewayState>,
    Caller(caller): Caller,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    let trail = state.invoke(&caller, "getAuditTrail", &[patient_id.as_str()])?;
    Ok(Json(json!({ "status": "success", "auditTrail": trail })))
}

fn change_access(
    state: &GatewayState,
    caller: &Identity,
    function: &str,
    body: AccessChange,
) -> Result<Json<Value>, GatewayError> {
    const FIELDS: &str = "patientId, userId";

    let patient_id = required(body.patient_id, FIELDS)?;
    let user_id = required(body.user_id, FIELDS)?;
    let response = state.invoke(caller, function, &[patient_id.as_str(), user_id.as_str()])?;
    Ok(Json(json!({ "status": "success", "response": response })))
}

fn required(value: Option<String>, fields: &'static str) -> Result<String, GatewayError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(GatewayError::MissingFields(fields))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::gateway::{router, IDENTITY_HEADER};
    use crate::config::NodeConfig;
    use crate::runtime::NodeRuntime;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use shared_types::identity::Identity;
    use tower::ServiceExt;

    const ADMIN: &str = "x509::CN=admin";
    const OWNER: &str = "x509::CN=patient001";
    const DOCTOR: &str = "x509::CN=doctor001";
    const VERIFIER: &str = "x509::CN=verifier";

    fn app() -> (NodeRuntime, Router) {
        let runtime = NodeRuntime::new(NodeConfig::default());
        let app = router(runtime.gateway_state());
        (runtime, app)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        caller: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            request = request.header(IDENTITY_HEADER, caller);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn upload_body(patient_id: &str) -> Value {
        json!({
            "patientId": patient_id,
            "ecgData": { "leads": { "I": [0.1, 0.2] } },
            "metadata": { "hospital": "RS Harapan", "doctor": "Dr. Smith" },
            "owner": OWNER,
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (_runtime, app) = app();
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "UP");
    }

    #[tokio::test]
    async fn test_missing_identity_header_is_unauthorized() {
        let (_runtime, app) = app();
        let (status, body) =
            send(&app, "POST", "/ecg/upload", None, Some(upload_body("p1"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "MISSING_IDENTITY");
    }

    #[tokio::test]
    async fn test_upload_requires_fields() {
        let (runtime, app) = app();
        let (status, body) = send(
            &app,
            "POST",
            "/ecg/upload",
            Some(ADMIN),
            Some(json!({ "patientId": "p1", "owner": OWNER })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("ecgData"));
        assert!(runtime.content().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_non_object_metadata() {
        let (_runtime, app) = app();
        let mut body = upload_body("p1");
        body["metadata"] = json!([1, 2]);
        let (status, body) = send(&app, "POST", "/ecg/upload", Some(ADMIN), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_record_lifecycle_over_http() {
        let (runtime, app) = app();

        let (status, uploaded) =
            send(&app, "POST", "/ecg/upload", Some(ADMIN), Some(upload_body("p1"))).await;
        assert_eq!(status, StatusCode::OK);
        let hash = uploaded["contentHash"].as_str().unwrap().to_string();
        assert_eq!(hash.len(), 64);
        assert_eq!(uploaded["ledgerResponse"]["recordStatus"], "PENDING_VERIFICATION");

        // Escrow: nobody reads before confirmation.
        let (status, body) = send(&app, "GET", "/ecg/access/p1", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "INVALID_STATE");

        runtime
            .invoke(&Identity::new(VERIFIER), "confirmRecord", &["p1", "true", "ok"])
            .unwrap();

        let grant = json!({ "patientId": "p1", "userId": DOCTOR });
        let (status, _) =
            send(&app, "POST", "/ecg/grant-access", Some(OWNER), Some(grant.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/ecg/access/p1", Some(DOCTOR), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["contentHash"], hash.as_str());
        assert_eq!(body["ecgData"], json!({ "leads": { "I": [0.1, 0.2] } }));

        let (status, body) = send(&app, "GET", "/ecg/audit/p1", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["auditTrail"]["accessHistory"].as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "GET", "/ecg/audit/p1", Some(DOCTOR), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) =
            send(&app, "POST", "/ecg/revoke-access", Some(OWNER), Some(grant)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/ecg/access/p1", Some(DOCTOR), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_unknown_record_is_not_found() {
        let (_runtime, app) = app();
        let grant = json!({ "patientId": "nobody", "userId": DOCTOR });
        let (status, body) =
            send(&app, "POST", "/ecg/grant-access", Some(OWNER), Some(grant)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_duplicate_upload_conflicts() {
        let (_runtime, app) = app();
        send(&app, "POST", "/ecg/upload", Some(ADMIN), Some(upload_body("p1"))).await;
        let (status, body) =
            send(&app, "POST", "/ecg/upload", Some(ADMIN), Some(upload_body("p1"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
    }
}

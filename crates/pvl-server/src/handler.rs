use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use pvl_ledger::{ChainReport, LedgerStats};
use pvl_service::{Traceability, TransitionCommand};
use pvl_types::{Actor, ActorId, ActorRegistration, Batch, BatchDetails, BatchId, BatchStatus, LedgerEntry, Role};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::{Credentials, Identity, IdentityProvider};
use crate::error::{ServerError, ServerResult};

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub pvl: Arc<Traceability>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    async fn caller(&self, headers: &HeaderMap) -> ServerResult<Identity> {
        self.identity
            .authenticate(&Credentials::from_headers(headers))
            .await
    }

    /// Run a service call off the async runtime; stores may block on locks or disk.
    async fn run<T, F>(&self, f: F) -> ServerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Traceability) -> pvl_service::ServiceResult<T> + Send + 'static,
    {
        let pvl = Arc::clone(&self.pvl);
        tokio::task::spawn_blocking(move || f(&pvl))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?
            .map_err(ServerError::from)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBatchBody {
    #[serde(flatten)]
    pub details: BatchDetails,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    pub status: BatchStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub batch_id: BatchId,
    pub entry_count: u64,
    pub valid: bool,
    pub broken_at_sequence: Option<u64>,
}

impl From<ChainReport> for VerifyResponse {
    fn from(report: ChainReport) -> Self {
        Self {
            batch_id: report.batch_id,
            entry_count: report.entry_count,
            valid: report.valid,
            broken_at_sequence: report.broken_at_sequence,
        }
    }
}

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler() -> Json<Value> {
    Json(json!({
        "name": "pvl-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// A newly registered actor and, when the identity provider mints
/// credentials, the bearer token it can authenticate with.
#[derive(Debug, Serialize)]
pub struct RegisteredActor {
    #[serde(flatten)]
    pub actor: Actor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub actor_id: ActorId,
    pub token: String,
}

pub async fn register_actor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(registration): Json<ActorRegistration>,
) -> ServerResult<(StatusCode, Json<RegisteredActor>)> {
    state.caller(&headers).await?.require(&[Role::Administrator])?;
    let actor = state.run(move |pvl| pvl.directory().register(registration)).await?;
    let token = state.identity.issue(identity_of(&actor)).await?;
    Ok((StatusCode::CREATED, Json(RegisteredActor { actor, token })))
}

/// Issue a fresh bearer token for an existing actor.
pub async fn issue_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ActorId>,
) -> ServerResult<(StatusCode, Json<IssuedToken>)> {
    state.caller(&headers).await?.require(&[Role::Administrator])?;
    let actor = state.run(move |pvl| pvl.directory().resolve(&id)).await?;
    let token = state
        .identity
        .issue(identity_of(&actor))
        .await?
        .ok_or_else(|| {
            ServerError::BadRequest("the identity provider does not issue tokens".into())
        })?;
    Ok((
        StatusCode::CREATED,
        Json(IssuedToken {
            actor_id: actor.id,
            token,
        }),
    ))
}

fn identity_of(actor: &Actor) -> Identity {
    Identity {
        actor_id: actor.id,
        role: actor.role,
    }
}

pub async fn get_actor(
    State(state): State<AppState>,
    Path(id): Path<ActorId>,
) -> ServerResult<Json<Actor>> {
    Ok(Json(state.run(move |pvl| pvl.directory().resolve(&id)).await?))
}

pub async fn actor_batches(
    State(state): State<AppState>,
    Path(id): Path<ActorId>,
) -> ServerResult<Json<Vec<Batch>>> {
    Ok(Json(state.run(move |pvl| pvl.queries().list_by_owner(&id)).await?))
}

pub async fn actor_entries(
    State(state): State<AppState>,
    Path(id): Path<ActorId>,
) -> ServerResult<Json<Vec<LedgerEntry>>> {
    Ok(Json(state.run(move |pvl| pvl.queries().entries_by_actor(&id)).await?))
}

pub async fn create_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateBatchBody>,
) -> ServerResult<(StatusCode, Json<Batch>)> {
    let caller = state.caller(&headers).await?;
    let batch = state
        .run(move |pvl| {
            pvl.transitions()
                .create_batch(&caller.actor_id, body.details, body.notes)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<BatchId>,
) -> ServerResult<Json<Batch>> {
    Ok(Json(state.run(move |pvl| pvl.queries().batch(&id)).await?))
}

pub async fn lookup_batch(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ServerResult<Json<Batch>> {
    Ok(Json(state.run(move |pvl| pvl.queries().get_batch(&key)).await?))
}

pub async fn transition(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<BatchId>,
    Json(body): Json<TransitionBody>,
) -> ServerResult<(StatusCode, Json<LedgerEntry>)> {
    let caller = state.caller(&headers).await?;
    let command = TransitionCommand {
        batch_id: id,
        requested_status: body.status,
        actor_id: caller.actor_id,
        notes: body.notes,
        location: body.location,
    };
    let entry = state
        .run(move |pvl| pvl.transitions().transition(command))
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<BatchId>,
) -> ServerResult<Json<Vec<LedgerEntry>>> {
    Ok(Json(state.run(move |pvl| pvl.queries().get_history(&id)).await?))
}

pub async fn verify(
    State(state): State<AppState>,
    Path(id): Path<BatchId>,
) -> ServerResult<Json<VerifyResponse>> {
    let report = state.run(move |pvl| pvl.queries().verify_chain(&id)).await?;
    Ok(Json(report.into()))
}

pub async fn stats(State(state): State<AppState>) -> ServerResult<Json<LedgerStats>> {
    Ok(Json(state.run(|pvl| pvl.queries().stats()).await?))
}

//! API Handlers
use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use puddle_core::PuddleError;
use puddle_store::{DocumentFilter, ImportResult, SaveOptions};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::AppState;

type ApiResult = Result<(StatusCode, Json<Value>), ApiError>;

/// Body of both import endpoints.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// SPML document text
    pub xml: String,
    pub owner_id: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub owner: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    pub puddle: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Maps facade errors onto HTTP statuses.
#[derive(Debug)]
pub struct ApiError(PuddleError);

impl From<PuddleError> for ApiError {
    fn from(err: PuddleError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            PuddleError::InvalidArgument(_) | PuddleError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            PuddleError::Serialization(_) | PuddleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

fn not_found(kind: &str, id: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("{} {} not found", kind, id) })),
    )
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError(PuddleError::Serialization(e.to_string())))
}

fn join_error(err: tokio::task::JoinError) -> ApiError {
    ApiError(PuddleError::Store(format!("import task failed: {}", err)))
}

pub async fn import_document(
    State(state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> ApiResult {
    if payload.xml.trim().is_empty() {
        state.metrics.record_import(false);
        let result = ImportResult::failed("uploaded file is empty");
        return Ok((StatusCode::BAD_REQUEST, Json(to_json(&result)?)));
    }

    let options = SaveOptions {
        owner_id: payload.owner_id,
        description: payload.description,
        tags: payload.tags.into_iter().collect(),
    };
    let documents = state.documents.clone();
    let xml = payload.xml;
    let result = tokio::task::spawn_blocking(move || documents.import_and_save(&xml, options))
        .await
        .map_err(join_error)?;

    state.metrics.record_import(result.success);
    let status = if result.success {
        StatusCode::CREATED
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(to_json(&result)?)))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let filter = DocumentFilter {
        owner: query.owner,
        doc_type: query.doc_type,
        puddle_id: query.puddle,
    };
    let docs = state.documents.list(&filter)?;
    Ok((
        StatusCode::OK,
        Json(json!({ "count": docs.len(), "documents": to_json(&docs)? })),
    ))
}

pub async fn document_stats(State(state): State<AppState>) -> ApiResult {
    let stats = state.documents.stats()?;
    Ok((StatusCode::OK, Json(to_json(&stats)?)))
}

pub async fn get_document(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    match state.documents.get(&id)? {
        Some(doc) => Ok((StatusCode::OK, Json(to_json(&doc)?))),
        None => Ok(not_found("document", &id)),
    }
}

pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRequest>,
) -> ApiResult {
    let tags = payload.tags.map(|t| t.into_iter().collect::<BTreeSet<_>>());
    match state.documents.update_details(&id, payload.description, tags)? {
        Some(doc) => Ok((StatusCode::OK, Json(to_json(&doc)?))),
        None => Ok(not_found("document", &id)),
    }
}

pub async fn delete_document(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if state.documents.delete(&id)? {
        Ok((StatusCode::OK, Json(json!({ "deleted": true, "id": id }))))
    } else {
        Ok(not_found("document", &id))
    }
}

pub async fn export_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.documents.export_as_xml(&id)? {
        Some(xml) => {
            state.metrics.exports.inc();
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
                xml,
            )
                .into_response())
        }
        None => Ok(not_found("document", &id).into_response()),
    }
}

pub async fn import_dictionary(
    State(state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> ApiResult {
    if payload.xml.trim().is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "uploaded file is empty" })),
        ));
    }

    let dictionaries = state.dictionaries.clone();
    let ImportRequest { xml, owner_id, .. } = payload;
    let report = tokio::task::spawn_blocking(move || {
        dictionaries.import_into_dictionary(&xml, owner_id.as_deref())
    })
    .await
    .map_err(join_error)??;

    state.metrics.record_signs(report.added, report.updated);
    let status = if report.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(to_json(&report)?)))
}

pub async fn list_dictionaries(State(state): State<AppState>) -> ApiResult {
    let dictionaries = state.dictionaries.list_dictionaries()?;
    Ok((
        StatusCode::OK,
        Json(json!({ "count": dictionaries.len(), "dictionaries": to_json(&dictionaries)? })),
    ))
}

pub async fn dictionary_signs(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    match state.dictionaries.signs(&id)? {
        Some(signs) => Ok((
            StatusCode::OK,
            Json(json!({ "dictionary_id": id, "count": signs.len(), "signs": to_json(&signs)? })),
        )),
        None => Ok(not_found("dictionary", &id)),
    }
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(text) => (StatusCode::OK, text).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })),
    )
}

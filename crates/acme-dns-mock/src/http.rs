// # HTTP Management Surface
//
// Mirrors the provider's `getData` / `changeRecords` endpoints.
//
// ## Validation Pipeline
//
// Every request goes through these steps in order; the first failure answers:
//
// 1. Authentication: `login` / `passwd` query parameters must match (403)
// 2. Formats: `input_format` / `output_format`, when given, must be
//    `plain` or `json` (500, HTML body)
// 3. Payload: with `input_format=json`, `input_data` must be present (500,
//    `INVALID_DATA` envelope) and valid JSON (500, fixed body)
// 4. Dispatch to the operation
//
// Parameters are read from the request body (multipart or urlencoded form)
// and from the query string; the body wins when both carry a key. Any HTTP
// method is accepted.

use std::convert::Infallible;
use std::sync::Arc;

use acme_dns_beget::wire::{
    CHANGE_RECORDS_PATH, ErrorResponse, FORMAT_JSON, FetchAnswer, FetchRequest, FetchResponse,
    FetchResult, GET_DATA_PATH, INPUT_DATA_FIELD, INPUT_FORMAT_PARAM, LOGIN_PARAM,
    OUTPUT_FORMAT_PARAM, PASSWD_PARAM, ReplaceAnswer, ReplaceRequest, ReplaceResponse,
    STATUS_ERROR, STATUS_SUCCESS,
};
use acme_dns_core::{Credentials, RecordStore, trim_fqdn};
use axum::extract::{Form, FromRequest, Multipart, Query, Request, State};
use axum::http::{StatusCode, Uri, header};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, warn};

/// Values accepted for `input_format` and `output_format`
const ALLOWED_FORMATS: [&str; 2] = ["plain", "json"];

/// Body answered when `input_data` cannot be decoded
pub const INVALID_JSON_BODY: &str = "Cannot parse the JSON input params";

/// Shared handler state
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) credentials: Arc<Credentials>,
    pub(crate) store: Arc<dyn RecordStore>,
}

/// Build the router of the management surface
pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route(GET_DATA_PATH, any(get_data))
        .route(CHANGE_RECORDS_PATH, any(change_records))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .with_state(state)
}

fn query_params(uri: &Uri) -> Vec<(String, String)> {
    Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map(|Query(params)| params)
        .unwrap_or_default()
}

fn first<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Reject any call whose query-string credentials do not match
async fn authenticate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let params = query_params(request.uri());
    let login = first(&params, LOGIN_PARAM).unwrap_or_default();
    let passwd = first(&params, PASSWD_PARAM).unwrap_or_default();

    if login != state.credentials.login || passwd != state.credentials.passwd {
        warn!(path = %request.uri().path(), login, "Rejecting request with invalid credentials");
        return StatusCode::FORBIDDEN.into_response();
    }

    next.run(request).await
}

/// Request parameters merged from the body and the query string
#[derive(Debug, Default)]
pub(crate) struct ApiForm {
    params: Vec<(String, String)>,
}

impl ApiForm {
    fn get(&self, key: &str) -> Option<&str> {
        first(&self.params, key)
    }

    /// Run the format and payload checks, then decode `input_data`
    fn decode<T: DeserializeOwned>(&self) -> Result<T, Response> {
        check_format(self, INPUT_FORMAT_PARAM)?;
        check_format(self, OUTPUT_FORMAT_PARAM)?;

        let input_data = self.get(INPUT_DATA_FIELD);

        if self.get(INPUT_FORMAT_PARAM) == Some(FORMAT_JSON) && input_data.is_none() {
            debug!("Request without input_data");
            return Err(incorrect_input_data());
        }

        serde_json::from_str(input_data.unwrap_or_default()).map_err(|e| {
            debug!("Undecodable input_data: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, INVALID_JSON_BODY).into_response()
        })
    }
}

impl<S> FromRequest<S> for ApiForm
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = query_params(req.uri());

        // An unreadable body leaves only the query string; the payload checks answer
        let mut params = body_params(req, state).await.unwrap_or_else(|e| {
            debug!("Ignoring unreadable request body: {}", e);
            Vec::new()
        });

        params.extend(query);
        Ok(Self { params })
    }
}

/// Form fields carried by a multipart or urlencoded body
async fn body_params<S>(req: Request, state: &S) -> Result<Vec<(String, String)>, String>
where
    S: Send + Sync,
{
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let mut params = Vec::new();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| e.body_text())?;

        while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            let value = field.text().await.map_err(|e| e.body_text())?;
            params.push((name, value));
        }
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(body) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|e| e.body_text())?;
        params.extend(body);
    }

    Ok(params)
}

fn check_format(form: &ApiForm, param: &str) -> Result<(), Response> {
    if let Some(value) = form.get(param)
        && !ALLOWED_FORMATS.contains(&value)
    {
        debug!(param, value, "Unsupported format");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!(
                "<html><body>unhandled error: {param} is no plain|json</body></html>"
            )),
        )
            .into_response());
    }
    Ok(())
}

fn incorrect_input_data() -> Response {
    let body = ErrorResponse::single(
        STATUS_SUCCESS,
        STATUS_ERROR,
        "INVALID_DATA",
        json!("Incorrect input\ndata"),
    );
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

fn method_failed(text: &str) -> Response {
    let body = ErrorResponse::single(STATUS_SUCCESS, STATUS_ERROR, "METHOD_FAILED", json!(text));
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// `getData`: the stored records, or an empty set for an unknown domain
async fn get_data(State(state): State<AppState>, form: ApiForm) -> Response {
    let request: FetchRequest = match form.decode() {
        Ok(request) => request,
        Err(response) => return response,
    };

    let records = match state.store.get(&request.fqdn).await {
        Ok(records) => records.unwrap_or_default(),
        Err(e) => {
            warn!(fqdn = %request.fqdn, "Record store read failed: {}", e);
            return method_failed("Failed to get DNS\nrecords");
        }
    };

    debug!(fqdn = %request.fqdn, record_types = records.len(), "getData");

    let response = FetchResponse::success(FetchAnswer {
        status: STATUS_SUCCESS.to_string(),
        result: FetchResult {
            fqdn: request.fqdn,
            records,
        },
    });
    Json(response).into_response()
}

/// `changeRecords`: store the set under the bare and the dot-suffixed name
async fn change_records(State(state): State<AppState>, form: ApiForm) -> Response {
    let request: ReplaceRequest = match form.decode() {
        Ok(request) => request,
        Err(response) => return response,
    };

    let fqdn = trim_fqdn(&request.fqdn);
    let names = [fqdn.to_string(), format!("{fqdn}.")];

    if let Err(e) = state.store.replace(&names, request.records).await {
        warn!(fqdn, "Record store write failed: {}", e);
        return method_failed("Failed to change DNS\nrecords");
    }

    info!(fqdn, "changeRecords");

    let response = ReplaceResponse::success(ReplaceAnswer {
        status: STATUS_SUCCESS.to_string(),
        result: true,
        errors: Vec::new(),
    });
    Json(response).into_response()
}

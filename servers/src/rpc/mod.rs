use crate::registry::NetworkRegistry;
use async_trait::async_trait;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE,
};
use http::{Method, StatusCode};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use log::{error, info};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::io::Error;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use xch_history::{list_records, reconstruct, ReconstructOptions, TransactionGroup};
use xch_history_core::blockchain::coin_record::CoinRecord;
use xch_history_core::config::HistoryConfig;
use xch_history_core::errors::{HistoryError, ValidationError};
use xch_history_keys::Address;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[async_trait]
pub trait RpcHandler<T> {
    async fn handle(
        &self,
        req: Request<Bytes>,
        shared_state: Arc<T>,
    ) -> Result<Response<Full<Bytes>>, Error>;
}

pub struct HistoryState {
    pub registry: NetworkRegistry,
    pub options: ReconstructOptions,
    pub request_timeout: Duration,
}
impl HistoryState {
    pub fn new(registry: NetworkRegistry, config: &HistoryConfig) -> Self {
        HistoryState {
            registry,
            options: ReconstructOptions {
                max_concurrent_lookups: config.max_concurrent_lookups,
            },
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordsResp {
    pub records: Vec<CoinRecord>,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResp {
    pub transaction_groups: Vec<TransactionGroup>,
}

#[derive(Default)]
pub struct HistoryRpcHandler;

#[async_trait]
impl RpcHandler<HistoryState> for HistoryRpcHandler {
    async fn handle(
        &self,
        req: Request<Bytes>,
        state: Arc<HistoryState>,
    ) -> Result<Response<Full<Bytes>>, Error> {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let response = match (&method, path.as_str()) {
            (&Method::OPTIONS, _) => preflight(),
            (&Method::POST, "/records" | "/api/v2/records") => respond(
                records(&req, &state)
                    .await
                    .map(|records| RecordsResp { records }),
                "Could not fetch records",
            ),
            (&Method::POST, "/transactions" | "/api/v2/transactions") => respond(
                transactions(&req, &state)
                    .await
                    .map(|transaction_groups| TransactionsResp { transaction_groups }),
                "Could not fetch transactions",
            ),
            _ => text(StatusCode::NOT_FOUND, "Not Found"),
        };
        info!(
            "{method} {path} {} {:?}",
            response.status().as_u16(),
            start.elapsed()
        );
        Ok(response)
    }
}

async fn records(
    req: &Request<Bytes>,
    state: &HistoryState,
) -> Result<Vec<CoinRecord>, HistoryError> {
    let address = extract_address(req)?;
    let node = state.registry.resolve(&address.prefix)?;
    with_deadline(state.request_timeout, list_records(node.as_ref(), &address)).await
}

async fn transactions(
    req: &Request<Bytes>,
    state: &HistoryState,
) -> Result<Vec<TransactionGroup>, HistoryError> {
    let address = extract_address(req)?;
    let node = state.registry.resolve(&address.prefix)?;
    with_deadline(
        state.request_timeout,
        reconstruct(node.as_ref(), &address, &state.options),
    )
    .await
}

/// Dropping the inner future on expiry cancels its outstanding lookups.
async fn with_deadline<T>(
    deadline: Duration,
    fut: impl Future<Output = Result<T, HistoryError>>,
) -> Result<T, HistoryError> {
    timeout(deadline, fut)
        .await
        .unwrap_or(Err(HistoryError::Timeout))
}

/// Reads `address` from a JSON or urlencoded body. Falsy JSON values count as
/// missing.
pub fn extract_address(req: &Request<Bytes>) -> Result<Address, ValidationError> {
    let is_form = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_lowercase().starts_with(FORM_CONTENT_TYPE))
        .unwrap_or(false);
    let address = if is_form {
        form_field(req.body(), "address")?
    } else {
        json_address(req.body())?
    };
    Address::from_str(&address).map_err(|_| ValidationError::InvalidAddress)
}

fn json_address(body: &Bytes) -> Result<String, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::MissingAddress);
    }
    let value: Value = serde_json::from_slice(body).map_err(|_| ValidationError::InvalidBody)?;
    match value.get("address") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Err(ValidationError::MissingAddress),
        Some(Value::String(s)) if s.is_empty() => Err(ValidationError::MissingAddress),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Err(ValidationError::MissingAddress),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::InvalidAddress),
    }
}

fn form_field(body: &Bytes, name: &str) -> Result<String, ValidationError> {
    let body = std::str::from_utf8(body).map_err(|_| ValidationError::InvalidBody)?;
    for pair in body.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = urlencoding::decode(&key.replace('+', " "))
            .map_err(|_| ValidationError::InvalidBody)?
            .into_owned();
        if key == name {
            let value = urlencoding::decode(&value.replace('+', " "))
                .map_err(|_| ValidationError::InvalidBody)?
                .into_owned();
            return if value.is_empty() {
                Err(ValidationError::MissingAddress)
            } else {
                Ok(value)
            };
        }
    }
    Err(ValidationError::MissingAddress)
}

fn respond<T: Serialize>(result: Result<T, HistoryError>, failure: &str) -> Response<Full<Bytes>> {
    match result {
        Ok(body) => match serde_json::to_vec(&body) {
            Ok(bytes) => with_cors(
                Response::builder()
                    .status(StatusCode::OK)
                    .header(CONTENT_TYPE, "application/json"),
            )
            .body(Full::new(Bytes::from(bytes)))
            .unwrap_or_else(|_| internal_error()),
            Err(e) => {
                error!("Failed to serialize response: {e}");
                text(StatusCode::INTERNAL_SERVER_ERROR, failure)
            }
        },
        Err(e) if e.is_client_error() => text(StatusCode::BAD_REQUEST, &e.to_string()),
        Err(e) => {
            error!("{failure}: {e}");
            text(StatusCode::INTERNAL_SERVER_ERROR, failure)
        }
    }
}

fn with_cors(builder: http::response::Builder) -> http::response::Builder {
    builder.header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
}

fn text(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    with_cors(
        Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8"),
    )
    .body(Full::new(Bytes::from(body.to_string())))
    .unwrap_or_else(|_| internal_error())
}

fn preflight() -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(StatusCode::NO_CONTENT))
        .header(ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS")
        .header(ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| internal_error())
}

fn internal_error() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

pub mod full_node;

use crate::ssl::{load_certs, load_private_key, NoCertificateVerification};
use log::debug;
use reqwest::{Client, ClientBuilder};
use rustls::ClientConfig;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::io::{Error, ErrorKind};
use std::sync::Arc;
use std::time::Duration;
use xch_history_core::config::NodeSslConfig;

pub fn get_url(host: &str, port: u16, request_uri: &str) -> String {
    format!("https://{host}:{port}/{request_uri}")
}

pub fn get_client(ssl: &Option<NodeSslConfig>, timeout: Duration) -> Result<Client, Error> {
    if let Some(ssl) = ssl {
        let certs = load_certs(&ssl.ssl_crt_path)?;
        let key = load_private_key(&ssl.ssl_key_path)?;
        let config = ClientConfig::builder()
            .with_safe_defaults()
            .with_custom_certificate_verifier(Arc::new(NoCertificateVerification {}))
            .with_client_auth_cert(certs, key)
            .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("{:?}", e)))?;
        ClientBuilder::new()
            .use_preconfigured_tls(config)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::new(ErrorKind::Other, format!("{:?}", e)))
    } else {
        ClientBuilder::new()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::new(ErrorKind::Other, format!("{:?}", e)))
    }
}

/// Nodes report failures as `{"success": false, "error": "..."}`. Errors for
/// missing heights, blocks and coins become `NotFound`.
pub fn check_success(url: &str, body: &Value) -> Result<(), Error> {
    if body.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(());
    }
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("request was not successful");
    let lower = message.to_lowercase();
    let kind = if lower.contains("not found") || lower.contains("not in blockchain") {
        ErrorKind::NotFound
    } else {
        ErrorKind::Other
    };
    Err(Error::new(kind, format!("{url}: {message}")))
}

pub async fn post<T>(client: &Client, url: &str, data: &Map<String, Value>) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    debug!("POST {url}");
    let resp = client
        .post(url)
        .json(data)
        .send()
        .await
        .map_err(|e| Error::new(ErrorKind::ConnectionRefused, format!("{url}: {e:?}")))?;
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;
    let value: Value = serde_json::from_str(&body).map_err(|e| {
        Error::new(
            ErrorKind::InvalidData,
            format!("Bad Status Code: {status:?}, for URL {url}, body is not Json: {e}"),
        )
    })?;
    check_success(url, &value)?;
    if status != reqwest::StatusCode::OK {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("Bad Status Code: {status:?}, for URL {url}"),
        ));
    }
    serde_json::from_value(value).map_err(|e| {
        Error::new(
            ErrorKind::InvalidData,
            format!("Failed to Parse Json {body},\r\n {e}"),
        )
    })
}

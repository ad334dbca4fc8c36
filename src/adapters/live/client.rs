//! Shared HTTP plumbing for the vault REST API.

use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::VaultConfig;
use crate::ports::PortError;

/// An authenticated vault API client.
///
/// Clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct VaultClient {
    http: Client,
    host: String,
    api_base: String,
    session_id: String,
}

/// One entry of a vault error list.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

impl VaultClient {
    /// Creates a client for the configured vault.
    ///
    /// # Errors
    ///
    /// Returns an error if no session id is configured.
    pub fn new(config: &VaultConfig) -> Result<Self, String> {
        let session_id = config
            .session_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or("vault session id is not configured")?;
        let host = format!("https://{}", config.domain);
        let api_base = format!("{host}/api/{}", config.api_version);
        Ok(Self { http: Client::new(), host, api_base, session_id })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("/api/") {
            format!("{}{path}", self.host)
        } else {
            format!("{}{path}", self.api_base)
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, PortError> {
        let response = request
            .header("Authorization", &self.session_id)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| -> PortError { format!("Vault request failed: {e}").into() })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| -> PortError { format!("Failed to read vault response: {e}").into() })?;
        debug!(status = status.as_u16(), bytes = text.len(), "Vault response");

        let body: Value = serde_json::from_str(&text).map_err(|e| -> PortError {
            format!("Unexpected vault response ({}): {e}", status.as_u16()).into()
        })?;
        check_envelope(body)
    }

    /// `POST` with form-encoded fields.
    pub(crate) async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<Value, PortError> {
        self.send(self.http.post(self.url(path)).form(form)).await
    }

    /// `PUT` with form-encoded fields.
    pub(crate) async fn put_form(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<Value, PortError> {
        self.send(self.http.put(self.url(path)).form(form)).await
    }

    /// `POST` with a JSON body.
    pub(crate) async fn post_json(&self, path: &str, body: &Value) -> Result<Value, PortError> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    /// `POST` with a multipart body.
    pub(crate) async fn post_multipart(&self, path: &str, form: Form) -> Result<Value, PortError> {
        self.send(self.http.post(self.url(path)).multipart(form)).await
    }

    /// `GET` returning the JSON envelope.
    pub(crate) async fn get(&self, path: &str) -> Result<Value, PortError> {
        self.send(self.http.get(self.url(path))).await
    }

    /// `GET` returning raw bytes (file and rendition downloads).
    pub(crate) async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, PortError> {
        let response = self
            .http
            .get(self.url(path))
            .header("Authorization", &self.session_id)
            .send()
            .await
            .map_err(|e| -> PortError { format!("Vault download failed: {e}").into() })?;
        if !response.status().is_success() {
            return Err(format!("Vault download failed ({})", response.status().as_u16()).into());
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| -> PortError { format!("Failed to read vault download: {e}").into() })?;
        Ok(bytes.to_vec())
    }
}

/// Accepts a `SUCCESS` envelope and turns anything else into an error
/// carrying the vault's messages.
pub(crate) fn check_envelope(body: Value) -> Result<Value, PortError> {
    match body.get("responseStatus").and_then(Value::as_str) {
        Some("SUCCESS") => Ok(body),
        status => Err(error_message(&body, status.unwrap_or("UNKNOWN")).into()),
    }
}

/// Joins an envelope's `errors` as `TYPE: message`.
pub(crate) fn error_message(body: &Value, fallback: &str) -> String {
    let errors: Vec<ApiError> = body
        .get("errors")
        .cloned()
        .and_then(|e| serde_json::from_value(e).ok())
        .unwrap_or_default();
    if errors.is_empty() {
        return body
            .get("responseMessage")
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string();
    }
    errors
        .iter()
        .map(|e| {
            if e.kind.is_empty() {
                e.message.clone()
            } else {
                format!("{}: {}", e.kind, e.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_passes_through() {
        let body = json!({"responseStatus": "SUCCESS", "data": [{"id": "1"}]});
        assert_eq!(check_envelope(body.clone()).unwrap(), body);
    }

    #[test]
    fn failure_envelope_carries_vault_messages() {
        let body = json!({
            "responseStatus": "FAILURE",
            "errors": [
                {"type": "INVALID_DATA", "message": "Invalid value for [barcode__c]"},
                {"type": "PARAMETER_REQUIRED", "message": "Missing [product__v]"}
            ]
        });
        let err = check_envelope(body).unwrap_err();
        assert_eq!(
            err.to_string(),
            "INVALID_DATA: Invalid value for [barcode__c]; PARAMETER_REQUIRED: Missing [product__v]"
        );
    }

    #[test]
    fn failure_without_errors_uses_status() {
        let err = check_envelope(json!({"responseStatus": "WARNING"})).unwrap_err();
        assert_eq!(err.to_string(), "WARNING");
    }

    #[test]
    fn client_requires_session() {
        let config = VaultConfig { domain: "acme.veevavault.com".into(), ..VaultConfig::default() };
        assert!(VaultClient::new(&config).is_err());

        let config = VaultConfig { session_id: Some("S".into()), ..config };
        let client = VaultClient::new(&config).unwrap();
        assert_eq!(client.url("/query"), "https://acme.veevavault.com/api/v24.1/query");
        assert_eq!(
            client.url("/api/v24.1/query/abc?pagesize=1000"),
            "https://acme.veevavault.com/api/v24.1/query/abc?pagesize=1000"
        );
    }
}

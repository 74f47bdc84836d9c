// # Beget DNS API Client
//
// This crate provides the Beget implementation of `RecordsApi`.
//
// ## Behaviour
//
// - One HTTP request per call, no retries, no backoff (callers retry whole
//   present/clean-up operations)
// - No client-side timeout: a caller that needs a deadline wraps the future
// - Every failure carries the operation and domain it belongs to
// - The password NEVER appears in logs or Debug output
//
// ## API Reference
//
// - Fetch records:   POST `/api/dns/getData`
// - Replace records: POST `/api/dns/changeRecords`
//
// Both take `login`, `passwd`, `input_format=json`, `output_format=json` as
// query parameters and a multipart body with one `input_data` field holding
// the JSON-encoded operation parameters. See [`wire`].

pub mod wire;

use acme_dns_core::{ClientConfig, Credentials, Error, Records, RecordsApi, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use wire::{
    CHANGE_RECORDS_PATH, FORMAT_JSON, FetchRequest, FetchResponse, GET_DATA_PATH,
    INPUT_DATA_FIELD, INPUT_FORMAT_PARAM, LOGIN_PARAM, OUTPUT_FORMAT_PARAM, PASSWD_PARAM,
    ReplaceRequest, ReplaceResponse,
};

const GET_DATA: &str = "getData";
const CHANGE_RECORDS: &str = "changeRecords";

/// Beget DNS API client
#[derive(Debug, Clone)]
pub struct BegetClient {
    /// Base URL; operation paths are appended to its path
    base_url: Url,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl BegetClient {
    /// Create a client for the API at `config.api_url`
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let base_url = Url::parse(&config.api_url)
            .map_err(|e| Error::config(format!("failed to parse API URL {}: {}", config.api_url, e)))?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    /// Create a client for the production API
    pub fn production() -> Result<Self> {
        Self::new(&ClientConfig::default())
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}{}", self.base_url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    /// Send one operation and return the raw status and body
    async fn call<P: Serialize>(
        &self,
        operation: &'static str,
        path: &str,
        fqdn: &str,
        params: &P,
        credentials: &Credentials,
    ) -> Result<(StatusCode, String)> {
        let input_data = serde_json::to_string(params)
            .map_err(|e| Error::transport(operation, fqdn, format!("failed to marshal a message: {}", e)))?;

        let form = reqwest::multipart::Form::new().text(INPUT_DATA_FIELD, input_data);
        let url = self.endpoint(path);

        tracing::debug!(operation, fqdn, %url, "Sending provider API request");

        let response = self
            .client
            .post(url)
            .query(&[
                (INPUT_FORMAT_PARAM, FORMAT_JSON),
                (OUTPUT_FORMAT_PARAM, FORMAT_JSON),
                (LOGIN_PARAM, credentials.login.as_str()),
                (PASSWD_PARAM, credentials.passwd.as_str()),
            ])
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::transport(operation, fqdn, format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(operation, fqdn, format!("reading response: {}", e)))?;

        tracing::debug!(operation, fqdn, status = status.as_u16(), "Provider API responded");

        Ok((status, body))
    }
}

fn expect_ok(operation: &'static str, fqdn: &str, status: StatusCode, body: &str) -> Result<()> {
    if status != StatusCode::OK {
        return Err(Error::Status {
            operation,
            fqdn: fqdn.to_string(),
            status: status.as_u16(),
            body: body.to_string(),
        });
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(operation: &'static str, fqdn: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::decode(operation, fqdn, e))
}

#[async_trait]
impl RecordsApi for BegetClient {
    async fn fetch_records(&self, fqdn: &str, credentials: &Credentials) -> Result<Records> {
        let params = FetchRequest {
            fqdn: fqdn.to_string(),
        };

        let (status, body) = self
            .call(GET_DATA, GET_DATA_PATH, fqdn, &params, credentials)
            .await?;
        expect_ok(GET_DATA, fqdn, status, &body)?;

        let response: FetchResponse = decode(GET_DATA, fqdn, &body)?;

        Ok(response.answer.result.records)
    }

    async fn replace_records(
        &self,
        fqdn: &str,
        records: &Records,
        credentials: &Credentials,
    ) -> Result<()> {
        let params = ReplaceRequest {
            fqdn: fqdn.to_string(),
            records: records.clone(),
        };

        let (status, body) = self
            .call(CHANGE_RECORDS, CHANGE_RECORDS_PATH, fqdn, &params, credentials)
            .await?;
        expect_ok(CHANGE_RECORDS, fqdn, status, &body)?;

        let response: ReplaceResponse = decode(CHANGE_RECORDS, fqdn, &body)?;

        if !response.answer.result {
            tracing::warn!(fqdn, status = %response.answer.status, "Provider rejected record replacement");
            return Err(Error::Rejected {
                operation: CHANGE_RECORDS,
                fqdn: fqdn.to_string(),
                status: response.answer.status,
                errors: response.answer.errors,
                body,
            });
        }

        tracing::info!(fqdn, record_types = records.len(), "Records replaced");
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "beget"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> Credentials {
        Credentials::new("login", "password")
    }

    async fn client_for(server: &MockServer) -> BegetClient {
        BegetClient::new(&ClientConfig::new(server.uri())).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = BegetClient::new(&ClientConfig::new("http://localhost:8080/proxy/")).unwrap();

        assert_eq!(
            client.endpoint(GET_DATA_PATH).as_str(),
            "http://localhost:8080/proxy/api/dns/getData"
        );
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(BegetClient::new(&ClientConfig::new("not a url")).is_err());
        assert!(BegetClient::production().is_ok());
    }

    #[tokio::test]
    async fn test_fetch_request_shape_and_result() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GET_DATA_PATH))
            .and(query_param("login", "login"))
            .and(query_param("passwd", "password"))
            .and(query_param("input_format", "json"))
            .and(query_param("output_format", "json"))
            .and(body_string_contains("name=\"input_data\""))
            .and(body_string_contains(r#"{"fqdn":"example.com"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "answer": {
                    "status": "success",
                    "result": {
                        "fqdn": "example.com",
                        "records": {"TXT": [{"txtdata": "xyz", "ttl": 300}]},
                        "is_under_control": true
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = client_for(&server)
            .await
            .fetch_records("example.com", &creds())
            .await
            .unwrap();

        assert_eq!(records.first_txt_value(), Some("xyz"));
        assert_eq!(records.txt().unwrap()[0].get("ttl"), Some(&json!(300)));
    }

    #[tokio::test]
    async fn test_fetch_non_200_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GET_DATA_PATH))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .fetch_records("example.com", &creds())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Status { status: 403, operation: "getData", .. }));
    }

    #[tokio::test]
    async fn test_fetch_malformed_envelope_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GET_DATA_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .fetch_records("example.com", &creds())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Decode { ref fqdn, .. } if fqdn == "example.com"));
    }

    #[tokio::test]
    async fn test_replace_request_shape() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CHANGE_RECORDS_PATH))
            .and(query_param("login", "login"))
            .and(query_param("passwd", "password"))
            .and(body_string_contains(
                r#"{"fqdn":"example.com","records":{"TXT":[{"txtdata":"v"}]}}"#,
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "answer": {"status": "success", "result": true}
            })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .await
            .replace_records("example.com", &Records::new().with_txt("v"), &creds())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_replace_result_false_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CHANGE_RECORDS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "answer": {
                    "status": "error",
                    "errors": [{"error_code": "METHOD_FAILED", "error_text": "Failed to change DNS records"}]
                }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .replace_records("example.com", &Records::new(), &creds())
            .await
            .unwrap_err();

        match err {
            Error::Rejected { status, errors, body, .. } => {
                assert_eq!(status, "error");
                assert_eq!(errors[0].error_code, "METHOD_FAILED");
                assert!(body.contains("Failed to change DNS records"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_replace_non_200_ignores_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CHANGE_RECORDS_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "status": "success",
                "answer": {"status": "success", "result": true}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .replace_records("example.com", &Records::new(), &creds())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Status { status: 500, ref body, .. } if body.contains("result")));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_error() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;
        drop(server);

        let err = client
            .fetch_records("example.com", &creds())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport { operation: "getData", .. }));
    }
}

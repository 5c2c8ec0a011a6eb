use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use connector_wizard::submit::{ConnectorApi, CreateRequest, UpdateRequest};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const CONNECTORS_PATH: &str = "/api/connector_mgmt/v1/kafka_connectors";

/// Error body returned by the connector-management API.
#[derive(Debug, Deserialize)]
struct ApiError {
    reason: Option<String>,
}

/// reqwest client for the connector-management API.
///
/// Authenticates every call with the Bearer token supplied by the wizard.
#[derive(Clone)]
pub struct HttpConnectorApi {
    http_client: Client,
}

impl HttpConnectorApi {
    pub fn new() -> Result<Self> {
        let http_client = Client::builder()
            .user_agent("wizard-console/0.1")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl ConnectorApi for HttpConnectorApi {
    async fn create_connector(
        &self,
        access_token: &str,
        base_path: &str,
        request: &CreateRequest,
    ) -> Result<()> {
        let url = format!("{}{}?async=true", base_path.trim_end_matches('/'), CONNECTORS_PATH);
        debug!(url = %url, connector_type = %request.connector_type_id, "Creating connector");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .json(request)
            .send()
            .await
            .context("Failed to send create connector request")?;

        check_response(response).await
    }

    async fn update_connector(
        &self,
        access_token: &str,
        base_path: &str,
        request: &UpdateRequest,
    ) -> Result<()> {
        let url = format!(
            "{}{}/{}",
            base_path.trim_end_matches('/'),
            CONNECTORS_PATH,
            request.connector_id
        );
        debug!(url = %url, keys = request.connector.len(), "Updating connector");

        let mut body = json!({ "connector": request.connector });
        if let Some(name) = &request.updated_name {
            body["name"] = json!(name);
        }

        let response = self
            .http_client
            .patch(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .context("Failed to send update connector request")?;

        check_response(response).await
    }
}

/// Maps a non-2xx response to an error carrying the API's `reason`.
async fn check_response(response: Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let reason = response
        .json::<ApiError>()
        .await
        .ok()
        .and_then(|e| e.reason);
    match reason {
        Some(reason) => Err(anyhow!(reason)),
        None => Err(anyhow!("Connector API error: {}", status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::Value;

    fn config(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_connector() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/connector_mgmt/v1/kafka_connectors?async=true")
            .match_header("authorization", "Bearer token-1")
            .match_body(Matcher::PartialJson(json!({
                "connector_type_id": "http-sink",
                "name": "orders",
                "connector": {"url": "https://example.com"}
            })))
            .with_status(202)
            .create_async()
            .await;

        let api = HttpConnectorApi::new().unwrap();
        let request = CreateRequest {
            connector_type_id: "http-sink".to_string(),
            name: Some("orders".to_string()),
            connector: config(json!({"url": "https://example.com"})),
        };
        api.create_connector("token-1", &server.url(), &request)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_connector_sends_patch() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/api/connector_mgmt/v1/kafka_connectors/conn-1")
            .match_header("authorization", "Bearer token-1")
            .match_body(Matcher::Json(json!({
                "connector": {"topic": "t2"},
                "name": "renamed"
            })))
            .with_status(202)
            .create_async()
            .await;

        let api = HttpConnectorApi::new().unwrap();
        let request = UpdateRequest {
            connector_id: "conn-1".to_string(),
            connector: config(json!({"topic": "t2"})),
            updated_name: Some("renamed".to_string()),
        };
        api.update_connector("token-1", &server.url(), &request)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_without_rename_omits_name() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/api/connector_mgmt/v1/kafka_connectors/conn-1")
            .match_body(Matcher::Json(json!({"connector": {}})))
            .with_status(202)
            .create_async()
            .await;

        let api = HttpConnectorApi::new().unwrap();
        let request = UpdateRequest {
            connector_id: "conn-1".to_string(),
            connector: serde_json::Map::new(),
            updated_name: None,
        };
        api.update_connector("t", &server.url(), &request).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_reason_is_surfaced() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/connector_mgmt/v1/kafka_connectors?async=true")
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body(r#"{"kind": "Error", "reason": "connector name already exists"}"#)
            .create_async()
            .await;

        let api = HttpConnectorApi::new().unwrap();
        let request = CreateRequest {
            connector_type_id: "http-sink".to_string(),
            name: None,
            connector: serde_json::Map::new(),
        };
        let err = api
            .create_connector("t", &server.url(), &request)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "connector name already exists");
    }

    #[tokio::test]
    async fn test_error_without_body_reports_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("PATCH", "/api/connector_mgmt/v1/kafka_connectors/conn-9")
            .with_status(500)
            .create_async()
            .await;

        let api = HttpConnectorApi::new().unwrap();
        let request = UpdateRequest {
            connector_id: "conn-9".to_string(),
            connector: serde_json::Map::new(),
            updated_name: None,
        };
        let err = api
            .update_connector("t", &server.url(), &request)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("500"));
    }
}

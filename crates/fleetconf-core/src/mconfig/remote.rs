// ── Remote builder stub ──
//
// Wraps one discovered endpoint so it satisfies `MconfigBuilder`. The
// request timeout lives on the HTTP client; the pipeline applies its own
// deadline on top.

use std::time::Duration;

use async_trait::async_trait;
use fleetconf_api::{BuildRequest, BuilderClient, WireGraph, WireNetwork};
use tracing::debug;

use super::builder::{ConfigsByKey, MconfigBuilder};
use crate::config::ServiceEndpoint;
use crate::error::CoreError;
use crate::model::{EntityGraph, Network};

#[derive(Debug, Clone)]
pub struct RemoteBuilder {
    name: String,
    timeout: Duration,
    client: BuilderClient,
}

impl RemoteBuilder {
    pub fn new(endpoint: &ServiceEndpoint, timeout: Duration) -> Result<Self, CoreError> {
        let client = BuilderClient::new(endpoint.url.as_str(), timeout, endpoint.auth_token.as_ref())
            .map_err(|e| CoreError::Discovery {
                message: format!("endpoint {}: {e}", endpoint.name),
            })?;
        Ok(Self {
            name: endpoint.name.clone(),
            timeout,
            client,
        })
    }

    /// Tag transport errors with this builder's name and deadline.
    fn map_error(&self, err: fleetconf_api::Error) -> CoreError {
        if err.is_timeout() {
            return CoreError::BuilderTimeout {
                builder: self.name.clone(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }
        match CoreError::from(err) {
            CoreError::BuilderFailed { message, .. } => CoreError::BuilderFailed {
                builder: self.name.clone(),
                message,
            },
            other => other,
        }
    }
}

#[async_trait]
impl MconfigBuilder for RemoteBuilder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn build(
        &self,
        network: &Network,
        graph: &EntityGraph,
        gateway_id: &str,
    ) -> Result<ConfigsByKey, CoreError> {
        let request = BuildRequest {
            network: WireNetwork::from(network),
            graph: WireGraph::from(graph),
            gateway_id: gateway_id.to_owned(),
        };

        let response = self
            .client
            .build(&request)
            .await
            .map_err(|e| self.map_error(e))?;

        debug!(
            builder = %self.name,
            sections = response.configs_by_key.len(),
            "remote builder responded"
        );
        Ok(response
            .configs_by_key
            .into_iter()
            .map(|(k, v)| (k, v.into_bytes()))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn builder_for(server: &MockServer, timeout: Duration) -> RemoteBuilder {
        let endpoint = ServiceEndpoint::new("lte", Url::parse(&server.uri()).unwrap());
        RemoteBuilder::new(&endpoint, timeout).unwrap()
    }

    #[tokio::test]
    async fn slow_response_reports_configured_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/build"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "configs_by_key": {} }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let b = builder_for(&server, Duration::from_millis(150)).await;
        let err = b
            .build(&Network::new("n1"), &EntityGraph::default(), "g1")
            .await
            .unwrap_err();
        match err {
            CoreError::BuilderTimeout {
                builder,
                timeout_ms,
            } => {
                assert_eq!(builder, "lte");
                assert_eq!(timeout_ms, 150);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_failure_names_the_builder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/build"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(serde_json::json!({ "message": "draining" })),
            )
            .mount(&server)
            .await;

        let b = builder_for(&server, Duration::from_secs(2)).await;
        let err = b
            .build(&Network::new("n1"), &EntityGraph::default(), "g1")
            .await
            .unwrap_err();
        match err {
            CoreError::BuilderFailed { builder, message } => {
                assert_eq!(builder, "lte");
                assert!(message.contains("draining"), "{message}");
            }
            other => panic!("expected builder failure, got {other:?}"),
        }
    }
}

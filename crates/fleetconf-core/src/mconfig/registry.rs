// ── Builder discovery ──
//
// A registry answers "which builders should contribute right now". The
// static registry holds in-process builders, the service registry turns
// labelled remote endpoints into `RemoteBuilder`s, and the composite chains
// several of them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::builder::MconfigBuilder;
use super::remote::RemoteBuilder;
use crate::config::ServiceEndpoint;
use crate::error::CoreError;

#[async_trait]
pub trait BuilderRegistry: Send + Sync {
    async fn builders(&self) -> Result<Vec<Arc<dyn MconfigBuilder>>, CoreError>;
}

// ── StaticRegistry ──────────────────────────────────────────────────

#[derive(Default, Clone)]
pub struct StaticRegistry {
    builders: Vec<Arc<dyn MconfigBuilder>>,
}

impl StaticRegistry {
    pub fn new(builders: Vec<Arc<dyn MconfigBuilder>>) -> Self {
        Self { builders }
    }
}

#[async_trait]
impl BuilderRegistry for StaticRegistry {
    async fn builders(&self) -> Result<Vec<Arc<dyn MconfigBuilder>>, CoreError> {
        Ok(self.builders.clone())
    }
}

// ── ServiceRegistry ─────────────────────────────────────────────────

/// Remote builders selected by capability label.
pub struct ServiceRegistry {
    builders: Vec<Arc<dyn MconfigBuilder>>,
}

impl ServiceRegistry {
    /// Build a `RemoteBuilder` for every endpoint carrying `label`.
    /// Endpoints without it are ignored.
    pub fn new(
        label: &str,
        timeout: Duration,
        endpoints: &[ServiceEndpoint],
    ) -> Result<Self, CoreError> {
        let builders = endpoints
            .iter()
            .filter(|e| e.has_label(label))
            .map(|e| {
                RemoteBuilder::new(e, timeout).map(|b| -> Arc<dyn MconfigBuilder> { Arc::new(b) })
            })
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            label,
            endpoints = endpoints.len(),
            builders = builders.len(),
            "remote builders discovered"
        );
        Ok(Self { builders })
    }
}

#[async_trait]
impl BuilderRegistry for ServiceRegistry {
    async fn builders(&self) -> Result<Vec<Arc<dyn MconfigBuilder>>, CoreError> {
        Ok(self.builders.clone())
    }
}

// ── CompositeRegistry ───────────────────────────────────────────────

/// Concatenates several registries in order. A failing member is logged
/// and skipped so one broken source does not hide the others.
#[derive(Default, Clone)]
pub struct CompositeRegistry {
    registries: Vec<Arc<dyn BuilderRegistry>>,
}

impl CompositeRegistry {
    pub fn new(registries: Vec<Arc<dyn BuilderRegistry>>) -> Self {
        Self { registries }
    }
}

#[async_trait]
impl BuilderRegistry for CompositeRegistry {
    async fn builders(&self) -> Result<Vec<Arc<dyn MconfigBuilder>>, CoreError> {
        let mut all = Vec::new();
        for registry in &self.registries {
            match registry.builders().await {
                Ok(builders) => all.extend(builders),
                Err(e) => warn!(error = %e, "builder registry failed; skipping it"),
            }
        }
        Ok(all)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use url::Url;

    fn endpoint(name: &str, label: &str) -> ServiceEndpoint {
        ServiceEndpoint::new(name, Url::parse("http://127.0.0.1:1/").unwrap()).with_label(label)
    }

    #[tokio::test]
    async fn only_labelled_endpoints_become_builders() {
        let registry = ServiceRegistry::new(
            "mconfig_builder",
            Duration::from_secs(1),
            &[
                endpoint("lte", "mconfig_builder"),
                endpoint("metrics", "exporter"),
                endpoint("cwf", "mconfig_builder"),
            ],
        )
        .unwrap();

        let names: Vec<String> = registry
            .builders()
            .await
            .unwrap()
            .iter()
            .map(|b| b.name().to_owned())
            .collect();
        assert_eq!(names, vec!["lte", "cwf"]);
    }

    #[tokio::test]
    async fn no_endpoints_means_no_builders() {
        let registry =
            ServiceRegistry::new("mconfig_builder", Duration::from_secs(1), &[]).unwrap();
        assert!(registry.builders().await.unwrap().is_empty());
    }

    struct Broken;

    #[async_trait]
    impl BuilderRegistry for Broken {
        async fn builders(&self) -> Result<Vec<Arc<dyn MconfigBuilder>>, CoreError> {
            Err(CoreError::Discovery {
                message: "registry unreachable".into(),
            })
        }
    }

    #[tokio::test]
    async fn composite_skips_failing_members() {
        let remote = ServiceRegistry::new(
            "mconfig_builder",
            Duration::from_secs(1),
            &[endpoint("lte", "mconfig_builder")],
        )
        .unwrap();
        let composite = CompositeRegistry::new(vec![Arc::new(Broken), Arc::new(remote)]);
        assert_eq!(composite.builders().await.unwrap().len(), 1);
    }
}

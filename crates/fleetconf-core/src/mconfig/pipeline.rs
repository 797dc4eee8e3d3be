// ── Mconfig composition ──
//
// Fetch the builder set, run every builder concurrently under its own
// deadline, merge, digest. Any builder failure or overlapping section
// fails the whole composition; no partial bundle is ever returned.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};

use super::builder::{ConfigsByKey, MconfigBuilder};
use super::builtin;
use super::bundle::Mconfig;
use super::registry::{BuilderRegistry, CompositeRegistry, ServiceRegistry, StaticRegistry};
use crate::codec::CodecRegistry;
use crate::config::ServiceConfig;
use crate::error::CoreError;
use crate::model::{EntityGraph, Network};

pub struct MconfigPipeline {
    registry: Arc<dyn BuilderRegistry>,
    builder_timeout: Duration,
}

impl MconfigPipeline {
    pub fn new(registry: Arc<dyn BuilderRegistry>, builder_timeout: Duration) -> Self {
        Self {
            registry,
            builder_timeout,
        }
    }

    /// Built-in builders first, then labelled remote endpoints. Built-in
    /// builders decode blobs through the codecs `config` names.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, CoreError> {
        let codecs = Arc::new(CodecRegistry::from_config(config));
        let builtins = StaticRegistry::new(
            config
                .builtin_builders
                .iter()
                .map(|spec| builtin::from_spec(spec, &codecs))
                .collect(),
        );
        let remote = ServiceRegistry::new(
            &config.registry_label,
            config.builder_timeout,
            &config.services,
        )?;
        let registry = CompositeRegistry::new(vec![Arc::new(builtins), Arc::new(remote)]);
        Ok(Self::new(Arc::new(registry), config.builder_timeout))
    }

    pub async fn create_mconfig(
        &self,
        network: &Network,
        graph: &EntityGraph,
        gateway_id: &str,
    ) -> Result<Mconfig, CoreError> {
        let builders = match self.registry.builders().await {
            Ok(builders) => builders,
            Err(e) => {
                warn!(error = %e, "builder discovery failed; composing with no builders");
                Vec::new()
            }
        };

        let timeout = self.builder_timeout;
        let results = join_all(
            builders
                .iter()
                .map(|b| run_builder(b.as_ref(), timeout, network, graph, gateway_id)),
        )
        .await;

        let mut merged = ConfigsByKey::new();
        let mut owners: BTreeMap<String, String> = BTreeMap::new();
        for result in results {
            let (builder, configs) = result?;
            for (key, value) in configs {
                if let Some(first) = owners.get(&key) {
                    return Err(CoreError::BuilderKeyCollision {
                        key,
                        first: first.clone(),
                        second: builder,
                    });
                }
                owners.insert(key.clone(), builder.clone());
                merged.insert(key, value);
            }
        }

        let mconfig = Mconfig::new(merged, chrono::Utc::now().timestamp());
        debug!(
            network_id = %network.id,
            gateway_id,
            builders = builders.len(),
            sections = mconfig.configs_by_key.len(),
            digest = %mconfig.metadata.digest.hex_digest,
            "mconfig composed"
        );
        Ok(mconfig)
    }
}

async fn run_builder(
    builder: &dyn MconfigBuilder,
    timeout: Duration,
    network: &Network,
    graph: &EntityGraph,
    gateway_id: &str,
) -> Result<(String, ConfigsByKey), CoreError> {
    let name = builder.name().to_owned();
    match tokio::time::timeout(timeout, builder.build(network, graph, gateway_id)).await {
        Ok(Ok(configs)) => Ok((name, configs)),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(CoreError::BuilderTimeout {
            builder: name,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

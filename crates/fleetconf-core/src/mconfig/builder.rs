// Builder contract.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::model::{EntityGraph, Network};

/// Top-level section name -> encoded config.
pub type ConfigsByKey = BTreeMap<String, Vec<u8>>;

/// One independently owned contributor to a gateway's mconfig.
///
/// A builder with nothing to say for this network or gateway returns an
/// empty map. Errors abort the whole composition. Builders may be invoked
/// more than once for the same inputs and must return the same output.
#[async_trait]
pub trait MconfigBuilder: Send + Sync {
    fn name(&self) -> &str;

    async fn build(
        &self,
        network: &Network,
        graph: &EntityGraph,
        gateway_id: &str,
    ) -> Result<ConfigsByKey, CoreError>;
}

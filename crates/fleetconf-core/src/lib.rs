//! Entity-graph configuration store and mconfig composition pipeline.
//!
//! This crate owns the domain model and business logic of the fleet
//! control plane:
//!
//! - **Storage port** ([`storage`]): [`StorageFactory`] opens transactions,
//!   each a [`Store`] that sees one consistent snapshot. [`MemoryStorage`]
//!   is the in-process engine; it keeps connected-component graph IDs
//!   correct across every association change.
//!
//! - **[`NorthboundService`]**: operator CRUD over networks and entities,
//!   with all-or-nothing batch writes ([`EntityWriteOperation`]).
//!
//! - **[`SouthboundService`]**: device read path. Loads the caller's graph
//!   and network in one read-only transaction, then composes an
//!   [`Mconfig`] through the [`MconfigPipeline`].
//!
//! - **Builders** ([`mconfig`]): [`MconfigBuilder`] plugins discovered
//!   through a [`BuilderRegistry`], either in-process or remote over HTTP
//!   via `fleetconf-api`.
//!
//! Configuration arrives as a [`ServiceConfig`]; nothing here reads files.

pub mod codec;
pub mod config;
pub mod convert;
pub mod error;
pub mod mconfig;
pub mod model;
pub mod northbound;
pub mod southbound;
pub mod storage;

// ── Primary re-exports ──────────────────────────────────────────────
pub use codec::{CodecRegistry, ConfigCodec, JsonCodec, RawCodec};
pub use config::{BuiltinBuilderSpec, CodecKind, ServiceConfig, ServiceEndpoint};
pub use error::{CoreError, ErrorKind};
pub use mconfig::{
    BuilderRegistry, CompositeRegistry, ConfigsByKey, Mconfig, MconfigBuilder, MconfigPipeline,
    RemoteBuilder, ServiceRegistry, StaticRegistry,
};
pub use model::{
    Acl, AclPermission, AclScope, AclType, EntityGraph, GraphEdge, Network, NetworkEntity,
    TypeAndKey,
};
pub use northbound::{EntityWriteOperation, NorthboundService};
pub use southbound::{GatewayIdentity, SouthboundService};
pub use storage::{
    EntityLoadCriteria, EntityLoadFilter, EntityLoadResult, EntityUpdateCriteria, MemoryStorage,
    NetworkLoadCriteria, NetworkLoadFilter, NetworkLoadResult, NetworkUpdateCriteria,
    PhysicalIdUpdate, StorageFactory, Store, TxOptions, in_transaction,
};

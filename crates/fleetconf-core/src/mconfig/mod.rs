// ── Mconfig builder pipeline ──
//
// Builders each contribute named sections; the pipeline discovers them,
// runs them, and merges their output into one digested bundle.

pub mod builder;
pub mod builtin;
pub mod bundle;
pub mod pipeline;
pub mod registry;
pub mod remote;

pub use builder::{ConfigsByKey, MconfigBuilder};
pub use builtin::{EntityConfigBuilder, NetworkConfigBuilder};
pub use bundle::{DIGEST_ALGORITHM, Digest, Mconfig, MconfigMetadata};
pub use pipeline::MconfigPipeline;
pub use registry::{BuilderRegistry, CompositeRegistry, ServiceRegistry, StaticRegistry};
pub use remote::RemoteBuilder;

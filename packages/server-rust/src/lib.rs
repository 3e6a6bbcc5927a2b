//! Gatehouse Server — per-request tenant resolution for a multi-tenant
//! service mesh: configuration cache, remote authority client, circuit
//! breaker, context binding, and the axum gateway hosting them.

pub mod network;
pub mod resolver;

pub use network::{GatewayConfig, GatewayModule};
pub use resolver::{
    AuthorityConfig, BinderConfig, ClaimsDecoder, ConfigAuthority, ContextBinder,
    HttpAuthorityClient, Rejection, ResolverConfig, TenantResolver,
};

//! The tenant resolution engine: cache, breaker, authority client, context
//! binding, and the orchestrator composing them per request.

pub mod binder;
pub mod breaker;
pub mod cache;
pub mod claims;
pub mod client;
pub mod config;
pub mod orchestrator;
pub mod secrets;

pub use binder::ContextBinder;
pub use breaker::{BreakerState, FailureBreaker};
pub use cache::{CachedOutcome, ConfigCache};
pub use claims::ClaimsDecoder;
pub use client::{ConfigAuthority, FetchError, HttpAuthorityClient};
pub use config::{AuthorityConfig, BinderConfig, ResolverConfig};
pub use orchestrator::{Rejection, TenantResolver};
pub use secrets::SecretStore;

//! Gatehouse Core — tenant identity, configuration snapshots, wire
//! contracts, and the identifier extraction chain.
//!
//! Pure domain logic only: no I/O, no shared state. The server crate owns
//! everything that touches the network or process-wide resources.

pub mod context;
pub mod extract;
pub mod tenant;
pub mod wire;

pub use context::{cache_namespace, session_cookie, DatabaseTarget, TenantContext};
pub use extract::{extract_tenant_id, RequestSignals, RESERVED_SUBDOMAINS};
pub use tenant::{TenantConfig, TenantId, TenantStatus};
pub use wire::{AuthorityEnvelope, ErrorCode, RejectionBody};

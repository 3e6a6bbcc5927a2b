//! HTTP hosting for the resolution engine: configuration, middleware,
//! handlers, and the server lifecycle.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod module;

pub use config::GatewayConfig;
pub use handlers::AppState;
pub use middleware::{build_http_layers, rejection_response, resolve_tenant};
pub use module::GatewayModule;

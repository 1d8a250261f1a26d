//! Gateway error kinds.

use telemetry_apps::rest::RestServerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayErrorKind {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    RestServer(#[from] RestServerError),
}

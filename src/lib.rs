pub mod auth;
pub mod decode;
pub mod error;
pub mod http;
pub mod request;
pub mod transport;

/// User-Agent sent by the bundled transport.
pub const USER_AGENT: &str = concat!("sfrest/", env!("CARGO_PKG_VERSION"));

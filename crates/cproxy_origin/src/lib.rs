//! Outbound side of the proxy: one buffered GET per cache miss.

mod error;
mod forwarder;

pub use error::OriginError;
pub use forwarder::{Forwarder, OriginForwarder, OriginResponse};

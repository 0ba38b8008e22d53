pub mod master;
pub mod router;

mod inflight;
mod response;

pub use master::Master;
pub use response::{CacheStatus, ProxyResponse, X_CACHE};
pub use router::Router;

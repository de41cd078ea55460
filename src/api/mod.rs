pub mod ceramic_cache;
pub mod error;
pub mod server;
pub mod utils;

pub mod ceramic_cache;

pub use ceramic_cache::*;

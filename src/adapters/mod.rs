// Adapters layer: concrete implementations of the domain ports (files, http).

pub mod http;
pub mod session;
pub mod storage;

//! HTTP middleware stack: trace ids, CORS, and the optional bearer-token gate.

pub mod auth;
pub mod cors;
pub mod trace;

//! HTTP surface of the stateless evaluation service.

pub mod handlers;

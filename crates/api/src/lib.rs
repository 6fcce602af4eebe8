//! HTTP API: server, routing, and request/response mapping over the SCM
//! decision core.

pub mod app;

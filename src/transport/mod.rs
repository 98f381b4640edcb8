// src/transport/mod.rs
// Both wire protocols (§4.1, §6) route to the same dispatcher::dispatch;
// this module only owns framing and marshalling.

pub mod http;
pub mod stdio;

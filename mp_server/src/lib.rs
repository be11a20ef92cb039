//! Room server: WebSocket transport and HTTP endpoints around the
//! `mental_poker` room engine.

pub mod api;
pub mod config;
pub mod logging;

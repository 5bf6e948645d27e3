//! Engine for an AI chat, image-generation and speech companion app:
//! session state, streamed-reply reconciliation, durable persistence and
//! one generative-AI gateway. Presentation layers sit on top via store
//! snapshots and change events.

pub mod config;
pub mod gateway;
pub mod models;
pub mod services;

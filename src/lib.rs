//! Live presentation sync: one presenter drives a shared slide index per
//! deck, viewers follow over SSE and send ephemeral emoji reactions.

pub mod auth;
pub mod bus;
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod store;

#![doc = "The `taskflow` library crate."]
#![doc = ""]
#![doc = "Per-user task management: account registration and login with token"]
#![doc = "issuance, and CRUD plus filtering, statistics and bulk updates over"]
#![doc = "each account's tasks. The binary in `main.rs` wires these modules"]
#![doc = "into an HTTP server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;

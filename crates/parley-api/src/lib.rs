pub mod config;
pub mod controller;
pub mod docs;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;

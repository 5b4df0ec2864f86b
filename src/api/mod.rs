// HTTP API for the GameRank catalog: ranked listing, game pages, user activity
// and the two-stage login.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;

//! GameRank: imports game listings from two sources into one catalog and
//! serves it, with votes, follows and comments, over an authenticated HTTP API.

pub mod accounts;
pub mod api;
pub mod cli;
pub mod database_ops;
pub mod ingestion;
pub mod logging;
pub mod normalization;

pub mod util {
    pub mod env;
}

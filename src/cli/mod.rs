//! Command implementations shared by the `gamerank` admin CLI and the
//! standalone importer binaries.

pub mod admin;
pub mod import;

pub mod guards;
pub mod password;

pub use guards::{check_credentials, check_site_password, login, LoginError, LoginForm};

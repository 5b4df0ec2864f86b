pub mod release_date;
pub mod score;

pub use release_date::parse_release_date;
pub use score::{mean_score, VoteScore};

use serde::{Deserialize, Serialize};

/// Lowest score a user may give a game.
pub const MIN_SCORE: u8 = 0;
/// Highest score a user may give a game.
pub const MAX_SCORE: u8 = 5;

/// A validated vote on the 0-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct VoteScore(u8);

impl VoteScore {
    pub fn new(raw: i64) -> Option<Self> {
        if (MIN_SCORE as i64..=MAX_SCORE as i64).contains(&raw) {
            Some(Self(raw as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for VoteScore {
    type Error = String;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| format!("score must be between {MIN_SCORE} and {MAX_SCORE}"))
    }
}

impl From<VoteScore> for i64 {
    fn from(score: VoteScore) -> Self {
        score.0 as i64
    }
}

/// Arithmetic mean of the given scores, 0.0 when there are none.
pub fn mean_score<I>(scores: I) -> f64
where
    I: IntoIterator<Item = VoteScore>,
{
    let (sum, n) = scores
        .into_iter()
        .fold((0u64, 0u64), |(sum, n), s| (sum + s.get() as u64, n + 1));
    if n == 0 {
        0.0
    } else {
        sum as f64 / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(VoteScore::new(0).map(VoteScore::get), Some(0));
        assert_eq!(VoteScore::new(5).map(VoteScore::get), Some(5));
        assert!(VoteScore::new(-1).is_none());
        assert!(VoteScore::new(6).is_none());
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean_score(Vec::new()), 0.0);
    }

    #[test]
    fn mean_is_arithmetic() {
        let scores = [1, 4, 4].map(|s| VoteScore::new(s).unwrap());
        assert_eq!(mean_score(scores), 3.0);
    }

    #[test]
    fn deserializing_out_of_range_fails() {
        assert!(serde_json::from_str::<VoteScore>("3").is_ok());
        assert!(serde_json::from_str::<VoteScore>("9").is_err());
    }
}

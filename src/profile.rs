//! Account profile and token bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile returned by the platform's account endpoint
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub tokens: i64,
    /// When this snapshot was fetched
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Optimistic decrement after a successful call, floored at zero
    pub fn spend_token(&mut self) {
        self.tokens = (self.tokens - 1).max(0);
    }
}

/// Token balance used by the dispatch gate; an absent profile counts
/// as an empty balance
pub fn token_balance(profile: Option<&UserProfile>) -> i64 {
    profile.map(|p| p.tokens).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spending_floors_at_zero() {
        let mut profile = UserProfile {
            tokens: 1,
            ..UserProfile::default()
        };
        profile.spend_token();
        assert_eq!(profile.tokens, 0);
        profile.spend_token();
        assert_eq!(profile.tokens, 0);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let profile: UserProfile = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert_eq!(profile.email, "a@b.c");
        assert_eq!(profile.plan, "");
        assert_eq!(profile.tokens, 0);
        assert!(profile.fetched_at.is_none());
    }

    #[test]
    fn absent_profile_counts_as_empty_balance() {
        assert_eq!(token_balance(None), 0);
        let profile = UserProfile {
            tokens: 7,
            ..UserProfile::default()
        };
        assert_eq!(token_balance(Some(&profile)), 7);
    }
}

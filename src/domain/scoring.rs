//! Additive fraud scoring.
//!
//! Each rule contributes a fixed number of points independently of the others and the
//! total is capped at [`MAX_SCORE`].

use super::models::{Blacklist, NewTransaction, Transaction};

/// Amounts strictly above this are considered high-value.
pub const HIGH_AMOUNT_THRESHOLD: f64 = 10_000.0;
pub const HIGH_AMOUNT_POINTS: u32 = 30;

pub const BLACKLIST_POINTS: u32 = 50;

/// More prior transactions than this for one account count as frequent activity.
pub const FREQUENT_ACCOUNT_THRESHOLD: usize = 5;
pub const FREQUENT_ACCOUNT_POINTS: u32 = 20;

pub const MAX_SCORE: u32 = 100;

/// Computes the fraud score of `candidate` given the transactions accepted before it.
///
/// # Arguments
///
/// * `candidate` - The transaction being scored.
/// * `history` - Every previously accepted transaction, in arrival order.
/// * `blacklist` - Accounts that are always high-risk.
///
/// # Returns
///
/// A score in `[0, 100]`.
pub fn fraud_score(candidate: &NewTransaction, history: &[Transaction], blacklist: &Blacklist) -> u8 {
    let mut score = 0;

    if candidate.amount > HIGH_AMOUNT_THRESHOLD {
        score += HIGH_AMOUNT_POINTS;
    }

    if blacklist.contains(&candidate.account_id) {
        score += BLACKLIST_POINTS;
    }

    let prior = history
        .iter()
        .filter(|tx| tx.account_id == candidate.account_id)
        .count();
    if prior > FREQUENT_ACCOUNT_THRESHOLD {
        score += FREQUENT_ACCOUNT_POINTS;
    }

    score.min(MAX_SCORE) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn history_for(account_id: &str, count: u64) -> Vec<Transaction> {
        (1..=count)
            .map(|id| Transaction {
                id,
                account_id: account_id.to_string(),
                amount: 10.0,
                timestamp: "2024-01-01T00:00:00Z".to_string(),
                fraud_score: 0,
                extra: Map::new(),
            })
            .collect()
    }

    #[test]
    fn clean_transaction_scores_zero() {
        let candidate = NewTransaction::new("ACC-1", 500.0);
        assert_eq!(fraud_score(&candidate, &[], &Blacklist::default()), 0);
    }

    #[test]
    fn high_amount_scores_thirty() {
        let candidate = NewTransaction::new("ACC-1", 10_001.0);
        assert_eq!(fraud_score(&candidate, &[], &Blacklist::default()), 30);
    }

    #[test]
    fn threshold_amount_is_not_high_value() {
        let candidate = NewTransaction::new("ACC-1", 10_000.0);
        assert_eq!(fraud_score(&candidate, &[], &Blacklist::default()), 0);
    }

    #[test]
    fn blacklisted_account_scores_fifty() {
        let candidate = NewTransaction::new("BAD-1", 0.0);
        let blacklist: Blacklist = ["BAD-1"].into_iter().collect();
        assert_eq!(fraud_score(&candidate, &[], &blacklist), 50);
    }

    #[test]
    fn seventh_transaction_scores_twenty() {
        let candidate = NewTransaction::new("ACC-1", 10_000.0);
        let history = history_for("ACC-1", 6);
        assert_eq!(fraud_score(&candidate, &history, &Blacklist::default()), 20);
    }

    #[test]
    fn sixth_transaction_is_not_frequent() {
        let candidate = NewTransaction::new("ACC-1", 1.0);
        let history = history_for("ACC-1", 5);
        assert_eq!(fraud_score(&candidate, &history, &Blacklist::default()), 0);
    }

    #[test]
    fn other_accounts_do_not_count_towards_frequency() {
        let candidate = NewTransaction::new("ACC-1", 1.0);
        let history = history_for("ACC-2", 20);
        assert_eq!(fraud_score(&candidate, &history, &Blacklist::default()), 0);
    }

    #[test]
    fn all_rules_together_cap_at_one_hundred() {
        let candidate = NewTransaction::new("BAD-1", 20_000.0);
        let blacklist: Blacklist = ["BAD-1"].into_iter().collect();
        let history = history_for("BAD-1", 10);
        assert_eq!(fraud_score(&candidate, &history, &blacklist), 100);
    }
}

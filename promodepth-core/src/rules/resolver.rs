use crate::numeric::{clamp_pct, round2};
use crate::types::Candidate;

/// Pick the final promo depth from the candidate multiset.
///
/// The smallest implied discount wins. The returned candidate is the one that
/// produced it (the first one on ties), or `None` when nothing matched.
pub fn resolve(candidates: &[Candidate]) -> (f64, Option<&Candidate>) {
    let winner = candidates
        .iter()
        .reduce(|best, next| if next.value < best.value { next } else { best });

    match winner {
        Some(candidate) => (round2(clamp_pct(candidate.value)), Some(candidate)),
        None => (0.0, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(rule: &'static str, value: f64) -> Candidate {
        Candidate { rule, value }
    }

    #[test]
    fn test_empty_resolves_to_zero() {
        let (depth, winner) = resolve(&[]);
        assert_eq!(depth, 0.0);
        assert!(winner.is_none());
    }

    #[test]
    fn test_minimum_wins() {
        let candidates = [
            candidate("direct_percent", 50.0),
            candidate("buy_get", 33.333_333),
            candidate("multiplier", 40.0),
        ];
        let (depth, winner) = resolve(&candidates);
        assert_eq!(depth, 33.33);
        assert_eq!(winner.map(|c| c.rule), Some("buy_get"));
    }

    #[test]
    fn test_first_candidate_wins_ties() {
        let candidates = [candidate("a", 20.0), candidate("b", 20.0)];
        assert_eq!(resolve(&candidates).1.map(|c| c.rule), Some("a"));
    }

    #[test]
    fn test_clamped_into_range() {
        assert_eq!(resolve(&[candidate("direct_percent", 140.0)]).0, 100.0);
    }
}

use std::collections::BTreeMap;

use crate::models::vote::{Candidate, TallyOutcome, VoteTally, Votes};

/// Counts a meeting's ballots.
///
/// `"skip"` is counted like any other candidate. Two or more candidates sharing the top count is
/// a tie and ejects nobody, whether or not skip is among them. A sole top count held by skip is a
/// skip majority, also ejecting nobody.
pub fn tally(votes: &Votes) -> VoteTally {
    let mut counts: BTreeMap<Candidate, u32> = BTreeMap::new();
    for candidate in votes.values() {
        *counts.entry(candidate.clone()).or_insert(0) += 1;
    }

    let max = match counts.values().copied().max() {
        Some(max) => max,
        None => {
            return VoteTally {
                winner: None,
                is_tie: false,
                counts,
                outcome: TallyOutcome::NoVotes,
            }
        }
    };

    let leaders: Vec<&Candidate> = counts
        .iter()
        .filter(|(_, count)| **count == max)
        .map(|(candidate, _)| candidate)
        .collect();

    let (winner, is_tie, outcome) = match leaders.as_slice() {
        [Candidate::Player(id)] => (Some(id.clone()), false, TallyOutcome::Eject),
        [Candidate::Skip] => (None, false, TallyOutcome::SkipMajority),
        _ => (None, true, TallyOutcome::Tie),
    };

    VoteTally {
        winner,
        is_tie,
        counts,
        outcome,
    }
}

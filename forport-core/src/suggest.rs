//! "Did you mean" suggestions for unknown actions

/// Actions a user can type
pub const VALID_ACTIONS: [&str; 4] = ["list", "remove", "delete", "delete all"];

/// Minimum Jaro similarity for a suggestion, same cutoff clap uses
const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Find the valid action closest to `input`
///
/// Returns `None` when nothing is similar enough. On equal scores the
/// earlier entry of [`VALID_ACTIONS`] wins.
pub fn suggest(input: &str) -> Option<&'static str> {
    let input = input.to_lowercase();

    VALID_ACTIONS
        .iter()
        .map(|&action| (action, strsim::jaro(&input, action)))
        .filter(|&(_, score)| score > SIMILARITY_THRESHOLD)
        .fold(None, |best: Option<(&'static str, f64)>, candidate| match best {
            Some((_, best_score)) if best_score >= candidate.1 => best,
            _ => Some(candidate),
        })
        .map(|(action, _)| action)
}

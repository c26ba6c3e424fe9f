use crate::CardId;

/// the rules collaborator. deciding whether cards form a valid set is a
/// pure, stateless question, so it lives entirely behind this seam:
/// the dealer only ever asks, never computes.
///
/// implementations must be safe to call from the dealer thread while
/// player threads are running.
pub trait Rules: Send + Sync {
    /// whether these cards together form a valid set
    fn is_valid_set(&self, cards: &[CardId]) -> bool;

    /// up to `limit` valid sets among `cards`.
    /// used for the end-of-round and end-of-game checks (limit 1)
    /// and for hint display (unbounded).
    fn find_sets(&self, cards: &[CardId], limit: usize) -> Vec<Vec<CardId>>;
}

use crate::CardId;
use crate::PlayerId;
use crate::Score;
use crate::Slot;
use std::time::Duration;

/// the rendering collaborator. every board mutation and every display
/// update flows through here; the core never draws anything itself.
///
/// calls arrive from both the dealer thread and player threads, always
/// from inside the board boundary for card/token events, so they should
/// return quickly.
pub trait Screen: Send + Sync {
    fn place_card(&self, _card: CardId, _slot: Slot) {}
    fn remove_card(&self, _slot: Slot) {}
    fn place_token(&self, _player: PlayerId, _slot: Slot) {}
    fn remove_token(&self, _player: PlayerId, _slot: Slot) {}
    fn countdown(&self, _remaining: Duration, _warn: bool) {}
    fn score(&self, _player: PlayerId, _score: Score) {}
    fn winners(&self, _players: &[PlayerId]) {}
}

/// headless screen. renders nothing, useful for tests and simulations.
#[derive(Debug, Default)]
pub struct Quiet;

impl Screen for Quiet {}

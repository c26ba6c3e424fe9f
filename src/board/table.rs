use crate::CardId;
use crate::PlayerId;
use crate::Slot;
use crate::game::Seat;
use crate::interface::Screen;
use crate::settings::Settings;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

/// outcome of a probe against one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flip {
    /// a token was placed
    Up,
    /// the player's own token was lifted
    Down,
    /// the slot was empty or out of range, nothing happened
    Skip,
}

/// the shared board: the slot/card bijection plus the per-slot,
/// per-player token matrix. every operation takes the single boundary
/// mutex for its whole duration, so no mutation is ever observable
/// half-done.
///
/// invariant: slot_to_card[s] == Some(c) iff card_to_slot[c] == Some(s),
/// and a token exists only on a slot that holds a card.
///
/// lock hierarchy: callers holding the claim FairLock may take this
/// boundary; the reverse never happens. seat gates are only taken from
/// inside the boundary (token stripping), never the other way around.
pub struct Table {
    boundary: Mutex<Grid>,
    seats: Vec<Arc<Seat>>,
    screen: Arc<dyn Screen>,
    delay: Duration,
}

#[derive(Debug)]
struct Grid {
    slot_to_card: Vec<Option<CardId>>,
    card_to_slot: Vec<Option<Slot>>,
    tokens: Vec<Vec<bool>>, // slot x player
}

impl Table {
    pub fn new(settings: &Settings, seats: Vec<Arc<Seat>>, screen: Arc<dyn Screen>) -> Self {
        let players = seats.len();
        Self {
            boundary: Mutex::new(Grid {
                slot_to_card: vec![None; settings.table_size],
                card_to_slot: vec![None; settings.deck_size],
                tokens: vec![vec![false; players]; settings.table_size],
            }),
            seats,
            screen,
            delay: settings.deal_delay,
        }
    }

    fn grid(&self) -> MutexGuard<'_, Grid> {
        self.boundary.lock().expect("table boundary poisoned")
    }

    /// put a card in an empty slot. dealer only.
    pub fn place_card(&self, card: CardId, slot: Slot) {
        let mut grid = self.grid();
        debug_assert!(grid.slot_to_card[slot].is_none(), "slot {} occupied", slot);
        if !self.delay.is_zero() {
            // the artificial dealing pace happens inside the boundary,
            // players observe either the old or the new table
            std::thread::sleep(self.delay);
        }
        grid.slot_to_card[slot] = Some(card);
        grid.card_to_slot[card] = Some(slot);
        self.screen.place_card(card, slot);
    }

    /// clear a slot, cascading into every token on it: each owner is
    /// synchronously told it lost a token, and the ids of owners whose
    /// pending claim that voided are handed back so the caller (the
    /// dealer, holding the claim lock) can drop them from the queue.
    /// no-op if the slot is already empty.
    pub fn remove_card(&self, slot: Slot) -> Vec<PlayerId> {
        let mut grid = self.grid();
        let Some(card) = grid.slot_to_card.get(slot).copied().flatten() else {
            return Vec::new();
        };
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        grid.card_to_slot[card] = None;
        grid.slot_to_card[slot] = None;
        self.screen.remove_card(slot);
        let mut voided = Vec::new();
        for (player, seat) in self.seats.iter().enumerate() {
            if grid.tokens[slot][player] {
                grid.tokens[slot][player] = false;
                self.screen.remove_token(player, slot);
                if seat.strip_token() {
                    voided.push(player);
                }
            }
        }
        voided
    }

    /// one probe, resolved atomically: an empty or out-of-range slot is
    /// ignored, otherwise the player's token on it is toggled. probes
    /// come straight from input sources, so the slot is untrusted.
    pub fn toggle(&self, player: PlayerId, slot: Slot) -> Flip {
        let mut grid = self.grid();
        if slot >= grid.slot_to_card.len() || grid.slot_to_card[slot].is_none() {
            Flip::Skip
        } else if grid.tokens[slot][player] {
            self.lift(&mut grid, player, slot);
            Flip::Down
        } else {
            self.mark(&mut grid, player, slot);
            Flip::Up
        }
    }

    /// idempotent token placement. no-op on an empty or out-of-range
    /// slot, or when the token is already there.
    pub fn place_token(&self, player: PlayerId, slot: Slot) -> bool {
        let mut grid = self.grid();
        if slot >= grid.slot_to_card.len()
            || grid.slot_to_card[slot].is_none()
            || grid.tokens[slot][player]
        {
            return false;
        }
        self.mark(&mut grid, player, slot);
        true
    }

    /// lift the player's own token, reporting whether one was there
    pub fn remove_token(&self, player: PlayerId, slot: Slot) -> bool {
        let mut grid = self.grid();
        if slot < grid.tokens.len() && grid.tokens[slot][player] {
            self.lift(&mut grid, player, slot);
            true
        } else {
            false
        }
    }

    /// clear every token this player owns, without claim cancellation.
    /// used by the dealer right before adjudicating, win or lose.
    pub fn reset_tokens_of(&self, player: PlayerId) {
        let mut grid = self.grid();
        for slot in 0..grid.tokens.len() {
            if grid.tokens[slot][player] {
                grid.tokens[slot][player] = false;
                self.seats[player].sub_token();
                self.screen.remove_token(player, slot);
            }
        }
    }

    fn mark(&self, grid: &mut Grid, player: PlayerId, slot: Slot) {
        grid.tokens[slot][player] = true;
        self.seats[player].add_token();
        self.screen.place_token(player, slot);
    }

    fn lift(&self, grid: &mut Grid, player: PlayerId, slot: Slot) {
        grid.tokens[slot][player] = false;
        self.seats[player].sub_token();
        self.screen.remove_token(player, slot);
    }

    pub fn is_slot_empty(&self, slot: Slot) -> bool {
        self.grid().slot_to_card.get(slot).map_or(true, |card| card.is_none())
    }

    pub fn is_token_placed(&self, player: PlayerId, slot: Slot) -> bool {
        self.grid().tokens.get(slot).map_or(false, |row| row[player])
    }

    pub fn card_at(&self, slot: Slot) -> Option<CardId> {
        self.grid().slot_to_card.get(slot).copied().flatten()
    }

    pub fn slot_of(&self, card: CardId) -> Option<Slot> {
        self.grid().card_to_slot[card]
    }

    /// every card on the table, in slot order
    pub fn cards(&self) -> Vec<CardId> {
        self.grid().slot_to_card.iter().flatten().copied().collect()
    }

    /// the cards this player has marked, in slot order
    pub fn picks_of(&self, player: PlayerId) -> Vec<CardId> {
        let grid = self.grid();
        grid.tokens
            .iter()
            .enumerate()
            .filter(|(_, row)| row[player])
            .filter_map(|(slot, _)| grid.slot_to_card[slot])
            .collect()
    }
}

use super::Player;
use super::Seat;
use crate::PlayerId;
use crate::board::Deck;
use crate::board::Table;
use crate::interface::Rules;
use crate::interface::Screen;
use crate::settings::Settings;
use crate::sync::Claims;
use std::sync::Arc;
use std::sync::Barrier;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;
use std::time::Instant;

/// countdown refresh granularity outside the warning window
const TICK: Duration = Duration::from_millis(999);
/// countdown refresh granularity inside the warning window
const WARN_TICK: Duration = Duration::from_millis(9);

/// external stop request. flipping it ends the game at the next round
/// boundary and wakes the dealer if it is dozing.
#[derive(Clone)]
pub struct Switch {
    halt: Arc<AtomicBool>,
    claims: Arc<Claims>,
}

impl Switch {
    pub fn flip(&self) {
        self.halt.store(true, Ordering::Relaxed);
        self.claims.ring();
    }
    pub fn flipped(&self) -> bool {
        self.halt.load(Ordering::Relaxed)
    }
}

/// the sole orchestrator. owns the deck, runs the round timer, drains
/// and adjudicates claims, replenishes the table and announces the
/// winners. everything the players share (table, claim queue, seats)
/// is constructed here and handed out by reference.
pub struct Dealer {
    settings: Settings,
    rules: Arc<dyn Rules>,
    screen: Arc<dyn Screen>,
    table: Arc<Table>,
    seats: Vec<Arc<Seat>>,
    players: Vec<Player>,
    claims: Arc<Claims>,
    bell: Receiver<()>,
    deck: Deck,
    halt: Arc<AtomicBool>,
    round: Instant,
}

impl Dealer {
    pub fn new(settings: Settings, rules: Arc<dyn Rules>, screen: Arc<dyn Screen>) -> Self {
        let (claims, bell) = Claims::new();
        let claims = Arc::new(claims);
        let mut seats = Vec::new();
        let mut inboxes = Vec::new();
        for id in 0..settings.players() {
            let (seat, inbox) = Seat::new(id, settings.feature_size);
            seats.push(seat);
            inboxes.push(inbox);
        }
        let table = Arc::new(Table::new(&settings, seats.clone(), screen.clone()));
        let players = inboxes
            .into_iter()
            .enumerate()
            .map(|(id, inbox)| {
                Player::new(
                    &settings,
                    seats[id].clone(),
                    inbox,
                    table.clone(),
                    claims.clone(),
                    id < settings.humans,
                )
            })
            .collect();
        let deck = Deck::new(settings.deck_size);
        Self {
            settings,
            rules,
            screen,
            table,
            seats,
            players,
            claims,
            bell,
            deck,
            halt: Arc::new(AtomicBool::new(false)),
            round: Instant::now(),
        }
    }

    /// shared player state, for wiring up input sources
    pub fn seats(&self) -> &[Arc<Seat>] {
        &self.seats
    }

    /// handle for requesting an external stop
    pub fn switch(&self) -> Switch {
        Switch {
            halt: self.halt.clone(),
            claims: self.claims.clone(),
        }
    }

    /// the dealer thread: bootstrap, rounds until the game is over,
    /// orderly shutdown, winner announcement. returns the winning ids.
    pub fn run(mut self) -> Vec<PlayerId> {
        log::info!("thread dealer starting");
        self.deck.shuffle();
        let ready = Arc::new(Barrier::new(self.players.len() + 1));
        let workers = std::mem::take(&mut self.players)
            .into_iter()
            .map(|player| {
                let ready = ready.clone();
                thread::Builder::new()
                    .name(format!("player-{}", player.seat().id()))
                    .spawn(move || player.run(ready))
                    .expect("spawn player thread")
            })
            .collect::<Vec<_>>();
        ready.wait();
        self.deal();
        while !self.should_finish() {
            self.round();
            self.reshuffle();
        }
        for seat in &self.seats {
            seat.stop();
        }
        for worker in workers {
            let _ = worker.join();
        }
        let winners = self.winners();
        self.screen.winners(&winners);
        log::info!("thread dealer terminated, winners {:?}", winners);
        winners
    }

    /// one timed round: doze until a claim arrives or the tick elapses,
    /// refresh the countdown, adjudicate one claim, top up the table,
    /// and end on timeout or as soon as no set remains on it
    fn round(&mut self) {
        self.round = Instant::now();
        self.countdown();
        self.hints();
        loop {
            if self.halted() {
                return;
            }
            self.doze();
            self.countdown();
            self.collect();
            self.deal();
            if self.round.elapsed() >= self.settings.turn_timeout {
                log::debug!("round timed out");
                return;
            }
            if self.rules.find_sets(&self.table.cards(), 1).is_empty() {
                log::debug!("no set left on the table, ending the round early");
                return;
            }
        }
    }

    /// adjudicate the earliest pending claim, if any. runs entirely
    /// under the priority lock: the claimant's tokens come off the
    /// table win or lose, a valid set takes its cards (voiding any
    /// overlapping claims) and is replenished before the verdict goes
    /// out, an invalid one costs a penalty.
    fn collect(&mut self) {
        let claims = self.claims.clone();
        let mut queue = claims.adjudicate();
        let Some(claimant) = queue.pop_front() else {
            return;
        };
        let seat = self.seats[claimant].clone();
        let picks = self.table.picks_of(claimant);
        self.table.reset_tokens_of(claimant);
        debug_assert_eq!(picks.len(), self.settings.feature_size);
        if self.rules.is_valid_set(&picks) {
            for card in picks {
                if let Some(slot) = self.table.slot_of(card) {
                    for voided in self.table.remove_card(slot) {
                        log::debug!("claim by player {} went stale, cancelled", voided);
                        queue.retain(|player| *player != voided);
                    }
                }
            }
            self.deal();
            let score = seat.point();
            self.screen.score(claimant, score);
            log::info!("player {} takes the set, now at {}", claimant, score);
        } else {
            seat.penalty();
            log::info!("player {} claimed a bad set, penalized", claimant);
        }
    }

    /// fill every empty slot from the deck until the table is full or
    /// the deck runs dry
    fn deal(&mut self) {
        for slot in 0..self.settings.table_size {
            if self.deck.is_empty() {
                return;
            }
            if self.table.is_slot_empty(slot) {
                if let Some(card) = self.deck.draw() {
                    self.table.place_card(card, slot);
                }
            }
        }
    }

    /// end of round: every card on the table is discarded (pending
    /// claims die with their tokens), the remaining stock is shuffled
    /// anew and a fresh table is dealt
    fn reshuffle(&mut self) {
        let claims = self.claims.clone();
        {
            let mut queue = claims.adjudicate();
            for slot in 0..self.settings.table_size {
                for voided in self.table.remove_card(slot) {
                    log::debug!("claim by player {} died in the reshuffle", voided);
                    queue.retain(|player| *player != voided);
                }
            }
            debug_assert!(queue.is_empty());
        }
        self.deck.shuffle();
        log::debug!("stock reshuffled, {} cards remain", self.deck.len());
        self.deal();
    }

    /// wait for the next claim or the next countdown tick, whichever
    /// comes first. the bell makes this wait interruptible so
    /// adjudication latency never depends on tick granularity.
    fn doze(&self) {
        let tick = match self.warning() {
            true => WARN_TICK,
            false => TICK,
        };
        let _ = self.bell.recv_timeout(tick);
    }

    fn countdown(&self) {
        let remaining = self.settings.turn_timeout.saturating_sub(self.round.elapsed());
        self.screen.countdown(remaining, remaining <= self.settings.turn_warning);
    }

    fn warning(&self) -> bool {
        self.settings.turn_timeout.saturating_sub(self.round.elapsed())
            <= self.settings.turn_warning
    }

    /// log every set currently findable on the table, by slot
    fn hints(&self) {
        if !self.settings.hints {
            return;
        }
        for set in self.rules.find_sets(&self.table.cards(), usize::MAX) {
            let slots = set
                .iter()
                .filter_map(|card| self.table.slot_of(*card))
                .collect::<Vec<_>>();
            log::debug!("hint: set at slots {:?}", slots);
        }
    }

    /// the game is over on an external stop, or naturally once no set
    /// can be made from the table and the deck together
    fn should_finish(&self) -> bool {
        if self.halted() {
            return true;
        }
        let mut pool = self.table.cards();
        pool.extend_from_slice(self.deck.remaining());
        self.rules.find_sets(&pool, 1).is_empty()
    }

    fn halted(&self) -> bool {
        self.halt.load(Ordering::Relaxed)
    }

    /// highest score wins; every seat achieving it is a joint winner
    fn winners(&self) -> Vec<PlayerId> {
        let top = self.seats.iter().map(|seat| seat.score()).max().unwrap_or(0);
        self.seats
            .iter()
            .filter(|seat| seat.score() == top)
            .map(|seat| seat.id())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CardId;
    use crate::game::Signal;
    use crate::game::Verdict;
    use crate::interface::Quiet;

    /// every three cards make a set
    struct Always;
    impl Rules for Always {
        fn is_valid_set(&self, cards: &[CardId]) -> bool {
            cards.len() == 3
        }
        fn find_sets(&self, cards: &[CardId], limit: usize) -> Vec<Vec<CardId>> {
            match cards.len() >= 3 && limit > 0 {
                true => vec![cards[..3].to_vec()],
                false => Vec::new(),
            }
        }
    }

    /// no three cards ever make a set
    struct Never;
    impl Rules for Never {
        fn is_valid_set(&self, _: &[CardId]) -> bool {
            false
        }
        fn find_sets(&self, _: &[CardId], _: usize) -> Vec<Vec<CardId>> {
            Vec::new()
        }
    }

    fn dealer(rules: Arc<dyn Rules>, humans: usize, cpus: usize) -> Dealer {
        let settings = Settings {
            humans,
            cpus,
            deal_delay: Duration::ZERO,
            point_freeze: Duration::ZERO,
            penalty_freeze: Duration::ZERO,
            ..Settings::default()
        };
        Dealer::new(settings, rules, Arc::new(Quiet))
    }

    #[test]
    fn a_valid_claim_scores_freezes_and_refills() {
        let mut dealer = dealer(Arc::new(Always), 1, 0);
        dealer.deal();
        let originals = (0..3).map(|s| dealer.table.card_at(s)).collect::<Vec<_>>();
        for slot in 0..3 {
            dealer.table.toggle(0, slot);
        }
        assert!(dealer.claims.submit(&dealer.seats[0]));
        dealer.collect();
        let seat = &dealer.seats[0];
        assert_eq!(seat.score(), 1);
        assert_eq!(seat.token_count(), 0);
        assert!(!seat.is_pending());
        for slot in 0..3 {
            assert!(dealer.table.card_at(slot).is_some());
            assert_ne!(dealer.table.card_at(slot), originals[slot]);
        }
        assert_eq!(
            dealer.players[0].inbox().try_recv(),
            Ok(Signal::Verdict(Verdict::Point))
        );
    }

    #[test]
    fn a_rejected_claim_penalizes_and_leaves_the_cards() {
        let mut dealer = dealer(Arc::new(Never), 1, 0);
        dealer.deal();
        let originals = (0..3).map(|s| dealer.table.card_at(s)).collect::<Vec<_>>();
        for slot in 0..3 {
            dealer.table.toggle(0, slot);
        }
        assert!(dealer.claims.submit(&dealer.seats[0]));
        dealer.collect();
        let seat = &dealer.seats[0];
        assert_eq!(seat.score(), 0);
        assert_eq!(seat.token_count(), 0);
        assert!(!seat.is_pending());
        for slot in 0..3 {
            assert_eq!(dealer.table.card_at(slot), originals[slot]);
        }
        assert_eq!(
            dealer.players[0].inbox().try_recv(),
            Ok(Signal::Verdict(Verdict::Penalty))
        );
    }

    #[test]
    fn overlapping_later_claim_is_cancelled_without_penalty() {
        let mut dealer = dealer(Arc::new(Always), 2, 0);
        dealer.deal();
        for slot in [0, 1, 2] {
            dealer.table.toggle(0, slot);
        }
        assert!(dealer.claims.submit(&dealer.seats[0]));
        for slot in [2, 3, 4] {
            dealer.table.toggle(1, slot);
        }
        assert!(dealer.claims.submit(&dealer.seats[1]));
        dealer.collect();
        assert_eq!(dealer.seats[0].score(), 1);
        assert_eq!(dealer.seats[1].score(), 0);
        assert!(!dealer.seats[1].is_pending());
        // the shared slot cost player 1 one token, the other two stand
        assert_eq!(dealer.seats[1].token_count(), 2);
        assert!(dealer.claims.adjudicate().is_empty());
        assert_eq!(
            dealer.players[1].inbox().try_recv(),
            Ok(Signal::Verdict(Verdict::Cancelled))
        );
        dealer.collect(); // nothing left to adjudicate
        assert_eq!(dealer.seats[1].score(), 0);
    }

    #[test]
    fn disjoint_claims_are_served_in_submission_order() {
        let mut dealer = dealer(Arc::new(Always), 2, 0);
        dealer.deal();
        for slot in [3, 4, 5] {
            dealer.table.toggle(1, slot);
        }
        assert!(dealer.claims.submit(&dealer.seats[1]));
        for slot in [0, 1, 2] {
            dealer.table.toggle(0, slot);
        }
        assert!(dealer.claims.submit(&dealer.seats[0]));
        dealer.collect();
        assert_eq!(dealer.seats[1].score(), 1);
        assert_eq!(dealer.seats[0].score(), 0);
        assert!(dealer.seats[0].is_pending());
        dealer.collect();
        assert_eq!(dealer.seats[0].score(), 1);
    }

    #[test]
    fn round_ends_early_when_no_set_is_on_the_table() {
        let mut dealer = dealer(Arc::new(Never), 0, 0);
        dealer.deal();
        let start = Instant::now();
        dealer.round();
        assert!(start.elapsed() < dealer.settings.turn_timeout / 2);
    }

    #[test]
    fn reshuffle_discards_the_table_and_redeals() {
        let mut dealer = dealer(Arc::new(Never), 1, 0);
        dealer.deal();
        let before = dealer.table.cards();
        dealer.reshuffle();
        let after = dealer.table.cards();
        assert_eq!(after.len(), dealer.settings.table_size);
        assert!(after.iter().all(|card| !before.contains(card)));
    }

    #[test]
    fn reshuffle_cancels_claims_left_in_the_queue() {
        let mut dealer = dealer(Arc::new(Never), 1, 0);
        dealer.deal();
        for slot in 0..3 {
            dealer.table.toggle(0, slot);
        }
        assert!(dealer.claims.submit(&dealer.seats[0]));
        dealer.reshuffle();
        assert!(!dealer.seats[0].is_pending());
        assert_eq!(dealer.seats[0].token_count(), 0);
        assert_eq!(
            dealer.players[0].inbox().try_recv(),
            Ok(Signal::Verdict(Verdict::Cancelled))
        );
    }

    #[test]
    fn game_with_no_sets_at_all_ends_in_a_tie() {
        let dealer = dealer(Arc::new(Never), 0, 2);
        let winners = dealer.run();
        assert_eq!(winners, vec![0, 1]);
    }

    #[test]
    fn live_game_scores_then_stops_on_the_switch() {
        let dealer = dealer(Arc::new(Always), 1, 0);
        let seat = dealer.seats()[0].clone();
        let switch = dealer.switch();
        let game = thread::spawn(move || dealer.run());
        let deadline = Instant::now() + Duration::from_secs(10);
        while seat.score() == 0 && Instant::now() < deadline {
            for slot in 0..3 {
                seat.probe(slot);
            }
            thread::sleep(Duration::from_millis(10));
        }
        switch.flip();
        let winners = game.join().unwrap();
        assert!(seat.score() >= 1);
        assert_eq!(winners, vec![0]);
    }
}

use super::Seat;
use super::Signal;
use super::Verdict;
use crate::Slot;
use crate::board::Table;
use crate::settings::Settings;
use crate::sync::Claims;
use rand::Rng;
use std::sync::Arc;
use std::sync::Barrier;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::TryRecvError;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

/// how often an autonomous player presses a key
const PACE: Duration = Duration::from_millis(25);

/// one worker thread's worth of player: consumes probes off its inbox,
/// toggles tokens on the table, and suspends on a completed claim until
/// the dealer rules on it.
///
/// non-human players additionally run a generator sub-thread that
/// produces probes on its own; it obeys the same gating as any other
/// input source and is joined before the worker counts as terminated.
pub struct Player {
    seat: Arc<Seat>,
    table: Arc<Table>,
    claims: Arc<Claims>,
    inbox: Receiver<Signal>,
    human: bool,
    table_size: usize,
    point_freeze: Duration,
    penalty_freeze: Duration,
}

impl Player {
    pub(crate) fn new(
        settings: &Settings,
        seat: Arc<Seat>,
        inbox: Receiver<Signal>,
        table: Arc<Table>,
        claims: Arc<Claims>,
        human: bool,
    ) -> Self {
        Self {
            seat,
            table,
            claims,
            inbox,
            human,
            table_size: settings.table_size,
            point_freeze: settings.point_freeze,
            penalty_freeze: settings.penalty_freeze,
        }
    }

    pub(crate) fn seat(&self) -> &Arc<Seat> {
        &self.seat
    }

    #[cfg(test)]
    pub(crate) fn inbox(&self) -> &Receiver<Signal> {
        &self.inbox
    }

    /// worker entrypoint. rendezvous with the dealer first so no claim
    /// can arrive before the dealer is listening.
    pub(crate) fn run(self, ready: Arc<Barrier>) {
        log::info!("thread player-{} starting", self.seat.id());
        ready.wait();
        let generator = match self.human {
            true => None,
            false => Some(Self::generate(self.seat.clone(), self.table_size)),
        };
        while self.turn() {}
        if let Some(generator) = generator {
            let _ = generator.join();
        }
        log::info!("thread player-{} terminated", self.seat.id());
    }

    /// one trip around the inbox; false once the player should exit
    fn turn(&self) -> bool {
        match self.inbox.recv() {
            Err(_) | Ok(Signal::Stop) => false,
            Ok(Signal::Probe(slot)) => self.press(slot),
            Ok(Signal::Verdict(verdict)) => {
                // a cancellation can cross a press already in flight;
                // the claim is long resolved, nothing to do
                log::warn!(
                    "player {} got a stray {:?} verdict",
                    self.seat.id(),
                    verdict
                );
                true
            }
        }
    }

    /// toggle the probed slot; when that completes the token budget,
    /// enter the claim and suspend until the dealer resolves it
    fn press(&self, slot: Slot) -> bool {
        self.table.toggle(self.seat.id(), slot);
        if self.seat.completed() && self.claims.submit(&self.seat) {
            match self.verdict() {
                Some(verdict) => return self.freeze(verdict),
                None => return false,
            }
        }
        true
    }

    /// clear the probes that queued up behind the claim, then block
    /// until the dealer's ruling arrives. None means shutdown.
    fn verdict(&self) -> Option<Verdict> {
        loop {
            match self.inbox.try_recv() {
                Ok(Signal::Probe(_)) => continue, // superseded by the claim
                Ok(Signal::Verdict(verdict)) => return Some(verdict),
                Ok(Signal::Stop) => return None,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return None,
            }
        }
        loop {
            match self.inbox.recv() {
                Ok(Signal::Probe(_)) => continue, // one press may trail the claim
                Ok(Signal::Verdict(verdict)) => return Some(verdict),
                Ok(Signal::Stop) | Err(_) => return None,
            }
        }
    }

    /// serve the freeze the verdict carries before touching the next
    /// probe; false if the game stopped mid-freeze
    fn freeze(&self, verdict: Verdict) -> bool {
        let budget = match verdict {
            Verdict::Point => self.point_freeze,
            Verdict::Penalty => self.penalty_freeze,
            Verdict::Cancelled => Duration::ZERO,
        };
        budget.is_zero() || self.seat.doze(budget)
    }

    /// the generator sub-thread: an opaque source of probes for a
    /// non-human player. slot choice is uniformly random; the probe
    /// call itself blocks while the player is pending adjudication.
    fn generate(seat: Arc<Seat>, table_size: usize) -> JoinHandle<()> {
        thread::Builder::new()
            .name(format!("generator-{}", seat.id()))
            .spawn(move || {
                log::info!("thread generator-{} starting", seat.id());
                let mut rng = rand::rng();
                while !seat.halted() {
                    seat.probe(rng.random_range(0..table_size));
                    if !seat.doze(PACE) {
                        break;
                    }
                }
                log::info!("thread generator-{} terminated", seat.id());
            })
            .expect("spawn generator thread")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::Quiet;
    use std::time::Instant;

    /// a running human worker wired to its own table and claim queue
    fn worker(settings: &Settings) -> (Arc<Seat>, Arc<Table>, Arc<Claims>, JoinHandle<()>) {
        let (claims, _rung) = Claims::new();
        let claims = Arc::new(claims);
        let (seat, inbox) = Seat::new(0, settings.feature_size);
        let table = Arc::new(Table::new(settings, vec![seat.clone()], Arc::new(Quiet)));
        let player = Player::new(
            settings,
            seat.clone(),
            inbox,
            table.clone(),
            claims.clone(),
            true,
        );
        let ready = Arc::new(Barrier::new(2));
        let handle = {
            let ready = ready.clone();
            thread::spawn(move || player.run(ready))
        };
        ready.wait();
        (seat, table, claims, handle)
    }

    fn settle(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn penalty_freeze_delays_the_next_probe() {
        let settings = Settings {
            humans: 1,
            cpus: 0,
            deal_delay: Duration::ZERO,
            penalty_freeze: Duration::from_millis(200),
            ..Settings::default()
        };
        let (seat, table, claims, handle) = worker(&settings);
        for slot in 0..3 {
            table.place_card(slot, slot);
        }
        for slot in 0..3 {
            seat.probe(slot);
        }
        settle(|| !claims.adjudicate().is_empty());
        assert_eq!(claims.adjudicate().pop_front(), Some(0));
        table.reset_tokens_of(0);
        let frozen = Instant::now();
        seat.penalty();
        seat.probe(0);
        thread::sleep(Duration::from_millis(50));
        // the probe sits in the inbox until the freeze budget is served
        assert!(!table.is_token_placed(0, 0));
        settle(|| table.is_token_placed(0, 0));
        assert!(table.is_token_placed(0, 0));
        assert!(frozen.elapsed() >= settings.penalty_freeze);
        seat.stop();
        handle.join().unwrap();
    }

    #[test]
    fn wild_probes_do_not_kill_the_worker() {
        let settings = Settings {
            humans: 1,
            cpus: 0,
            deal_delay: Duration::ZERO,
            ..Settings::default()
        };
        let (seat, table, _claims, handle) = worker(&settings);
        table.place_card(0, 0);
        seat.probe(settings.table_size + 87);
        seat.probe(0);
        settle(|| table.is_token_placed(0, 0));
        assert!(table.is_token_placed(0, 0));
        seat.stop();
        handle.join().unwrap();
    }
}

use crate::PlayerId;
use crate::Score;
use crate::Slot;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::Sender;
use std::sync::mpsc::channel;
use std::time::Duration;
use std::time::Instant;

/// the dealer's ruling on a claim, delivered as one message so the
/// woken worker never has to guess why it woke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// the set was valid: score went up, point freeze applies
    Point,
    /// the set was rejected: penalty freeze applies
    Penalty,
    /// the claim went stale before adjudication: no freeze, play on
    Cancelled,
}

/// everything a player thread can find in its inbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Probe(Slot),
    Verdict(Verdict),
    Stop,
}

/// the shared face of one player: identity, score, token count, the
/// pending-adjudication gate and the signal channel into the worker.
/// constructed by the dealer, handed by reference to the worker, the
/// board and any input source.
///
/// the token count is only ever modified from inside the table
/// boundary; reads elsewhere are eventually-consistent snapshots,
/// except under the claim lock where stripping is excluded too.
#[derive(Debug)]
pub struct Seat {
    id: PlayerId,
    feature: usize,
    score: AtomicU32,
    tokens: AtomicUsize,
    pending: Mutex<bool>,
    gate: Condvar,
    halt: AtomicBool,
    tx: Sender<Signal>,
}

impl Seat {
    /// the receiver half of the signal channel belongs to the worker
    pub fn new(id: PlayerId, feature: usize) -> (Arc<Self>, Receiver<Signal>) {
        let (tx, rx) = channel();
        let seat = Self {
            id,
            feature,
            score: AtomicU32::new(0),
            tokens: AtomicUsize::new(0),
            pending: Mutex::new(false),
            gate: Condvar::new(),
            halt: AtomicBool::new(false),
            tx,
        };
        (Arc::new(seat), rx)
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }
    pub fn score(&self) -> Score {
        self.score.load(Ordering::Relaxed)
    }
    pub fn token_count(&self) -> usize {
        self.tokens.load(Ordering::Relaxed)
    }
    /// token budget fully spent, a claim is due
    pub fn completed(&self) -> bool {
        self.token_count() == self.feature
    }
    pub fn is_pending(&self) -> bool {
        *self.pending.lock().expect("seat gate poisoned")
    }
    pub fn halted(&self) -> bool {
        self.halt.load(Ordering::Relaxed)
    }

    /// input-source entrypoint: request a probe against one slot.
    /// blocks while a claim is pending, so at most one press can trail
    /// the one that triggered the claim. silently dropped once halted.
    pub fn probe(&self, slot: Slot) {
        let mut pending = self.pending.lock().expect("seat gate poisoned");
        while *pending && !self.halted() {
            pending = self.gate.wait(pending).expect("seat gate poisoned");
        }
        drop(pending);
        if self.halted() {
            return;
        }
        let _ = self.tx.send(Signal::Probe(slot));
    }

    /// halt-aware pause. waits out the budget unless the seat is
    /// stopped first; true iff the budget was fully served.
    pub fn doze(&self, budget: Duration) -> bool {
        let deadline = Instant::now() + budget;
        let mut pending = self.pending.lock().expect("seat gate poisoned");
        loop {
            if self.halted() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let (guard, _) = self
                .gate
                .wait_timeout(pending, deadline - now)
                .expect("seat gate poisoned");
            pending = guard;
        }
    }

    /// mark the seat pending adjudication. called by the claim queue
    /// under its lock, right before the claim is enqueued.
    pub(crate) fn begin_claim(&self) {
        *self.pending.lock().expect("seat gate poisoned") = true;
    }

    /// dealer ruling: valid set. bumps the score and releases the
    /// worker with a point verdict.
    pub(crate) fn point(&self) -> Score {
        let score = self.score.fetch_add(1, Ordering::Relaxed) + 1;
        self.resolve(Verdict::Point);
        score
    }

    /// dealer ruling: rejected set
    pub(crate) fn penalty(&self) {
        self.resolve(Verdict::Penalty);
    }

    /// one of this player's tokens was cleared out-of-band (its card
    /// left the table). called from inside the table boundary. if that
    /// broke a pending claim the claim is resolved as cancelled here,
    /// and true is returned so the caller can drop it from the queue.
    pub(crate) fn strip_token(&self) -> bool {
        self.sub_token();
        let mut pending = self.pending.lock().expect("seat gate poisoned");
        if *pending && self.token_count() < self.feature {
            *pending = false;
            // send before opening the gate so the verdict lands in the
            // inbox ahead of any press that was waiting on it
            let _ = self.tx.send(Signal::Verdict(Verdict::Cancelled));
            self.gate.notify_all();
            true
        } else {
            false
        }
    }

    /// release the worker from any wait, exactly once, for shutdown
    pub(crate) fn stop(&self) {
        self.halt.store(true, Ordering::Relaxed);
        let _gate = self.pending.lock().expect("seat gate poisoned");
        let _ = self.tx.send(Signal::Stop);
        self.gate.notify_all();
    }

    /// called from inside the table boundary when a token goes down.
    /// a player holding more than its budget means the toggle/claim
    /// protocol was broken somewhere, which is not recoverable.
    pub(crate) fn add_token(&self) {
        let before = self.tokens.fetch_add(1, Ordering::Relaxed);
        assert!(
            before < self.feature,
            "player {} exceeded its budget of {} tokens",
            self.id,
            self.feature,
        );
    }

    /// called from inside the table boundary when a token is lifted
    pub(crate) fn sub_token(&self) {
        let before = self.tokens.fetch_sub(1, Ordering::Relaxed);
        assert!(before > 0, "player {} lifted a token it never had", self.id);
    }

    fn resolve(&self, verdict: Verdict) {
        let mut pending = self.pending.lock().expect("seat gate poisoned");
        *pending = false;
        // send before opening the gate so the verdict lands in the
        // inbox ahead of any press that was waiting on it
        let _ = self.tx.send(Signal::Verdict(verdict));
        self.gate.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn point_scores_and_releases() {
        let (seat, inbox) = Seat::new(0, 3);
        seat.begin_claim();
        assert!(seat.is_pending());
        assert_eq!(seat.point(), 1);
        assert!(!seat.is_pending());
        assert_eq!(seat.score(), 1);
        assert_eq!(inbox.try_recv(), Ok(Signal::Verdict(Verdict::Point)));
    }

    #[test]
    fn stripping_below_budget_cancels_a_pending_claim() {
        let (seat, inbox) = Seat::new(4, 3);
        for _ in 0..3 {
            seat.add_token();
        }
        seat.begin_claim();
        assert!(seat.strip_token());
        assert!(!seat.is_pending());
        assert_eq!(seat.token_count(), 2);
        assert_eq!(inbox.try_recv(), Ok(Signal::Verdict(Verdict::Cancelled)));
        // further strips on an already-cancelled claim change nothing
        assert!(!seat.strip_token());
        assert!(inbox.try_recv().is_err());
    }

    #[test]
    fn stripping_without_a_claim_is_quiet() {
        let (seat, inbox) = Seat::new(1, 3);
        seat.add_token();
        assert!(!seat.strip_token());
        assert_eq!(seat.token_count(), 0);
        assert!(inbox.try_recv().is_err());
    }

    #[test]
    fn probe_blocks_until_the_claim_resolves() {
        let (seat, inbox) = Seat::new(0, 3);
        seat.begin_claim();
        let presser = {
            let seat = seat.clone();
            thread::spawn(move || seat.probe(9))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(inbox.try_recv().is_err()); // probe still gated
        seat.penalty();
        presser.join().unwrap();
        assert_eq!(inbox.recv(), Ok(Signal::Verdict(Verdict::Penalty)));
        assert_eq!(inbox.recv(), Ok(Signal::Probe(9)));
    }

    #[test]
    fn doze_serves_the_budget_unless_stopped() {
        let (seat, _inbox) = Seat::new(0, 3);
        let start = Instant::now();
        assert!(seat.doze(Duration::from_millis(60)));
        assert!(start.elapsed() >= Duration::from_millis(60));
        let dozer = {
            let seat = seat.clone();
            thread::spawn(move || seat.doze(Duration::from_secs(30)))
        };
        thread::sleep(Duration::from_millis(50));
        seat.stop();
        assert!(!dozer.join().unwrap());
    }
}

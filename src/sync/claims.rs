use super::FairGuard;
use super::FairLock;
use super::Priority;
use crate::PlayerId;
use crate::game::Seat;
use std::collections::VecDeque;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::Sender;
use std::sync::mpsc::channel;

/// the pending-claim queue: player ids awaiting adjudication, in
/// submission order, no duplicates, guarded by the dealer-priority
/// FairLock. every submission rings a bell the dealer sleeps on, so
/// adjudication latency is bounded by claim arrival rather than by the
/// countdown tick.
pub struct Claims {
    queue: FairLock<VecDeque<PlayerId>>,
    bell: Sender<()>,
}

impl Claims {
    /// the receiver end of the bell belongs to the dealer
    pub fn new() -> (Self, Receiver<()>) {
        let (bell, rung) = channel();
        let claims = Self {
            queue: FairLock::new(VecDeque::new()),
            bell,
        };
        (claims, rung)
    }

    /// enter a claim for this seat. idempotent: a seat already queued is
    /// left where it is. a seat whose tokens were stripped mid-flight is
    /// rejected, which keeps every queued claim backed by a full set of
    /// tokens (token stripping only ever happens under this same lock).
    pub fn submit(&self, seat: &Seat) -> bool {
        let mut queue = self.queue.lock(Priority::Back);
        if queue.contains(&seat.id()) {
            return false;
        }
        if !seat.completed() {
            return false;
        }
        seat.begin_claim();
        queue.push_back(seat.id());
        let _ = self.bell.send(());
        log::debug!("player {} claims a set", seat.id());
        true
    }

    /// take the queue with dealer priority, jumping every waiting
    /// claimant. dealer only.
    pub fn adjudicate(&self) -> FairGuard<'_, VecDeque<PlayerId>> {
        self.queue.lock(Priority::Front)
    }

    /// wake the dealer without submitting anything.
    /// used by the external stop switch.
    pub(crate) fn ring(&self) {
        let _ = self.bell.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_is_idempotent() {
        let (claims, rung) = Claims::new();
        let (seat, _inbox) = Seat::new(0, 3);
        for _ in 0..3 {
            seat.add_token();
        }
        assert!(claims.submit(&seat));
        assert!(!claims.submit(&seat));
        assert_eq!(claims.adjudicate().len(), 1);
        assert!(rung.try_recv().is_ok());
        assert!(rung.try_recv().is_err());
    }

    #[test]
    fn incomplete_seats_are_rejected() {
        let (claims, rung) = Claims::new();
        let (seat, _inbox) = Seat::new(0, 3);
        seat.add_token();
        assert!(!claims.submit(&seat));
        assert!(claims.adjudicate().is_empty());
        assert!(rung.try_recv().is_err());
        assert!(!seat.is_pending());
    }

    #[test]
    fn drains_in_submission_order() {
        let (claims, _rung) = Claims::new();
        let seats = (0..3)
            .map(|id| {
                let (seat, _inbox) = Seat::new(id, 0);
                seat
            })
            .collect::<Vec<_>>();
        for seat in &seats {
            assert!(claims.submit(seat));
        }
        let mut queue = claims.adjudicate();
        assert_eq!(queue.pop_front(), Some(0));
        assert_eq!(queue.pop_front(), Some(1));
        assert_eq!(queue.pop_front(), Some(2));
        assert_eq!(queue.pop_front(), None);
    }
}

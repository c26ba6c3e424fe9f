use std::cell::UnsafeCell;
use std::collections::VecDeque;
use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::Condvar;
use std::sync::Mutex;

/// where a caller enters the wait queue.
/// the dealer always goes to the front so a burst of claimants can
/// never starve adjudication; everyone else is served in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Front,
    Back,
}

/// queue-ordered mutual exclusion around a value.
///
/// a ticket is issued per acquisition and pushed to the front or back
/// of the wait queue; a waiter proceeds only once the lock is free and
/// its ticket heads the queue. release wakes every waiter to re-check
/// the head condition. there is no timeout and no reentrancy: a thread
/// must never lock twice without dropping its guard in between.
#[derive(Default)]
pub struct FairLock<T> {
    inner: Mutex<Inner>,
    woken: Condvar,
    value: UnsafeCell<T>,
}

#[derive(Debug, Default)]
struct Inner {
    held: bool,
    queue: VecDeque<usize>,
    next: usize,
}

// the value is only ever reachable through a FairGuard, and exactly one
// guard exists at a time, so sharing the cell across threads is sound.
unsafe impl<T: Send> Send for FairLock<T> {}
unsafe impl<T: Send> Sync for FairLock<T> {}

impl<T> FairLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            woken: Condvar::new(),
            value: UnsafeCell::new(value),
        }
    }

    /// block until this caller holds the lock.
    /// only one Front caller may exist (the dealer); two concurrent
    /// Front tickets would be served in reverse arrival order.
    pub fn lock(&self, priority: Priority) -> FairGuard<'_, T> {
        let mut inner = self.inner.lock().expect("fair lock poisoned");
        let ticket = inner.next;
        inner.next = inner.next.wrapping_add(1);
        match priority {
            Priority::Front => inner.queue.push_front(ticket),
            Priority::Back => inner.queue.push_back(ticket),
        }
        while inner.held || inner.queue.front() != Some(&ticket) {
            inner = self.woken.wait(inner).expect("fair lock poisoned");
        }
        inner.held = true;
        inner.queue.pop_front();
        FairGuard { lock: self }
    }
}

/// RAII witness of FairLock ownership. dropping it releases the lock
/// and wakes all waiters.
pub struct FairGuard<'a, T> {
    lock: &'a FairLock<T>,
}

impl<T> Deref for FairGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for FairGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for FairGuard<'_, T> {
    fn drop(&mut self) {
        let mut inner = self.lock.inner.lock().expect("fair lock poisoned");
        inner.held = false;
        self.lock.woken.notify_all();
    }
}

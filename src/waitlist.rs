use crossbeam_utils::{atomic::AtomicCell, CachePadded};
use slotmap::{DefaultKey, HopSlotMap};
use spin::RwLock;
use std::{fmt, task::Waker};

/// A ticket to a registered position in a [`Waitlist`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub(super) struct Slot(DefaultKey);

// Wakers don't fit a lock-free cell, boxing them does.
type Parked = AtomicCell<Option<Box<Waker>>>;

/// Tasks parked on one side of the channel, keyed by the slot each of them registered.
///
/// Registering and deregistering take the write lock, everything else only reads the map and
/// swaps wakers in and out of their cells.
#[derive(Default)]
pub(super) struct Waitlist {
    wakers: CachePadded<RwLock<HopSlotMap<DefaultKey, Parked>>>,
}

impl fmt::Debug for Waitlist {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Waitlist")
            .field("slots", &self.wakers.read().len())
            .finish()
    }
}

impl Waitlist {
    pub(super) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.wakers.read().len()
    }

    pub(super) fn register(&self) -> Slot {
        Slot(self.wakers.write().insert(Parked::default()))
    }

    /// Frees the slot, returning the waker unless a wakeup took it in the meantime.
    pub(super) fn deregister(&self, Slot(k): Slot) -> Option<Waker> {
        let parked = self.wakers.write().remove(k)?;
        parked.into_inner().map(|w| *w)
    }

    /// Parks a clone of `waker` in the slot, returning whatever was parked there before.
    pub(super) fn park(&self, Slot(k): Slot, waker: &Waker) -> Option<Waker> {
        let wakers = self.wakers.read();
        let prev = wakers.get(k)?.swap(Some(Box::new(waker.clone())));
        prev.map(|w| *w)
    }

    /// Wakes a task parked in any slot, returns whether there was one.
    pub(super) fn wake_one(&self) -> bool {
        let waker = self.wakers.read().values().find_map(AtomicCell::take);

        match waker {
            Some(w) => {
                w.wake();
                true
            }

            None => false,
        }
    }

    /// Wakes every task currently parked.
    pub(super) fn wake_all(&self) {
        let wakers: Vec<_> = self.wakers.read().values().filter_map(AtomicCell::take).collect();

        for w in wakers {
            w.wake();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::try_join_all;
    use futures::task::{waker, ArcWake};
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::{iter, sync::Arc};
    use test_strategy::proptest;
    use tokio::{runtime, task::spawn_blocking};

    #[derive(Debug, Default)]
    struct Count(AtomicUsize);

    impl Count {
        fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl ArcWake for Count {
        fn wake_by_ref(arc_self: &Arc<Self>) {
            arc_self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counted() -> (Arc<Count>, Waker) {
        let count = Arc::new(Count::default());
        (count.clone(), waker(count))
    }

    #[test]
    fn waitlist_starts_empty() {
        let waitlist = Waitlist::new();
        assert_eq!(waitlist.len(), 0);
        assert!(!waitlist.wake_one());
    }

    #[proptest]
    fn register_allocates_distinct_slots(#[strategy(1..=10usize)] n: usize) {
        let waitlist = Waitlist::new();

        let slots = iter::repeat_with(|| waitlist.register())
            .take(n)
            .collect::<BTreeSet<_>>();

        assert_eq!(slots.len(), n);
        assert_eq!(waitlist.len(), n);
    }

    #[test]
    fn deregister_returns_the_parked_waker() {
        let waitlist = Waitlist::new();
        let (count, w) = counted();

        let slot = waitlist.register();
        assert!(waitlist.park(slot, &w).is_none());

        let parked = waitlist.deregister(slot);
        assert!(parked.map_or(false, |p| p.will_wake(&w)));
        assert_eq!(count.get(), 0);
        assert_eq!(waitlist.len(), 0);
    }

    #[test]
    fn deregistered_slots_reject_wakers() {
        let waitlist = Waitlist::new();
        let (count, w) = counted();

        let slot = waitlist.register();
        assert!(waitlist.deregister(slot).is_none());
        assert!(waitlist.park(slot, &w).is_none());
        assert!(!waitlist.wake_one());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn park_replaces_the_previous_waker() {
        let waitlist = Waitlist::new();
        let (first, a) = counted();
        let (second, b) = counted();

        let slot = waitlist.register();
        assert!(waitlist.park(slot, &a).is_none());
        assert!(waitlist.park(slot, &b).map_or(false, |p| p.will_wake(&a)));

        assert!(waitlist.wake_one());
        assert_eq!((first.get(), second.get()), (0, 1));
        assert_eq!(waitlist.len(), 1);
    }

    #[proptest]
    fn wake_one_wakes_exactly_one_task(#[strategy(1..=10usize)] n: usize) {
        let waitlist = Waitlist::new();
        let (count, w) = counted();

        for _ in 0..n {
            let slot = waitlist.register();
            waitlist.park(slot, &w);
        }

        for i in 1..=n {
            assert!(waitlist.wake_one());
            assert_eq!(count.get(), i);
        }

        assert!(!waitlist.wake_one());
        assert_eq!(waitlist.len(), n);
    }

    #[proptest]
    fn wake_all_wakes_every_task(#[strategy(1..=10usize)] n: usize) {
        let waitlist = Waitlist::new();
        let (count, w) = counted();

        let slots: Vec<_> = iter::repeat_with(|| waitlist.register()).take(n).collect();

        for &slot in &slots {
            waitlist.park(slot, &w);
        }

        waitlist.wake_all();
        assert_eq!(count.get(), n);

        // Woken slots stay registered, but empty.
        assert!(slots.into_iter().all(|s| waitlist.deregister(s).is_none()));
    }

    #[proptest]
    fn every_park_is_either_woken_or_replaced(
        #[strategy(1..=10usize)] m: usize,
        #[strategy(1..=10usize)] n: usize,
    ) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let waitlist = Arc::new(Waitlist::new());
        let (count, w) = counted();

        let replaced = rt.block_on(async {
            try_join_all(iter::repeat(waitlist.clone()).take(m).map(|wl| {
                let w = w.clone();
                spawn_blocking(move || {
                    let slot = wl.register();
                    (0..n)
                        .filter(|_| {
                            let prev = wl.park(slot, &w).is_some();
                            wl.wake_one();
                            prev
                        })
                        .count()
                })
            }))
            .await
        })?;

        waitlist.wake_all();

        assert_eq!(count.get() + replaced.into_iter().sum::<usize>(), m * n);
    }
}

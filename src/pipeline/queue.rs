//! Bounded queue that never blocks the producer.
//!
//! Wraps an `embassy-sync` channel.  When the channel is full the oldest
//! entry is discarded to make room, so consumers always see the most
//! recent values and the engine never waits on a slow sink.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::warn;

/// Log the first drop, then every Nth.
const DROP_LOG_EVERY: u32 = 100;

pub struct DropOldest<T, const N: usize> {
    name: &'static str,
    channel: Channel<CriticalSectionRawMutex, T, N>,
    dropped: AtomicU32,
}

impl<T, const N: usize> DropOldest<T, N> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue without blocking.  Returns `true` if an entry was dropped.
    pub fn push(&self, item: T) -> bool {
        let item = match self.channel.try_send(item) {
            Ok(()) => return false,
            Err(TrySendError::Full(item)) => item,
        };

        // Evict the oldest and retry once.  Racing a consumer the eviction
        // can come up empty; racing another producer the retry can fail
        // and the new item goes instead.
        let evicted = self.channel.try_receive().is_ok();
        let stored = self.channel.try_send(item).is_ok();
        let lost = match (evicted, stored) {
            (true, true) => Lost::Oldest,
            (true, false) => Lost::Both,
            (false, false) => Lost::Newest,
            (false, true) => return false,
        };
        self.record_drop(lost);
        true
    }

    pub fn try_pop(&self) -> Option<T> {
        self.channel.try_receive().ok()
    }

    /// Wait for the next entry.
    pub async fn pop(&self) -> T {
        self.channel.receive().await
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Entries discarded since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn record_drop(&self, lost: Lost) {
        let n = lost.count();
        let before = self.dropped.fetch_add(n, Ordering::Relaxed);
        let total = before.wrapping_add(n);
        if before == 0 || before / DROP_LOG_EVERY != total / DROP_LOG_EVERY {
            warn!("{} queue full, dropped {} (total {})", self.name, lost.as_str(), total);
        }
    }
}

/// Which entries one contended push discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lost {
    Oldest,
    Newest,
    Both,
}

impl Lost {
    const fn count(self) -> u32 {
        match self {
            Self::Oldest | Self::Newest => 1,
            Self::Both => 2,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Oldest => "oldest",
            Self::Newest => "newest",
            Self::Both => "oldest and newest",
        }
    }
}

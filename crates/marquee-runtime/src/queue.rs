//! Bounded single-consumer queue that drops the oldest entry when full.
//!
//! Only the latest state matters, so a slow consumer loses stale events
//! rather than blocking the producer.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
    dropped: u64,
}

#[derive(Debug)]
pub struct EventQueue<T> {
    state: Mutex<QueueState<T>>,
    notify: Notify,
    capacity: usize,
}

impl<T> EventQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
                dropped: 0,
            }),
            notify: Notify::new(),
            capacity,
        }
    }

    /// Enqueue `item`. Returns `true` if an older item was evicted.
    pub fn push(&self, item: T) -> bool {
        let evicted = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let evicted = state.items.len() >= self.capacity;
            if evicted {
                state.items.pop_front();
                state.dropped += 1;
            }
            state.items.push_back(item);
            evicted
        };
        self.notify.notify_one();
        evicted
    }

    /// No more items will arrive. Pending items are still delivered.
    pub fn close(&self) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).closed = true;
        self.notify.notify_one();
    }

    /// Wait for the next item. `None` once closed and drained.
    pub async fn pop(&self) -> Option<T> {
        loop {
            {
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(item) = state.items.pop_front() {
                    return Some(item);
                }
                if state.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total items evicted so far.
    pub fn dropped(&self) -> u64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).dropped
    }
}

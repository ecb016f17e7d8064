//! Bounded FIFO task queue.
//!
//! Runs at most `max_concurrent` tasks at once and holds the rest in a
//! backlog of at most `max_depth` entries (pending + running). Tasks are
//! plain futures driven by the caller; the queue only hands out slots.

use crate::error::{MalError, Result};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Shared handle to a bounded task queue
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    max_depth: Option<usize>,
}

struct State {
    max_concurrent: usize,
    running: usize,
    pending: VecDeque<Waiter>,
    next_id: u64,
}

struct Waiter {
    id: u64,
    wake: oneshot::Sender<()>,
}

impl State {
    /// Hand free slots to waiters in admission order
    fn dispatch(&mut self) {
        while self.running < self.max_concurrent {
            let Some(waiter) = self.pending.pop_front() else {
                break;
            };
            self.running += 1;
            // The receiver lives inside the waiter's ticket, which removes
            // itself from `pending` before it can be dropped.
            let _ = waiter.wake.send(());
        }
    }
}

impl TaskQueue {
    /// Create a queue. `max_depth = None` means an unbounded backlog.
    pub fn new(max_concurrent: usize, max_depth: Option<usize>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    max_concurrent: max_concurrent.max(1),
                    running: 0,
                    pending: VecDeque::new(),
                    next_id: 0,
                }),
                max_depth,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock()
    }

    /// Tasks currently holding a slot
    pub fn running(&self) -> usize {
        self.lock().running
    }

    /// Tasks admitted but still waiting for a slot
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn max_concurrent(&self) -> usize {
        self.lock().max_concurrent
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.inner.max_depth
    }

    /// Whether upstream callers should hand over more work right now
    pub fn can_accept_more(&self) -> bool {
        let state = self.lock();
        state.running < state.max_concurrent && state.pending.len() < state.max_concurrent
    }

    /// Change the concurrency limit.
    ///
    /// Running tasks keep their slots; a lower limit only delays tasks that
    /// have not started yet, a higher one starts waiters immediately.
    pub fn resize(&self, max_concurrent: usize) {
        if max_concurrent == 0 {
            warn!("Queue concurrency of 0 requested, using 1");
        }
        let mut state = self.lock();
        let previous = state.max_concurrent;
        state.max_concurrent = max_concurrent.max(1);
        state.dispatch();
        info!(
            previous = previous,
            max_concurrent = state.max_concurrent,
            running = state.running,
            pending = state.pending.len(),
            "Queue concurrent size changed"
        );
    }

    /// Admit `task` for execution.
    ///
    /// Admission is decided now: a full queue returns `CapacityExceeded`
    /// without queueing anything. The returned future waits for a slot in
    /// FIFO order, then runs `task` to completion while holding the slot.
    pub fn enqueue<F>(&self, task: F) -> Result<impl Future<Output = F::Output>>
    where
        F: Future,
    {
        let mut ticket = self.admit()?;
        Ok(async move {
            ticket.wait().await;
            task.await
        })
    }

    fn admit(&self) -> Result<Ticket> {
        let mut state = self.lock();

        let occupied = state.running + state.pending.len();
        if let Some(max_depth) = self.inner.max_depth {
            if occupied >= max_depth {
                debug!(max_depth = max_depth, "Queue full, refusing task");
                return Err(MalError::capacity_exceeded(max_depth));
            }
        }

        if state.running < state.max_concurrent && state.pending.is_empty() {
            state.running += 1;
            return Ok(Ticket {
                inner: Arc::clone(&self.inner),
                slot: Slot::Running,
            });
        }

        let id = state.next_id;
        state.next_id += 1;
        let (wake, rx) = oneshot::channel();
        state.pending.push_back(Waiter { id, wake });

        Ok(Ticket {
            inner: Arc::clone(&self.inner),
            slot: Slot::Pending { id, rx },
        })
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        // Counters stay consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

enum Slot {
    Pending { id: u64, rx: oneshot::Receiver<()> },
    Running,
}

/// One admitted task's claim on the queue; releases it on drop
struct Ticket {
    inner: Arc<Inner>,
    slot: Slot,
}

impl Ticket {
    async fn wait(&mut self) {
        if let Slot::Pending { rx, .. } = &mut self.slot {
            // The sender is only dropped after a successful send
            let _ = rx.await;
            self.slot = Slot::Running;
        }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        match &self.slot {
            Slot::Pending { id, .. } => {
                let id = *id;
                if let Some(pos) = state.pending.iter().position(|w| w.id == id) {
                    // Abandoned before getting a slot
                    state.pending.remove(pos);
                    return;
                }
                // A slot was handed over but never observed
                state.running = state.running.saturating_sub(1);
            }
            Slot::Running => {
                state.running = state.running.saturating_sub(1);
            }
        }
        state.dispatch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_never_exceeds_concurrency() {
        let queue = TaskQueue::new(3, None);
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for i in 0..20 {
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            let fut = queue
                .enqueue(async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(5)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    i
                })
                .unwrap();
            tasks.push(fut);
        }

        assert_eq!(queue.running(), 3);
        assert_eq!(queue.pending(), 17);

        let results = futures::future::join_all(tasks).await;
        assert_eq!(results, (0..20).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(queue.running(), 0);
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_immediately() {
        let queue = TaskQueue::new(1, Some(2));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let first = queue
            .enqueue(async move {
                let _ = release_rx.await;
                "first"
            })
            .unwrap();
        let second = queue.enqueue(async { "second" }).unwrap();

        assert_eq!(queue.running(), 1);
        assert_eq!(queue.pending(), 1);

        let err = match queue.enqueue(async { "third" }) {
            Ok(_) => panic!("third task should be refused"),
            Err(e) => e,
        };
        assert_eq!(err.kind, ErrorKind::CapacityExceeded);
        assert_eq!(queue.running() + queue.pending(), 2);

        release_tx.send(()).unwrap();
        let (a, b) = tokio::join!(first, second);
        assert_eq!((a, b), ("first", "second"));

        // Room again once the backlog drained
        assert!(queue.enqueue(async { "fourth" }).is_ok());
    }

    #[tokio::test]
    async fn test_each_task_keeps_its_own_outcome() {
        let queue = TaskQueue::new(10, None);

        let tasks: Vec<_> = (0..10u64)
            .map(|i| {
                queue
                    .enqueue(async move {
                        // Reverse completion order
                        sleep(Duration::from_millis(20 - i)).await;
                        if i % 3 == 0 {
                            Err(format!("task {} failed", i))
                        } else {
                            Ok(i * 10)
                        }
                    })
                    .unwrap()
            })
            .collect();

        let results = futures::future::join_all(tasks).await;
        for (i, result) in results.into_iter().enumerate() {
            let i = i as u64;
            if i % 3 == 0 {
                assert_eq!(result, Err(format!("task {} failed", i)));
            } else {
                assert_eq!(result, Ok(i * 10));
            }
        }
    }

    #[tokio::test]
    async fn test_runs_in_admission_order() {
        let queue = TaskQueue::new(1, None);
        let order = Arc::new(Mutex::new(Vec::new()));

        let tasks: Vec<_> = (0..5)
            .map(|i| {
                let order = Arc::clone(&order);
                queue
                    .enqueue(async move {
                        order.lock().unwrap().push(i);
                        sleep(Duration::from_millis(1)).await;
                    })
                    .unwrap()
            })
            .collect();

        // Drive in reverse to show polling order does not matter
        let mut tasks = tasks;
        tasks.reverse();
        futures::future::join_all(tasks).await;

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_resize_down_keeps_running_tasks() {
        let queue = TaskQueue::new(3, None);
        let current = Arc::new(AtomicUsize::new(0));
        let late_peak = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = tokio::sync::watch::channel(false);

        let early: Vec<_> = (0..3)
            .map(|_| {
                let mut release_rx = release_rx.clone();
                queue
                    .enqueue(async move {
                        let _ = release_rx.wait_for(|released| *released).await;
                        "early"
                    })
                    .unwrap()
            })
            .collect();

        queue.resize(1);
        assert_eq!(queue.max_concurrent(), 1);
        assert_eq!(queue.running(), 3);

        let late: Vec<_> = (0..3)
            .map(|_| {
                let current = Arc::clone(&current);
                let late_peak = Arc::clone(&late_peak);
                queue
                    .enqueue(async move {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        late_peak.fetch_max(now, Ordering::SeqCst);
                        sleep(Duration::from_millis(5)).await;
                        current.fetch_sub(1, Ordering::SeqCst);
                        "late"
                    })
                    .unwrap()
            })
            .collect();
        assert_eq!(queue.pending(), 3);

        release_tx.send(true).unwrap();
        let (early, late) = tokio::join!(
            futures::future::join_all(early),
            futures::future::join_all(late)
        );

        assert_eq!(early, vec!["early"; 3]);
        assert_eq!(late, vec!["late"; 3]);
        assert_eq!(late_peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resize_up_starts_waiters() {
        let queue = TaskQueue::new(1, None);
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let blocker = queue
            .enqueue(async move {
                let _ = release_rx.await;
            })
            .unwrap();
        let waiter = queue.enqueue(async { 42 }).unwrap();
        assert_eq!(queue.pending(), 1);

        queue.resize(2);
        assert_eq!(queue.running(), 2);
        assert_eq!(queue.pending(), 0);

        // Finishes while the blocker still holds its slot
        assert_eq!(waiter.await, 42);
        release_tx.send(()).unwrap();
        blocker.await;
    }

    #[tokio::test]
    async fn test_dropped_tasks_release_bookkeeping() {
        let queue = TaskQueue::new(1, Some(3));

        let running = queue.enqueue(async { 1 }).unwrap();
        let waiting = queue.enqueue(async { 2 }).unwrap();
        assert_eq!(queue.running(), 1);
        assert_eq!(queue.pending(), 1);

        drop(waiting);
        assert_eq!(queue.pending(), 0);

        drop(running);
        assert_eq!(queue.running(), 0);
        assert!(queue.can_accept_more());
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let queue = TaskQueue::new(0, None);
        assert_eq!(queue.max_concurrent(), 1);
        queue.resize(0);
        assert_eq!(queue.max_concurrent(), 1);
    }
}

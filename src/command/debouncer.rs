// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Debounced command queue and update guard.

use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};

use crate::types::TargetState;

/// Raised while a command cycle is queued or running.
#[derive(Debug, Default)]
pub struct UpdateGuard(AtomicBool);

impl UpdateGuard {
    /// Creates a cleared guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the guard.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clears the guard.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Returns `true` while a command cycle owns the lock.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Creates a command queue sharing `guard`.
#[must_use]
pub fn command_channel(guard: Arc<UpdateGuard>, window: Duration) -> (CommandSender, Debouncer) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        CommandSender {
            tx,
            guard: Arc::clone(&guard),
        },
        Debouncer { rx, guard, window },
    )
}

/// Enqueue side of the command queue.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<TargetState>,
    guard: Arc<UpdateGuard>,
}

impl CommandSender {
    /// Queues a target and raises the guard. Never blocks.
    ///
    /// Returns `false` if the command loop has stopped.
    pub fn enqueue(&self, target: TargetState) -> bool {
        self.guard.raise();
        self.tx.send(target).is_ok()
    }
}

/// Receive side of the command queue, collapsing bursts of targets.
#[derive(Debug)]
pub struct Debouncer {
    rx: mpsc::UnboundedReceiver<TargetState>,
    guard: Arc<UpdateGuard>,
    window: Duration,
}

impl Debouncer {
    /// Waits for the next command to fire.
    ///
    /// The window starts at the first queued target and restarts on every
    /// later one; when it expires the latest target wins. A zero window
    /// fires the first target immediately. Returns `None` once every
    /// sender is gone and the queue is drained.
    ///
    /// The guard is raised for every target taken off the queue, so a
    /// cycle never runs with it cleared even if a sender raced
    /// [`finish_cycle`](Self::finish_cycle).
    pub async fn next(&mut self) -> Option<TargetState> {
        let mut latest = self.rx.recv().await?;
        self.guard.raise();
        if self.window.is_zero() {
            return Some(latest);
        }

        let mut deadline = pin!(sleep(self.window));
        loop {
            tokio::select! {
                () = &mut deadline => return Some(latest),
                next = self.rx.recv() => match next {
                    Some(target) => {
                        self.guard.raise();
                        tracing::debug!(%target, superseded = %latest, "Command re-armed");
                        latest = target;
                        deadline.as_mut().reset(Instant::now() + self.window);
                    }
                    None => return Some(latest),
                },
            }
        }
    }

    /// Ends a command cycle.
    ///
    /// The guard stays raised if another target was queued meanwhile.
    pub fn finish_cycle(&self) {
        self.guard.clear();
        if !self.rx.is_empty() {
            self.guard.raise();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(window: Duration) -> (Arc<UpdateGuard>, CommandSender, Debouncer) {
        let guard = Arc::new(UpdateGuard::new());
        let (tx, debouncer) = command_channel(Arc::clone(&guard), window);
        (guard, tx, debouncer)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_last_target() {
        let (_guard, tx, mut debouncer) = queue(Duration::from_secs(1));

        tx.enqueue(TargetState::Unlocked);
        tx.enqueue(TargetState::Locked);
        tx.enqueue(TargetState::Unlocked);

        assert_eq!(debouncer.next().await, Some(TargetState::Unlocked));
        assert!(debouncer.rx.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_extends_window() {
        let (_guard, tx, mut debouncer) = queue(Duration::from_secs(1));
        let start = Instant::now();

        tx.enqueue(TargetState::Unlocked);
        let late = tx.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(800)).await;
            late.enqueue(TargetState::Locked);
        });

        assert_eq!(debouncer.next().await, Some(TargetState::Locked));
        assert!(start.elapsed() >= Duration::from_millis(1800));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_window_fires_immediately_in_order() {
        let (_guard, tx, mut debouncer) = queue(Duration::ZERO);
        let start = Instant::now();

        tx.enqueue(TargetState::Unlocked);
        tx.enqueue(TargetState::Locked);

        assert_eq!(debouncer.next().await, Some(TargetState::Unlocked));
        assert_eq!(debouncer.next().await, Some(TargetState::Locked));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn guard_follows_cycle() {
        let (guard, tx, mut debouncer) = queue(Duration::ZERO);
        assert!(!guard.is_raised());

        tx.enqueue(TargetState::Locked);
        assert!(guard.is_raised());

        debouncer.next().await;
        debouncer.finish_cycle();
        assert!(!guard.is_raised());

        tx.enqueue(TargetState::Unlocked);
        tx.enqueue(TargetState::Locked);
        debouncer.next().await;
        debouncer.finish_cycle();
        assert!(guard.is_raised());
    }

    #[tokio::test]
    async fn target_sent_after_cycle_end_runs_guarded() {
        let (guard, tx, mut debouncer) = queue(Duration::ZERO);

        // Sender raises, the loop ends its cycle, then the target lands
        tx.guard.raise();
        debouncer.finish_cycle();
        assert!(!guard.is_raised());
        tx.tx.send(TargetState::Unlocked).unwrap();

        assert_eq!(debouncer.next().await, Some(TargetState::Unlocked));
        assert!(guard.is_raised());

        debouncer.finish_cycle();
        assert!(!guard.is_raised());
    }

    #[tokio::test(start_paused = true)]
    async fn received_target_raises_guard() {
        let (guard, tx, mut debouncer) = queue(Duration::from_secs(1));

        tx.tx.send(TargetState::Locked).unwrap();
        assert!(!guard.is_raised());

        assert_eq!(debouncer.next().await, Some(TargetState::Locked));
        assert!(guard.is_raised());
    }

    #[tokio::test]
    async fn closed_queue_ends() {
        let (_guard, tx, mut debouncer) = queue(Duration::from_secs(1));
        drop(tx);
        assert_eq!(debouncer.next().await, None);
    }
}

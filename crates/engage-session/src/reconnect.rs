// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellable delayed reconnect.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A reconnect scheduled to run after a fixed delay.
///
/// Cancelling before the delay elapses drops the reconnect. Once the delay
/// has elapsed the reconnect runs to completion.
#[derive(Debug)]
pub struct ReconnectHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ReconnectHandle {
    pub fn schedule<F>(delay: Duration, reconnect: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {}
                _ = tokio::time::sleep(delay) => reconnect.await,
            }
        });
        Self { token, task }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the reconnect is still waiting or running.
    pub fn is_pending(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }
}

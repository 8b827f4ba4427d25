// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Lifecycle of one direct-session connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Socket opening, credentials loaded.
    Initializing,
    /// A QR code was pushed and the device is not linked yet.
    AwaitingPairing,
    Connected,
    /// Closed for a recoverable reason; a reconnect is scheduled.
    Reconnecting,
    /// The device was unlinked. Credentials are gone.
    LoggedOut,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Initializing => write!(f, "initializing"),
            SessionState::AwaitingPairing => write!(f, "awaiting_pairing"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::Reconnecting => write!(f, "reconnecting"),
            SessionState::LoggedOut => write!(f, "logged_out"),
        }
    }
}

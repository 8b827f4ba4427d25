// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Direct-session transport used when no multi-device protocol backend is
//! linked into the build.
//!
//! Every open fails with a protocol error, so `session:connect` reports the
//! reason to the caller and startup reconnects are logged and skipped.
//! Official API connections are unaffected.

use async_trait::async_trait;
use engage_core::traits::transport::{OpenRequest, OpenedSocket, ProtocolVersion};
use engage_core::{DirectTransport, EngageError};

const UNAVAILABLE: &str = "no multi-device protocol backend is linked into this build";

#[derive(Debug, Default, Clone, Copy)]
pub struct UnlinkedTransport;

#[async_trait]
impl DirectTransport for UnlinkedTransport {
    async fn latest_version(&self) -> Result<ProtocolVersion, EngageError> {
        Err(EngageError::protocol(UNAVAILABLE))
    }

    async fn open(&self, request: OpenRequest) -> Result<OpenedSocket, EngageError> {
        Err(EngageError::protocol(format!(
            "cannot open {}: {UNAVAILABLE}",
            request.connection_id
        )))
    }
}

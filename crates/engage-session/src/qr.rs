// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pairing payload rendering.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use engage_core::EngageError;
use qrcode::QrCode;
use qrcode::render::svg;

const DATA_URI_PREFIX: &str = "data:image/svg+xml;base64,";

/// Renders a pairing payload as an SVG QR code inside a data URI.
pub fn qr_data_uri(payload: &str) -> Result<String, EngageError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| EngageError::Protocol {
        message: "cannot encode pairing payload as QR code".into(),
        source: Some(Box::new(e)),
    })?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(256, 256)
        .quiet_zone(true)
        .build();
    Ok(format!("{DATA_URI_PREFIX}{}", STANDARD.encode(image)))
}

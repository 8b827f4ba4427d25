// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloud API request and response bodies.

use serde::{Deserialize, Serialize};

const MESSAGING_PRODUCT: &str = "whatsapp";

#[derive(Debug, Clone, Serialize)]
pub struct TextBody<'a> {
    pub preview_url: bool,
    pub body: &'a str,
}

/// `POST /{phone_number_id}/messages` with `type = text`.
#[derive(Debug, Clone, Serialize)]
pub struct TextPayload<'a> {
    pub messaging_product: &'static str,
    pub recipient_type: &'static str,
    pub to: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: TextBody<'a>,
}

impl<'a> TextPayload<'a> {
    pub fn new(to: &'a str, body: &'a str) -> Self {
        Self {
            messaging_product: MESSAGING_PRODUCT,
            recipient_type: "individual",
            to,
            kind: "text",
            text: TextBody {
                preview_url: false,
                body,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateLanguage<'a> {
    pub code: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateBody<'a> {
    pub name: &'a str,
    pub language: TemplateLanguage<'a>,
    pub components: &'a [serde_json::Value],
}

/// `POST /{phone_number_id}/messages` with `type = template`.
#[derive(Debug, Clone, Serialize)]
pub struct TemplatePayload<'a> {
    pub messaging_product: &'static str,
    pub to: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub template: TemplateBody<'a>,
}

impl<'a> TemplatePayload<'a> {
    pub fn new(
        to: &'a str,
        name: &'a str,
        language_code: &'a str,
        components: &'a [serde_json::Value],
    ) -> Self {
        Self {
            messaging_product: MESSAGING_PRODUCT,
            to,
            kind: "template",
            template: TemplateBody {
                name,
                language: TemplateLanguage {
                    code: language_code,
                },
                components,
            },
        }
    }
}

/// Success body: `{"messages":[{"id":"wamid..."}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub messages: Vec<SentMessageId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentMessageId {
    pub id: String,
}

/// Error envelope: `{"error":{"message":..,"type":..,"code":..}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

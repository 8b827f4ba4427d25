// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Engage CRM.
//!
//! Holds the error taxonomy, the domain entities, and the port traits that
//! decouple the automation engine and the session manager from storage,
//! HTTP providers, the protocol library, and the real-time channel.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{EngageError, ErrorKind};
pub use traits::{
    AiAgent, CrmStore, DirectSocket, DirectTransport, MessageGateway, RealtimePublisher,
    company_room,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DisconnectReason;
    use crate::types::*;

    #[test]
    fn error_kinds_match_variants() {
        assert_eq!(
            EngageError::Config("x".into()).kind(),
            ErrorKind::Config
        );
        assert_eq!(EngageError::external("x").kind(), ErrorKind::TransientExternal);
        assert_eq!(EngageError::protocol("x").kind(), ErrorKind::Protocol);
        assert_eq!(
            EngageError::DataIntegrity("x".into()).kind(),
            ErrorKind::DataIntegrity
        );
        assert_eq!(
            EngageError::storage(std::io::Error::other("disk")).kind(),
            ErrorKind::Storage
        );
        assert_eq!(
            EngageError::SessionNotFound {
                connection_id: "c1".into()
            }
            .kind(),
            ErrorKind::SessionNotFound
        );
    }

    #[test]
    fn session_not_found_names_connection() {
        let err = EngageError::SessionNotFound {
            connection_id: "conn-9".into(),
        };
        assert!(err.to_string().contains("conn-9"));
    }

    #[test]
    fn protocol_status_codes_map_to_progression() {
        assert_eq!(MessageStatus::from_protocol_code(1), Some(MessageStatus::Sent));
        assert_eq!(
            MessageStatus::from_protocol_code(2),
            Some(MessageStatus::Delivered)
        );
        assert_eq!(MessageStatus::from_protocol_code(3), Some(MessageStatus::Read));
        for code in [0u8, 4, 5, 255] {
            assert_eq!(MessageStatus::from_protocol_code(code), None);
        }
    }

    #[test]
    fn status_never_regresses() {
        assert!(MessageStatus::Sent.can_advance_to(MessageStatus::Delivered));
        assert!(MessageStatus::Sent.can_advance_to(MessageStatus::Read));
        assert!(MessageStatus::Delivered.can_advance_to(MessageStatus::Read));
        assert!(!MessageStatus::Read.can_advance_to(MessageStatus::Delivered));
        assert!(!MessageStatus::Delivered.can_advance_to(MessageStatus::Delivered));
        assert!(!MessageStatus::Failed.can_advance_to(MessageStatus::Read));
        assert!(!MessageStatus::Received.can_advance_to(MessageStatus::Sent));
    }

    #[test]
    fn rule_scope_null_matches_every_connection() {
        let mut rule = AutomationRule {
            id: "r1".into(),
            company_id: "co".into(),
            name: "pricing".into(),
            trigger_event: TriggerEvent::NewMessageReceived,
            conditions: vec![],
            actions: vec![],
            connection_ids: None,
            is_active: true,
            created_at: timestamp_now(),
        };
        assert!(rule.applies_to_connection("any"));

        rule.connection_ids = Some(vec!["conn-a".into()]);
        assert!(rule.applies_to_connection("conn-a"));
        assert!(!rule.applies_to_connection("conn-b"));
    }

    #[test]
    fn conditions_deserialize_with_unknown_fallbacks() {
        let json = r#"[
            {"type": "message_content", "operator": "contains", "value": "preço"},
            {"type": "contact_tag", "operator": "equals", "value": "vip"},
            {"type": "weather", "operator": "sunny"}
        ]"#;
        let conditions: Vec<Condition> = serde_json::from_str(json).unwrap();
        assert_eq!(conditions[0].kind, ConditionType::MessageContent);
        assert_eq!(conditions[0].operator, ConditionOperator::Contains);
        assert_eq!(conditions[1].kind, ConditionType::ContactTag);
        assert_eq!(conditions[2].kind, ConditionType::Unknown);
        assert_eq!(conditions[2].operator, ConditionOperator::Unknown);
        assert_eq!(conditions[2].value, "");
    }

    #[test]
    fn actions_deserialize() {
        let json = r#"[{"type": "add_tag", "value": "tag_pricing_inquiry"},
                       {"type": "launch_rocket", "value": "now"}]"#;
        let actions: Vec<Action> = serde_json::from_str(json).unwrap();
        assert_eq!(actions[0].kind, ActionType::AddTag);
        assert_eq!(actions[1].kind, ActionType::Unknown);
    }

    #[test]
    fn only_logout_is_terminal() {
        assert!(DisconnectReason::from_status_code(401).is_terminal());
        for code in [408u16, 428, 440, 500, 515] {
            assert!(!DisconnectReason::from_status_code(code).is_terminal());
        }
    }

    #[test]
    fn enums_round_trip_through_strings() {
        use std::str::FromStr;
        assert_eq!(ProtocolMode::DirectSession.to_string(), "direct_session");
        assert_eq!(
            ProtocolMode::from_str("official_api").unwrap(),
            ProtocolMode::OfficialApi
        );
        assert_eq!(ConversationStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            TriggerEvent::NewMessageReceived.to_string(),
            "new_message_received"
        );
    }

    #[test]
    fn company_room_is_tenant_scoped() {
        assert_eq!(company_room("acme"), "company:acme");
        assert_ne!(company_room("acme"), company_room("globex"));
    }
}

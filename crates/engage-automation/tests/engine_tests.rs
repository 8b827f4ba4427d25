// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end trigger engine behavior against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use engage_automation::{ActionExecutor, AuditLogger, TriggerContext, TriggerEngine};
use engage_core::types::{
    Action, ActionType, AutomationRule, Condition, ConditionOperator, ConditionType, LogLevel,
    MessageStatus, NewMessage, ProtocolMode, SenderType,
};
use engage_core::{AiAgent, CrmStore};
use engage_test_utils::{AgentReply, MemoryStore, MockAgent, MockGateway, fixtures};

const PHONE: &str = "5511999990000";
const PACING: Duration = Duration::from_millis(1500);

struct Harness {
    store: Arc<MemoryStore>,
    gateway: Arc<MockGateway>,
    conversation_id: String,
    contact_id: String,
}

async fn harness(ai_active: bool, persona: Option<&str>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    store.insert_company(&fixtures::company("co1")).await.unwrap();
    let mut connection = fixtures::connection("conn1", "co1", ProtocolMode::OfficialApi);
    connection.ai_persona_id = persona.map(str::to_string);
    store.insert_connection(&connection).await.unwrap();

    let contact = store
        .find_or_create_contact("co1", PHONE, Some("Ana"))
        .await
        .unwrap();
    let conversation = store
        .find_or_create_conversation("co1", &contact.id, "conn1")
        .await
        .unwrap();
    store
        .set_conversation_ai_active(&conversation.id, ai_active)
        .await
        .unwrap();

    Harness {
        store,
        gateway: Arc::new(MockGateway::new()),
        conversation_id: conversation.id,
        contact_id: contact.id,
    }
}

impl Harness {
    async fn inbound(&self, text: &str) -> String {
        self.store
            .insert_message(&NewMessage {
                conversation_id: self.conversation_id.clone(),
                sender_type: SenderType::Contact,
                content: text.to_string(),
                status: MessageStatus::Received,
                provider_message_id: None,
            })
            .await
            .unwrap()
            .id
    }

    fn engine(&self, agent: Option<Arc<MockAgent>>) -> TriggerEngine {
        TriggerEngine::new(
            self.store.clone(),
            self.gateway.clone(),
            agent.map(|a| a as Arc<dyn AiAgent>),
            PACING,
        )
    }

    async fn trigger(&self, engine: &TriggerEngine, text: &str) {
        let message_id = self.inbound(text).await;
        engine
            .process_incoming_message_trigger(&self.conversation_id, &message_id)
            .await;
    }

    async fn add_rule(&self, rule: AutomationRule) {
        self.store.insert_rule(&rule).await.unwrap();
    }

    async fn log_messages(&self) -> Vec<String> {
        self.store
            .logs()
            .await
            .into_iter()
            .map(|l| l.message)
            .collect()
    }
}

fn contains(value: &str) -> Condition {
    fixtures::condition(ConditionType::MessageContent, ConditionOperator::Contains, value)
}

fn equals(value: &str) -> Condition {
    fixtures::condition(ConditionType::MessageContent, ConditionOperator::Equals, value)
}

fn act(kind: ActionType, value: &str) -> Action {
    fixtures::action(kind, value)
}

#[tokio::test]
async fn pricing_rule_tags_contact_once() {
    let h = harness(false, None).await;
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![contains("preço")],
        vec![act(ActionType::AddTag, "tag_pricing_inquiry")],
    ))
    .await;
    let engine = h.engine(None);

    h.trigger(&engine, "olá, gostaria de saber o preço do produto").await;

    assert_eq!(h.store.tags_of(&h.contact_id).await, vec!["tag_pricing_inquiry"]);
    assert_eq!(h.store.calls("add_contact_tag").await, 1);
    assert_eq!(h.gateway.attempts(), 0);

    let logs = h.store.logs().await;
    let matched: Vec<_> = logs
        .iter()
        .filter(|l| l.message.contains("matched"))
        .collect();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].rule_id.as_deref(), Some("r1"));
    assert!(logs.iter().any(|l| l.message == "Action 'add_tag' executed"));
}

#[tokio::test]
async fn non_matching_message_runs_nothing() {
    let h = harness(false, None).await;
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![contains("preço")],
        vec![act(ActionType::AddTag, "tag_pricing_inquiry")],
    ))
    .await;
    let engine = h.engine(None);

    h.trigger(&engine, "olá, tudo bem?").await;

    assert!(h.store.tags_of(&h.contact_id).await.is_empty());
    assert_eq!(h.store.calls("add_contact_tag").await, 0);
    assert_eq!(h.gateway.attempts(), 0);
    assert_eq!(h.log_messages().await, vec!["Evaluating 1 active rule(s)"]);
}

#[tokio::test]
async fn help_rule_sends_exact_text_to_contact() {
    let h = harness(false, None).await;
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![equals("ajuda")],
        vec![act(
            ActionType::SendMessage,
            "Olá! Um agente irá atendê-lo em breve.",
        )],
    ))
    .await;
    let engine = h.engine(None);

    h.trigger(&engine, "ajuda").await;

    let sent = h.gateway.sent_texts().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].connection_id, "conn1");
    assert_eq!(sent[0].to, PHONE);
    assert_eq!(sent[0].text, "Olá! Um agente irá atendê-lo em breve.");
}

#[tokio::test]
async fn actions_run_in_declaration_order() {
    let h = harness(false, None).await;
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![contains("cancelar")],
        vec![
            act(ActionType::AssignUser, "user-7"),
            act(ActionType::AddToList, "list_churn_risk"),
            act(ActionType::SendMessage, "Um especialista vai falar com você."),
            act(ActionType::AddTag, "tag_cancel"),
        ],
    ))
    .await;
    let engine = h.engine(None);

    h.trigger(&engine, "Quero CANCELAR meu plano").await;

    let executed: Vec<String> = h
        .store
        .logs()
        .await
        .into_iter()
        .filter_map(|l| l.details)
        .filter_map(|d| d.get("action").and_then(|a| a.as_str()).map(str::to_string))
        .collect();
    assert_eq!(
        executed,
        vec!["assign_user", "add_to_list", "send_message", "add_tag"]
    );

    let conversation = h
        .store
        .get_conversation(&h.conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(conversation.assigned_to.as_deref(), Some("user-7"));
    assert_eq!(h.store.lists_of(&h.contact_id).await, vec!["list_churn_risk"]);
    assert_eq!(h.gateway.sent_texts().await.len(), 1);
}

#[tokio::test]
async fn failed_send_does_not_stop_later_actions() {
    let h = harness(false, None).await;
    h.gateway.fail_with("recipient 5511999990000 is not a valid WhatsApp user").await;
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![contains("oi")],
        vec![
            act(ActionType::SendMessage, "Olá!"),
            act(ActionType::AddTag, "tag_greeting"),
        ],
    ))
    .await;
    let engine = h.engine(None);

    h.trigger(&engine, "oi").await;

    assert_eq!(h.gateway.attempts(), 1);
    assert_eq!(h.store.tags_of(&h.contact_id).await, vec!["tag_greeting"]);

    let logs = h.store.logs().await;
    let failure = logs
        .iter()
        .find(|l| l.level == LogLevel::Error)
        .expect("send failure should be audited");
    assert!(failure.message.starts_with("Action 'send_message' failed"));
    assert!(failure.message.contains("[REDACTED]"));
    assert!(!failure.message.contains(PHONE));
}

#[tokio::test]
async fn repeated_tag_is_not_an_error() {
    let h = harness(false, None).await;
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![contains("preço")],
        vec![act(ActionType::AddTag, "tag_pricing_inquiry")],
    ))
    .await;
    let engine = h.engine(None);

    h.trigger(&engine, "qual o preço?").await;
    h.trigger(&engine, "e o preço do anual?").await;

    assert_eq!(h.store.tags_of(&h.contact_id).await, vec!["tag_pricing_inquiry"]);
    let logs = h.store.logs().await;
    assert!(logs.iter().all(|l| l.level == LogLevel::Info));
    assert_eq!(
        logs.iter()
            .filter(|l| l.message == "Action 'add_tag' executed")
            .count(),
        2
    );
}

#[tokio::test]
async fn zero_rules_logs_no_active_rule() {
    let h = harness(false, None).await;
    let engine = h.engine(None);

    h.trigger(&engine, "olá").await;

    assert_eq!(h.store.rule_lookups(), 1);
    assert_eq!(
        h.log_messages().await,
        vec!["No active rule for new_message_received"]
    );
}

#[tokio::test]
async fn every_matching_rule_runs_in_store_order() {
    let h = harness(false, None).await;
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![contains("boleto")],
        vec![act(ActionType::AddTag, "tag_billing")],
    ))
    .await;
    h.add_rule(fixtures::rule(
        "r2",
        "co1",
        vec![contains("boleto"), contains("vencido")],
        vec![act(ActionType::AddTag, "tag_overdue")],
    ))
    .await;
    h.add_rule(fixtures::rule(
        "r3",
        "co1",
        vec![contains("boleto"), contains("pix")],
        vec![act(ActionType::AddTag, "tag_pix")],
    ))
    .await;
    let engine = h.engine(None);

    h.trigger(&engine, "meu boleto está vencido").await;

    let matched: Vec<_> = h
        .store
        .logs()
        .await
        .into_iter()
        .filter(|l| l.message.ends_with("matched"))
        .filter_map(|l| l.rule_id)
        .collect();
    assert_eq!(matched, vec!["r1", "r2"]);

    let mut tags = h.store.tags_of(&h.contact_id).await;
    tags.sort();
    assert_eq!(tags, vec!["tag_billing", "tag_overdue"]);
}

#[tokio::test]
async fn inactive_and_out_of_scope_rules_are_ignored() {
    let h = harness(false, None).await;
    let mut inactive = fixtures::rule(
        "r1",
        "co1",
        vec![contains("oi")],
        vec![act(ActionType::AddTag, "tag_inactive")],
    );
    inactive.is_active = false;
    let mut other_connection = fixtures::rule(
        "r2",
        "co1",
        vec![contains("oi")],
        vec![act(ActionType::AddTag, "tag_other")],
    );
    other_connection.connection_ids = Some(vec!["conn2".into()]);
    let mut scoped_here = fixtures::rule(
        "r3",
        "co1",
        vec![contains("oi")],
        vec![act(ActionType::AddTag, "tag_here")],
    );
    scoped_here.connection_ids = Some(vec!["conn2".into(), "conn1".into()]);
    let other_tenant = fixtures::rule(
        "r4",
        "co2",
        vec![contains("oi")],
        vec![act(ActionType::AddTag, "tag_foreign")],
    );
    for rule in [inactive, other_connection, scoped_here, other_tenant] {
        h.add_rule(rule).await;
    }
    let engine = h.engine(None);

    h.trigger(&engine, "oi").await;

    assert_eq!(h.store.tags_of(&h.contact_id).await, vec!["tag_here"]);
}

#[tokio::test]
async fn unimplemented_conditions_never_match() {
    let h = harness(false, None).await;
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![
            contains("oi"),
            fixtures::condition(ConditionType::ContactTag, ConditionOperator::Equals, "vip"),
        ],
        vec![act(ActionType::SendMessage, "Olá VIP!")],
    ))
    .await;
    let engine = h.engine(None);

    h.trigger(&engine, "oi").await;

    assert_eq!(h.gateway.attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn ai_reply_skips_rules_and_paces_paragraphs() {
    let h = harness(true, Some("persona-1")).await;
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![contains("horário")],
        vec![act(ActionType::AddTag, "tag_hours")],
    ))
    .await;
    let agent = Arc::new(MockAgent::with_replies([AgentReply::Text(
        "Olá, Ana!\n\nAtendemos das 9h às 18h.\n\nPosso ajudar em algo mais?".into(),
    )]));
    let engine = h.engine(Some(agent.clone()));

    let started = tokio::time::Instant::now();
    h.trigger(&engine, "qual o horário de atendimento?").await;
    let elapsed = started.elapsed();

    assert_eq!(h.store.rule_lookups(), 0);
    assert!(h.store.tags_of(&h.contact_id).await.is_empty());
    assert!(elapsed >= PACING * 2, "paragraphs sent too fast: {elapsed:?}");

    let texts: Vec<String> = h
        .gateway
        .sent_texts()
        .await
        .into_iter()
        .map(|t| t.text)
        .collect();
    assert_eq!(
        texts,
        vec![
            "Olá, Ana!",
            "Atendemos das 9h às 18h.",
            "Posso ajudar em algo mais?"
        ]
    );

    let ai_messages: Vec<_> = h
        .store
        .messages()
        .await
        .into_iter()
        .filter(|m| m.sender_type == SenderType::Ai)
        .collect();
    assert_eq!(ai_messages.len(), 3);
    assert!(ai_messages.iter().all(|m| m.status == MessageStatus::Sent));
    assert_eq!(
        ai_messages[0].provider_message_id.as_deref(),
        Some("wamid.mock-1")
    );

    let requests = agent.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].tenant_id, "co1");
    assert_eq!(requests[0].persona_id, "persona-1");
    assert_eq!(requests[0].contact_id, h.contact_id);
    assert_eq!(requests[0].context.conversation_id, h.conversation_id);
    assert_eq!(requests[0].message, "qual o horário de atendimento?");

    let conversation = h
        .store
        .get_conversation(&h.conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert!(conversation.last_message_at.is_some());
}

#[tokio::test]
async fn ai_inactive_conversation_runs_rules() {
    let h = harness(false, Some("persona-1")).await;
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![contains("oi")],
        vec![act(ActionType::AddTag, "tag_greeting")],
    ))
    .await;
    let agent = Arc::new(MockAgent::with_replies([AgentReply::Text("Olá!".into())]));
    let engine = h.engine(Some(agent.clone()));

    h.trigger(&engine, "oi").await;

    assert!(agent.requests().await.is_empty());
    assert_eq!(h.store.rule_lookups(), 1);
    assert_eq!(h.store.tags_of(&h.contact_id).await, vec!["tag_greeting"]);
}

#[tokio::test]
async fn connection_without_persona_runs_rules() {
    let h = harness(true, None).await;
    let agent = Arc::new(MockAgent::with_replies([AgentReply::Text("Olá!".into())]));
    let engine = h.engine(Some(agent.clone()));

    h.trigger(&engine, "oi").await;

    assert!(agent.requests().await.is_empty());
    assert_eq!(h.store.rule_lookups(), 1);
}

#[tokio::test]
async fn silent_or_unreachable_agent_falls_through_to_rules() {
    let h = harness(true, Some("persona-1")).await;
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![contains("oi")],
        vec![act(ActionType::AddTag, "tag_greeting")],
    ))
    .await;
    let agent = Arc::new(MockAgent::with_replies([
        AgentReply::Nothing,
        AgentReply::Unreachable("connect to agent at ana@example.com refused".into()),
    ]));
    let engine = h.engine(Some(agent.clone()));

    h.trigger(&engine, "oi").await;
    h.trigger(&engine, "oi de novo").await;

    assert_eq!(agent.requests().await.len(), 2);
    assert_eq!(h.store.rule_lookups(), 2);
    assert_eq!(h.gateway.attempts(), 0);

    let logs = h.store.logs().await;
    let agent_failure = logs
        .iter()
        .find(|l| l.message.starts_with("AI agent call failed"))
        .expect("agent failure should be audited");
    assert_eq!(agent_failure.level, LogLevel::Error);
    assert!(!agent_failure.message.contains("ana@example.com"));
}

#[tokio::test]
async fn no_agent_configured_runs_rules() {
    let h = harness(true, Some("persona-1")).await;
    let engine = h.engine(None);

    h.trigger(&engine, "oi").await;

    assert_eq!(h.store.rule_lookups(), 1);
}

#[tokio::test]
async fn failed_ai_send_falls_through_to_rules() {
    let h = harness(true, Some("persona-1")).await;
    h.gateway.fail_with("Cloud API returned 502 Bad Gateway").await;
    let agent = Arc::new(MockAgent::with_replies([AgentReply::Text("Olá!".into())]));
    let engine = h.engine(Some(agent));

    h.trigger(&engine, "oi").await;

    assert_eq!(h.gateway.attempts(), 1);
    assert_eq!(h.store.rule_lookups(), 1);
    assert!(
        h.store
            .messages()
            .await
            .iter()
            .all(|m| m.sender_type == SenderType::Contact)
    );
}

#[tokio::test]
async fn audit_store_failure_does_not_block_actions() {
    let h = harness(false, None).await;
    h.store.fail_audit_logs(true);
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![contains("oi")],
        vec![
            act(ActionType::AddTag, "tag_greeting"),
            act(ActionType::SendMessage, "Olá!"),
        ],
    ))
    .await;
    let engine = h.engine(None);

    h.trigger(&engine, "oi").await;

    assert_eq!(h.store.tags_of(&h.contact_id).await, vec!["tag_greeting"]);
    assert_eq!(h.gateway.sent_texts().await.len(), 1);
    assert!(h.store.logs().await.is_empty());
}

#[tokio::test]
async fn missing_conversation_aborts_quietly() {
    let h = harness(false, None).await;
    let engine = h.engine(None);

    engine
        .process_incoming_message_trigger("no-such-conversation", "no-such-message")
        .await;

    assert_eq!(h.store.rule_lookups(), 0);
    assert!(h.store.logs().await.is_empty());
}

#[tokio::test]
async fn missing_message_stops_before_rules_run() {
    let h = harness(false, None).await;
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![],
        vec![act(ActionType::AddTag, "tag_any")],
    ))
    .await;
    let engine = h.engine(None);

    engine
        .process_incoming_message_trigger(&h.conversation_id, "no-such-message")
        .await;

    assert!(h.store.tags_of(&h.contact_id).await.is_empty());
    let logs = h.store.logs().await;
    assert!(
        logs.iter()
            .any(|l| l.level == LogLevel::Error && l.message == "Triggering message not found")
    );
}

#[tokio::test]
async fn actions_are_skipped_without_a_connection() {
    let h = harness(false, None).await;
    let message_id = h.inbound("oi").await;

    let mut conversation = h
        .store
        .get_conversation(&h.conversation_id)
        .await
        .unwrap()
        .unwrap();
    conversation.connection_id = None;
    let ctx = TriggerContext {
        company_id: "co1".into(),
        conversation,
        connection: fixtures::connection("conn1", "co1", ProtocolMode::OfficialApi),
        contact: h.store.get_contact(&h.contact_id).await.unwrap().unwrap(),
        message: h.store.get_message(&message_id).await.unwrap().unwrap(),
    };
    let executor = ActionExecutor::new(
        h.store.clone(),
        h.gateway.clone(),
        AuditLogger::new(h.store.clone()),
    );
    let rule = fixtures::rule(
        "r1",
        "co1",
        vec![],
        vec![
            act(ActionType::SendMessage, "Olá!"),
            act(ActionType::AddTag, "tag_greeting"),
        ],
    );

    executor.execute_rule(&rule, &ctx).await;

    assert_eq!(h.gateway.attempts(), 0);
    assert!(h.store.tags_of(&h.contact_id).await.is_empty());
    let logs = h.store.logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].level, LogLevel::Warn);
}

#[tokio::test]
async fn unknown_action_is_audited_as_warning() {
    let h = harness(false, None).await;
    h.add_rule(fixtures::rule(
        "r1",
        "co1",
        vec![contains("oi")],
        vec![
            act(ActionType::Unknown, "webhook"),
            act(ActionType::AddTag, "tag_greeting"),
        ],
    ))
    .await;
    let engine = h.engine(None);

    h.trigger(&engine, "oi").await;

    let logs = h.store.logs().await;
    assert!(
        logs.iter()
            .any(|l| l.level == LogLevel::Warn && l.message == "Unsupported action type skipped")
    );
    assert_eq!(h.store.tags_of(&h.contact_id).await, vec!["tag_greeting"]);
}

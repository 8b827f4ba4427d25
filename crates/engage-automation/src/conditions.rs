// SPDX-FileCopyrightText: 2026 Engage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule condition evaluation. Unsupported conditions fail closed.

use engage_core::types::{Condition, ConditionOperator, ConditionType};
use tracing::warn;

use crate::context::TriggerContext;

/// Evaluates one condition against the triggering message.
pub fn check_condition(condition: &Condition, ctx: &TriggerContext) -> bool {
    match condition.kind {
        ConditionType::MessageContent => {
            match_text(condition.operator, ctx.message_text(), &condition.value)
        }
        ConditionType::ContactTag => {
            warn!(
                conversation_id = %ctx.conversation.id,
                "contact_tag conditions are not evaluated yet; treating as false"
            );
            false
        }
        ConditionType::Unknown => {
            warn!(conversation_id = %ctx.conversation.id, "unknown condition type; treating as false");
            false
        }
    }
}

/// True when every condition holds. Stops at the first false one.
pub fn all_conditions_hold(conditions: &[Condition], ctx: &TriggerContext) -> bool {
    conditions.iter().all(|c| check_condition(c, ctx))
}

/// Case-insensitive comparison of `text` against `expected`.
pub fn match_text(operator: ConditionOperator, text: &str, expected: &str) -> bool {
    let text = text.to_lowercase();
    let expected = expected.to_lowercase();
    match operator {
        ConditionOperator::Contains => text.contains(&expected),
        ConditionOperator::NotContains => !text.contains(&expected),
        ConditionOperator::Equals => text == expected,
        ConditionOperator::NotEquals => text != expected,
        ConditionOperator::Unknown => {
            warn!("unknown condition operator; treating as false");
            false
        }
    }
}

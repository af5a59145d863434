use dqbot_core::Turn;

use crate::ai_types::Message;
use crate::client::RetryPolicy;
use crate::prompts::system_prompt;
use std::time::Duration;

#[test]
fn test_message_from_turn_keeps_role() {
    let msg = Message::from(&Turn::system("schema"));
    assert_eq!(msg.role, "system");
    assert_eq!(msg.content, "schema");
}

#[test]
fn test_retry_delay_repeats_last() {
    let policy = RetryPolicy::new(5, vec![Duration::from_millis(5), Duration::from_millis(20)]);
    assert_eq!(policy.delay_before(1), Duration::from_millis(5));
    assert_eq!(policy.delay_before(2), Duration::from_millis(20));
    assert_eq!(policy.delay_before(4), Duration::from_millis(20));
}

#[test]
fn test_retry_none_has_zero_delay() {
    let policy = RetryPolicy::none();
    assert_eq!(policy.max_retries, 0);
    assert_eq!(policy.delay_before(1), Duration::ZERO);
}

#[test]
fn test_system_prompt_embeds_context() {
    let prompt = system_prompt("TABLE customers(id, email)", "Prefer CTEs.");
    assert!(prompt.contains("TABLE customers(id, email)"));
    assert!(prompt.contains("Prefer CTEs."));
    assert!(prompt.contains("'save test'"));
    assert!(prompt.contains("test_result"));
}

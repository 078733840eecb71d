//! Payload field precedence.
//!
//! Event payloads are open key-value data emitted by heterogeneous agent
//! runtimes, so the same fact arrives under different keys (`tool` vs
//! `name` vs `function`). Every consumer resolves those fields through the
//! precedence lists below; nothing else in the workspace sniffs payload
//! shapes directly.

use serde_json::Value;

/// Key precedence for a tool name.
pub const TOOL_NAME_KEYS: &[&str] = &["tool", "name", "function"];

/// Key precedence for a display label.
pub const LABEL_KEYS: &[&str] = &["name", "title", "label"];

/// Key precedence for prompt text.
pub const PROMPT_KEYS: &[&str] = &["prompt", "text", "message", "content"];

/// Key precedence for a session key.
pub const SESSION_KEYS: &[&str] = &["session_key", "session_id"];

/// Key precedence for an agent identifier inside a payload.
pub const AGENT_KEYS: &[&str] = &["agent_id", "agent"];

/// Key precedence for tool-call arguments.
pub const ARGUMENT_KEYS: &[&str] = &["arguments", "args", "input"];

/// Key precedence for a tool result value.
pub const RESULT_KEYS: &[&str] = &["result", "output"];

/// First string value found under `keys`, in order.
#[must_use]
pub fn first_str<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a str> {
    let map = payload.as_object()?;
    keys.iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
}

/// First value of any type found under `keys`, in order.
#[must_use]
pub fn first_value<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = payload.as_object()?;
    keys.iter().find_map(|key| map.get(*key))
}

/// Tool name, resolved through [`TOOL_NAME_KEYS`].
#[must_use]
pub fn tool_name(payload: &Value) -> Option<&str> {
    first_str(payload, TOOL_NAME_KEYS)
}

/// Display label, resolved through [`LABEL_KEYS`].
#[must_use]
pub fn label(payload: &Value) -> Option<&str> {
    first_str(payload, LABEL_KEYS)
}

/// Prompt text, resolved through [`PROMPT_KEYS`].
#[must_use]
pub fn prompt(payload: &Value) -> Option<&str> {
    first_str(payload, PROMPT_KEYS)
}

/// Session key, resolved through [`SESSION_KEYS`].
#[must_use]
pub fn session_key(payload: &Value) -> Option<&str> {
    first_str(payload, SESSION_KEYS)
}

/// Agent identifier, resolved through [`AGENT_KEYS`].
#[must_use]
pub fn agent_id(payload: &Value) -> Option<&str> {
    first_str(payload, AGENT_KEYS)
}

/// Explicit status string carried by the payload, if any.
#[must_use]
pub fn status(payload: &Value) -> Option<&str> {
    payload.as_object()?.get("status").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_name_precedence() {
        let payload = json!({"function": "f", "name": "n", "tool": "t"});
        assert_eq!(tool_name(&payload), Some("t"));
        let payload = json!({"function": "f", "name": "n"});
        assert_eq!(tool_name(&payload), Some("n"));
        let payload = json!({"function": "f"});
        assert_eq!(tool_name(&payload), Some("f"));
    }

    #[test]
    fn test_prompt_precedence() {
        let payload = json!({"content": "c", "text": "t"});
        assert_eq!(prompt(&payload), Some("t"));
    }

    #[test]
    fn test_non_object_payloads_resolve_to_none() {
        assert_eq!(tool_name(&json!("bare string")), None);
        assert_eq!(label(&json!(null)), None);
        assert_eq!(status(&json!(42)), None);
    }
}

//! Reading a model reply as a [`Proposal`]
//!
//! Replies follow a small JSON protocol:
//!
//! ```text
//! {"thought": "...", "action": {"name": "fetch_price_data", "arguments": {...}}}
//! {"thought": "...", "final_answer": "..."}
//! ```
//!
//! The object may sit in a ```` ```json ```` fence, a bare fence, or inline in
//! prose. A reply with no JSON object at all is taken as the final answer.

use crate::reasoner::Proposal;
use finagent_core::{Error, Result};
use regex::Regex;
use serde_json::{Map, Value};

const MAX_RAW_CHARS: usize = 500;

/// Compiled patterns for reply extraction
#[derive(Debug, Clone)]
pub struct ReplyParser {
    json_fence: Regex,
    any_fence: Regex,
    trailing_comma: Regex,
}

impl ReplyParser {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::internal(format!("invalid reply pattern: {e}")))
        };
        Ok(Self {
            json_fence: compile(r"(?s)```json\s*(\{.*?\})\s*```")?,
            any_fence: compile(r"(?s)```[a-zA-Z]*\s*(\{.*?\})\s*```")?,
            trailing_comma: compile(r",(\s*[}\]])")?,
        })
    }

    /// Interpret `reply`; never fails, unreadable actions become
    /// [`Proposal::Malformed`]
    pub fn parse(&self, reply: &str) -> Proposal {
        let reply = reply.trim();
        if reply.is_empty() {
            return malformed(reply, "empty reply");
        }

        let Some((candidate, prose)) = self.extract(reply) else {
            return Proposal::final_answer(reply);
        };

        let object = match self.decode(candidate) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return malformed(reply, "expected a JSON object"),
            Err(e) => return malformed(reply, &format!("invalid JSON: {e}")),
        };

        let thought = object
            .get("thought")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| (!prose.is_empty()).then(|| prose.to_string()));

        if let Some(action) = object.get("action") {
            return match read_action(action, &object) {
                Ok((name, arguments)) => Proposal::Action {
                    thought,
                    name,
                    arguments,
                },
                Err(reason) => malformed(reply, &reason),
            };
        }

        match object.get("final_answer") {
            Some(Value::String(text)) => Proposal::final_answer(text.trim()),
            Some(_) => malformed(reply, "'final_answer' must be a string"),
            None => malformed(reply, "object has neither 'action' nor 'final_answer'"),
        }
    }

    /// JSON candidate and the prose preceding it
    fn extract<'a>(&self, reply: &'a str) -> Option<(&'a str, &'a str)> {
        for fence in [&self.json_fence, &self.any_fence] {
            if let Some(caps) = fence.captures(reply) {
                let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                return Some((body.as_str(), reply[..whole.start()].trim()));
            }
        }

        let start = reply.find('{')?;
        let end = reply.rfind('}')?;
        (end > start).then(|| (&reply[start..=end], reply[..start].trim()))
    }

    fn decode(&self, candidate: &str) -> std::result::Result<Value, serde_json::Error> {
        serde_json::from_str(candidate).or_else(|first| {
            let relaxed = self.trailing_comma.replace_all(candidate, "$1");
            serde_json::from_str(&relaxed).map_err(|_| first)
        })
    }
}

/// Accepts `{"name", "arguments"}` objects and the flat
/// `"action": "<name>", "arguments": {...}` form
fn read_action(
    action: &Value,
    object: &Map<String, Value>,
) -> std::result::Result<(String, Map<String, Value>), String> {
    let (name, arguments) = match action {
        Value::Object(inner) => (inner.get("name"), inner.get("arguments")),
        Value::String(_) => (
            Some(action),
            object.get("arguments").or_else(|| object.get("action_input")),
        ),
        _ => return Err("'action' must be an object with 'name' and 'arguments'".to_string()),
    };

    let name = match name.and_then(Value::as_str).map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => return Err("action is missing a tool name".to_string()),
    };

    let arguments = match arguments {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err(format!("arguments of '{name}' must be a JSON object")),
    };

    Ok((name, arguments))
}

fn malformed(raw: &str, reason: &str) -> Proposal {
    let raw = if raw.chars().count() > MAX_RAW_CHARS {
        let cut: String = raw.chars().take(MAX_RAW_CHARS).collect();
        format!("{cut}...")
    } else {
        raw.to_string()
    };
    Proposal::Malformed {
        raw,
        reason: reason.to_string(),
    }
}

//! xAPI statement parsing
//!
//! Statements arrive as loosely-shaped JSON; these helpers pull out the
//! fields the aggregator cares about with the language-map fallbacks the
//! xAPI spec allows (`en-US`, then `en`, then the raw identifier).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed xAPI statement. Immutable once parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub object_id: String,
    pub object_name: String,
    /// Normalized lowercase verb display string
    pub verb: String,
    /// ISO-8601; the LRS emits canonical UTC offsets, so lexical order is
    /// chronological order
    pub timestamp: String,
    pub score_scaled: Option<f64>,
    pub parent_activity_id: Option<String>,
}

/// Human-readable verb name: `en-US` display, then `en`, then the last
/// segment of the verb id URI with its first letter upper-cased.
pub fn verb_name(verb: &Value) -> String {
    if let Some(name) = verb
        .get("display")
        .and_then(|d| d.get("en-US"))
        .and_then(Value::as_str)
    {
        return name.to_string();
    }
    if let Some(name) = verb
        .get("display")
        .and_then(|d| d.get("en"))
        .and_then(Value::as_str)
    {
        return name.to_string();
    }

    let id = verb.get("id").and_then(Value::as_str).unwrap_or_default();
    let last = id.rsplit('/').next().unwrap_or_default();
    let mut chars = last.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Human-readable object name: definition name `en-US`, then `en`, then the
/// object id itself.
pub fn object_name(object: &Value) -> String {
    let name = object.get("definition").and_then(|d| d.get("name"));
    if let Some(n) = name.and_then(|n| n.get("en-US")).and_then(Value::as_str) {
        return n.to_string();
    }
    if let Some(n) = name.and_then(|n| n.get("en")).and_then(Value::as_str) {
        return n.to_string();
    }
    object
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string()
}

/// Parent activity id from statement context: `contextActivities.parent[0]`,
/// falling back to `grouping[0]`.
pub fn parent_activity_id(statement: &Value) -> Option<String> {
    let context_activities = statement.get("context")?.get("contextActivities")?;
    for key in ["parent", "grouping"] {
        if let Some(id) = context_activities
            .get(key)
            .and_then(|p| p.get(0))
            .and_then(|p| p.get("id"))
            .and_then(Value::as_str)
        {
            return Some(id.to_string());
        }
    }
    None
}

impl Statement {
    /// Parse a raw statement. Missing fields degrade rather than fail:
    /// an absent object id becomes "unknown", an absent timestamp the
    /// empty string (which sorts earliest).
    pub fn from_json(raw: &Value) -> Self {
        let object = raw.get("object").cloned().unwrap_or(Value::Null);
        let verb = raw.get("verb").cloned().unwrap_or(Value::Null);

        Statement {
            object_id: object
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            object_name: object_name(&object),
            verb: verb_name(&verb).to_lowercase(),
            timestamp: raw
                .get("timestamp")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            score_scaled: raw
                .get("result")
                .and_then(|r| r.get("score"))
                .and_then(|s| s.get("scaled"))
                .and_then(Value::as_f64),
            parent_activity_id: parent_activity_id(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_verb_name_fallbacks() {
        assert_eq!(
            verb_name(&json!({"display": {"en-US": "passed"}})),
            "passed"
        );
        assert_eq!(verb_name(&json!({"display": {"en": "completed"}})), "completed");
        assert_eq!(
            verb_name(&json!({"id": "http://adlnet.gov/expapi/verbs/attempted"})),
            "Attempted"
        );
    }

    #[test]
    fn test_object_name_fallbacks() {
        assert_eq!(
            object_name(&json!({"definition": {"name": {"en-US": "Lab 3"}}})),
            "Lab 3"
        );
        assert_eq!(
            object_name(&json!({"definition": {"name": {"en": "Lab 3 EN"}}})),
            "Lab 3 EN"
        );
        assert_eq!(object_name(&json!({"id": "http://labs/lab-3"})), "http://labs/lab-3");
        assert_eq!(object_name(&json!({})), "Unknown");
    }

    #[test]
    fn test_parent_id_prefers_parent_over_grouping() {
        let stmt = json!({
            "context": {"contextActivities": {
                "parent": [{"id": "http://labs/lab-3"}],
                "grouping": [{"id": "http://labs/other"}]
            }}
        });
        assert_eq!(parent_activity_id(&stmt).as_deref(), Some("http://labs/lab-3"));

        let stmt = json!({
            "context": {"contextActivities": {
                "grouping": [{"id": "http://labs/group"}]
            }}
        });
        assert_eq!(parent_activity_id(&stmt).as_deref(), Some("http://labs/group"));

        assert_eq!(parent_activity_id(&json!({})), None);
    }

    #[test]
    fn test_from_json_full_statement() {
        let raw = json!({
            "object": {
                "id": "http://labs/lab-3/task-1",
                "definition": {"name": {"en-US": "Task 1"}}
            },
            "verb": {"display": {"en-US": "Passed"}},
            "timestamp": "2026-01-05T10:00:00Z",
            "result": {"score": {"scaled": 0.9}},
            "context": {"contextActivities": {"parent": [{"id": "http://labs/lab-3"}]}}
        });

        let stmt = Statement::from_json(&raw);
        assert_eq!(stmt.object_id, "http://labs/lab-3/task-1");
        assert_eq!(stmt.object_name, "Task 1");
        assert_eq!(stmt.verb, "passed");
        assert_eq!(stmt.score_scaled, Some(0.9));
        assert_eq!(stmt.parent_activity_id.as_deref(), Some("http://labs/lab-3"));
    }

    #[test]
    fn test_from_json_degrades_on_missing_fields() {
        let stmt = Statement::from_json(&json!({}));
        assert_eq!(stmt.object_id, "unknown");
        assert_eq!(stmt.timestamp, "");
        assert!(stmt.score_scaled.is_none());
        assert!(stmt.parent_activity_id.is_none());
    }
}

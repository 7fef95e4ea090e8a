//! Enabled predicates
//!
//! ```json
//! "enabled": true
//! "enabled": { "type": "condition", "value": "framework == 'react'" }
//! "enabled": { "type": "exec", "value": "command -v docker" }
//! ```

use serde::{Deserialize, Serialize};

/// An `enabled` predicate: literal or dynamic check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Enabled {
    Literal(bool),
    Check(EnabledCheck),
}

/// Dynamic predicate, evaluated against the run context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum EnabledCheck {
    /// Expression over context variables (see `expr`)
    Condition(String),
    /// Shell command; exit status 0 means enabled
    Exec(String),
}

impl Enabled {
    /// True only for the literal `false` (documents with it are skipped wholesale)
    pub fn is_literal_false(&self) -> bool {
        matches!(self, Enabled::Literal(false))
    }
}

impl From<bool> for Enabled {
    fn from(value: bool) -> Self {
        Enabled::Literal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_literal() {
        let e: Enabled = serde_json::from_value(json!(false)).unwrap();
        assert!(e.is_literal_false());
    }

    #[test]
    fn test_parse_condition() {
        let e: Enabled =
            serde_json::from_value(json!({"type": "condition", "value": "useTs"})).unwrap();
        assert_eq!(e, Enabled::Check(EnabledCheck::Condition("useTs".into())));
        assert!(!e.is_literal_false());
    }

    #[test]
    fn test_parse_exec() {
        let e: Enabled =
            serde_json::from_value(json!({"type": "exec", "value": "true"})).unwrap();
        assert_eq!(e, Enabled::Check(EnabledCheck::Exec("true".into())));
    }

    #[test]
    fn test_unknown_check_type_rejected() {
        let result: Result<Enabled, _> =
            serde_json::from_value(json!({"type": "script", "value": "x"}));
        assert!(result.is_err());
    }
}

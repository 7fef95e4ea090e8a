//! Template rendering - `{{ path }}` substitution
//!
//! Syntax: `{{ name }}`, `{{ name.field }}`, `{{ list.0 }}`.
//! Single pass, `Cow::Borrowed` when the text has no placeholders.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use smallvec::SmallVec;

use crate::error::{KilnError, Result};
use crate::expr;
use crate::runtime::RunContext;

/// Pre-compiled regex for `{{ name }}` or `{{ name.field.0 }}`
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_$][\w$]*(?:\.\w+)*)\s*\}\}").unwrap());

/// Renders template text against the run context
pub trait Renderer: Send + Sync {
    fn render<'a>(&self, template: &'a str, ctx: &RunContext) -> Result<Cow<'a, str>>;
}

/// Default renderer: strict placeholder interpolation
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpolator;

impl Renderer for Interpolator {
    fn render<'a>(&self, template: &'a str, ctx: &RunContext) -> Result<Cow<'a, str>> {
        interpolate(template, ctx)
    }
}

/// Replace every placeholder; unknown or null references fail
pub fn interpolate<'a>(template: &'a str, ctx: &RunContext) -> Result<Cow<'a, str>> {
    if !template.contains("{{") {
        return Ok(Cow::Borrowed(template));
    }

    let mut result = String::with_capacity(template.len() + 64);
    let mut last_end = 0;
    let mut missing: SmallVec<[String; 4]> = SmallVec::new();

    for cap in PLACEHOLDER_RE.captures_iter(template) {
        let Some(m) = cap.get(0) else { continue };
        let path = &cap[1];
        result.push_str(&template[last_end..m.start()]);
        last_end = m.end();

        let mut parts = path.split('.');
        let root = parts.next().unwrap_or(path);
        let Some(mut value) = ctx.get(root) else {
            missing.push(root.to_string());
            continue;
        };

        for segment in parts {
            let next = match segment.parse::<usize>() {
                Ok(idx) => value.get(idx),
                Err(_) => value.get(segment),
            };
            value = next.ok_or_else(|| KilnError::TemplateError {
                template: template.to_string(),
                reason: format!("'{}' has no field '{}'", path, segment),
            })?;
        }

        result.push_str(&value_to_string(value, path, template)?);
    }

    if !missing.is_empty() {
        return Err(KilnError::TemplateError {
            template: template.to_string(),
            reason: format!("undefined: {}", missing.join(", ")),
        });
    }

    result.push_str(&template[last_end..]);
    Ok(Cow::Owned(result))
}

/// Strict conversion: null is an error
fn value_to_string(value: &Value, path: &str, template: &str) -> Result<String> {
    match value {
        Value::Null => Err(KilnError::TemplateError {
            template: template.to_string(),
            reason: format!("'{}' is null", path),
        }),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(_) | Value::Number(_) => Ok(expr::display(value)),
        other => Ok(other.to_string()),
    }
}

/// Top-level names referenced by a template
pub fn extract_refs(template: &str) -> Vec<String> {
    PLACEHOLDER_RE
        .captures_iter(template)
        .filter_map(|cap| cap[1].split('.').next().map(str::to_string))
        .collect()
}

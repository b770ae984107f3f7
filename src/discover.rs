//! Finding placeholder keys in template text and checking authored
//! definitions.

use std::collections::HashSet;

use tracing::debug;

use crate::error::DefinitionError;
use crate::lexer::{tokenize, TokenKind};
use crate::value::VariableDefinition;

/// Keys referenced by variables and block conditions, deduplicated, in order
/// of first appearance. Works on templates that do not parse.
pub fn discover_keys(template: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for token in tokenize(template) {
        let found: Vec<&str> = match &token.kind {
            TokenKind::Variable(key) => vec![key.as_str()],
            TokenKind::BlockStart { condition, .. } => condition.keys(),
            _ => continue,
        };
        for key in found {
            if seen.insert(key.to_string()) {
                keys.push(key.to_string());
            }
        }
    }
    keys
}

/// `first_name` / `first-name` → `First Name`.
pub fn humanize_key(key: &str) -> String {
    key.split(['_', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Text definitions for keys the template uses that `existing` does not
/// define. Keys that would not be valid definition keys are skipped.
pub fn infer_definitions(template: &str, existing: &[VariableDefinition]) -> Vec<VariableDefinition> {
    let known: HashSet<&str> = existing.iter().map(|d| d.key.as_str()).collect();
    discover_keys(template)
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .filter_map(|key| {
            let label = humanize_key(&key);
            let def = VariableDefinition::new(key, label, Default::default());
            match def.validate() {
                Ok(()) => Some(def),
                Err(err) => {
                    debug!(error = %err, "skipping discovered key");
                    None
                }
            }
        })
        .collect()
}

/// Every key valid and unique.
pub fn validate_definitions(definitions: &[VariableDefinition]) -> Result<(), DefinitionError> {
    let mut seen = HashSet::new();
    for def in definitions {
        def.validate()?;
        if !seen.insert(def.key.as_str()) {
            return Err(DefinitionError::DuplicateKey(def.key.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::VariableType;

    #[test]
    fn keys_in_first_seen_order() {
        let keys = discover_keys(
            r#"{{#if (eq tone "formal")}}Dear {{name}}{{else}}Hi {{name}}{{/if}} {{#if (and a b)}}{{/if}}"#,
        );
        assert_eq!(keys, vec!["tone", "name", "a", "b"]);
    }

    #[test]
    fn discovery_tolerates_broken_templates() {
        assert_eq!(discover_keys("{{#if open}}{{x}}"), vec!["open", "x"]);
    }

    #[test]
    fn humanized_labels() {
        assert_eq!(humanize_key("first_name"), "First Name");
        assert_eq!(humanize_key("output-format"), "Output Format");
        assert_eq!(humanize_key("topic"), "Topic");
    }

    #[test]
    fn infers_only_missing_keys() {
        let existing = [VariableDefinition::new("name", "Name", VariableType::Text)];
        let long = "k".repeat(60);
        let template = format!("{{{{name}}}} {{{{audience}}}} {{{{{long}}}}}");
        let inferred = infer_definitions(&template, &existing);
        assert_eq!(inferred.len(), 1);
        assert_eq!(inferred[0].key, "audience");
        assert_eq!(inferred[0].label, "Audience");
        assert_eq!(inferred[0].kind, VariableType::Text);
    }

    #[test]
    fn duplicate_and_invalid_keys() {
        let defs = [VariableDefinition::text("a"), VariableDefinition::text("a")];
        assert_eq!(
            validate_definitions(&defs),
            Err(DefinitionError::DuplicateKey("a".into()))
        );
        let defs = [VariableDefinition::text("bad key")];
        assert_eq!(
            validate_definitions(&defs),
            Err(DefinitionError::InvalidKey("bad key".into()))
        );
        assert!(validate_definitions(&[VariableDefinition::text("ok")]).is_ok());
    }
}

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Flat variable map available to step templates.
pub type WorkflowVariables = HashMap<String, String>;

// Constant pattern; compilation cannot fail.
static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").ok());

/// Expands `{{name}}` placeholders against the provided variables.
///
/// A placeholder is `{{`, one or more ASCII word characters, then `}}`.
/// Placeholders naming unknown variables are kept verbatim. Substituted values
/// are not scanned again.
#[must_use]
pub fn substitute_variables(template: &str, variables: &WorkflowVariables) -> String {
    let Some(placeholder) = PLACEHOLDER.as_ref() else {
        return template.to_owned();
    };

    placeholder
        .replace_all(template, |caps: &Captures<'_>| {
            variables
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{WorkflowVariables, substitute_variables};

    fn variables(pairs: &[(&str, &str)]) -> WorkflowVariables {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn replaces_known_placeholders() {
        let vars = variables(&[("name", "Ada"), ("step_1_output", "42")]);
        assert_eq!(
            substitute_variables("Hi {{name}}, got {{step_1_output}}.", &vars),
            "Hi Ada, got 42."
        );
    }

    #[test]
    fn keeps_unknown_placeholders_verbatim() {
        assert_eq!(
            substitute_variables("{{missing}}", &WorkflowVariables::new()),
            "{{missing}}"
        );
    }

    #[test]
    fn ignores_non_word_placeholders() {
        let vars = variables(&[("a", "x")]);
        assert_eq!(substitute_variables("{{ a }} {{a-b}} {{}}", &vars), "{{ a }} {{a-b}} {{}}");
    }

    #[test]
    fn handles_extra_leading_brace() {
        let vars = variables(&[("a", "x")]);
        assert_eq!(substitute_variables("{{{a}}}", &vars), "{x}");
    }

    #[test]
    fn does_not_rescan_substituted_values() {
        let vars = variables(&[("a", "{{b}}"), ("b", "nope")]);
        assert_eq!(substitute_variables("{{a}}", &vars), "{{b}}");
    }

    #[test]
    fn non_ascii_names_are_not_placeholders() {
        let vars = variables(&[("a", "x")]);
        assert_eq!(
            substitute_variables("\u{e9}{{a}}\u{fc}{{\u{e9}}}{{", &vars),
            "\u{e9}x\u{fc}{{\u{e9}}}{{"
        );
    }

    #[test]
    fn unterminated_placeholder_is_left_alone() {
        let vars = variables(&[("a", "x")]);
        assert_eq!(substitute_variables("tail {{a", &vars), "tail {{a");
    }

    proptest! {
        #[test]
        fn text_without_braces_is_unchanged(text in "[^{}]*") {
            let vars = variables(&[("input", "value")]);
            prop_assert_eq!(substitute_variables(&text, &vars), text);
        }

        #[test]
        fn lone_placeholder_yields_its_value(key in "[A-Za-z0-9_]{1,16}", value in ".*") {
            let mut vars = WorkflowVariables::new();
            vars.insert(key.clone(), value.clone());
            prop_assert_eq!(substitute_variables(&format!("{{{{{key}}}}}"), &vars), value);
        }

        #[test]
        fn missing_placeholder_is_preserved(key in "[A-Za-z0-9_]{1,16}") {
            let template = format!("{{{{{key}}}}}");
            prop_assert_eq!(substitute_variables(&template, &WorkflowVariables::new()), template);
        }
    }
}

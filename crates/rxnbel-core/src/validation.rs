//! # Assertion Validation
//!
//! A pluggable check run on every synthesized assertion. Issues are logged
//! and never drop the assertion.
//!
//! The bundled [`StructuralValidator`] checks syntax only: balanced
//! parentheses and quotes, a non-empty subject, and that a relation always
//! comes with an object. Placeholder function names are reported as warnings.

use crate::term::Keyword;
use std::fmt;

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// One finding about one assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Validates a `(subject, relation, object)` triple.
pub trait AssertionValidator: Send + Sync {
    fn validate(
        &self,
        subject: &str,
        relation: Option<&str>,
        object: Option<&str>,
    ) -> Vec<ValidationIssue>;
}

/// Syntax-only validator.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralValidator;

const PLACEHOLDER_FUNCTIONS: &[Keyword] = &[Keyword::Polymer, Keyword::Missing];

impl StructuralValidator {
    fn check_term(role: &str, text: &str, issues: &mut Vec<ValidationIssue>) {
        let mut depth = 0i64;
        let mut in_quotes = false;
        let mut escaped = false;

        for c in text.chars() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' if in_quotes => escaped = true,
                '"' => in_quotes = !in_quotes,
                '(' if !in_quotes => depth = depth.saturating_add(1),
                ')' if !in_quotes => {
                    depth = depth.saturating_sub(1);
                    if depth < 0 {
                        issues.push(ValidationIssue::error(format!(
                            "{}: unexpected ')' in {}",
                            role, text
                        )));
                        return;
                    }
                }
                _ => {}
            }
        }

        if in_quotes {
            issues.push(ValidationIssue::error(format!(
                "{}: unterminated quote in {}",
                role, text
            )));
        }
        if depth != 0 {
            issues.push(ValidationIssue::error(format!(
                "{}: unbalanced parentheses in {}",
                role, text
            )));
        }

        for keyword in PLACEHOLDER_FUNCTIONS {
            if calls(text, keyword.as_str()) {
                issues.push(ValidationIssue::warning(format!(
                    "{}: placeholder function {} in {}",
                    role, keyword, text
                )));
            }
        }
    }
}

/// Whether `text` calls function `name` at any nesting level.
fn calls(text: &str, name: &str) -> bool {
    let call = format!("{}(", name);
    text.starts_with(&call)
        || text.contains(&format!("({}", call))
        || text.contains(&format!(" {}", call))
}

impl AssertionValidator for StructuralValidator {
    fn validate(
        &self,
        subject: &str,
        relation: Option<&str>,
        object: Option<&str>,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if subject.trim().is_empty() {
            issues.push(ValidationIssue::error("empty subject"));
        } else {
            Self::check_term("subject", subject, &mut issues);
        }

        match (relation, object) {
            (Some(_), Some(object)) => Self::check_term("object", object, &mut issues),
            (Some(relation), None) => issues.push(ValidationIssue::error(format!(
                "relation {} without object",
                relation
            ))),
            (None, Some(_)) => issues.push(ValidationIssue::error("object without relation")),
            (None, None) => {}
        }

        issues
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(issues: &[ValidationIssue]) -> usize {
        issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    #[test]
    fn well_formed_statement_passes() {
        let issues = StructuralValidator.validate(
            "activity(p(SP:P12345!ABC))",
            Some("directlyIncreases"),
            Some("rxn(reactants(a(CHEBI:15422!ATP)), products(a(CHEBI:16761!ADP)))"),
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn standalone_term_passes() {
        let issues =
            StructuralValidator.validate("tloc(p(SP:P1), fromLoc(GO:1), toLoc(GO:2))", None, None);
        assert!(issues.is_empty());
    }

    #[test]
    fn parentheses_inside_quotes_are_ignored() {
        let issues = StructuralValidator.validate("a(CHEBI:29108!\"calcium(2+\")", None, None);
        assert!(issues.is_empty());
    }

    #[test]
    fn unbalanced_text_is_an_error() {
        assert_eq!(errors(&StructuralValidator.validate("p(SP:P1", None, None)), 1);
        assert_eq!(errors(&StructuralValidator.validate("p(SP:P1))", None, None)), 1);
        assert_eq!(errors(&StructuralValidator.validate("p(SP:\"P1)", None, None)), 2);
    }

    #[test]
    fn relation_requires_object() {
        let issues = StructuralValidator.validate("p(SP:P1)", Some("increases"), None);
        assert_eq!(errors(&issues), 1);
        assert_eq!(errors(&StructuralValidator.validate(" ", None, None)), 1);
    }

    #[test]
    fn placeholder_functions_warn() {
        let issues = StructuralValidator.validate(
            "complex(FNTBDPolymer(REACTOME:R-HSA-1!x), p(SP:P1, pmod(Missing)))",
            None,
            None,
        );
        assert_eq!(errors(&issues), 0);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }
}

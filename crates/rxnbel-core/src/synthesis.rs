//! # Assertion Synthesizer
//!
//! Turns one reaction's resolved participants into ordered assertions.
//!
//! ## Order
//!
//! 1. Regulator -> catalyst links, one per (regulator, catalyst) pair.
//! 2. Subject -> target assertions: catalysts first, else regulators, else a
//!    standalone reaction or translocation target.
//!
//! ## Target Patterns
//!
//! Chemical abundances (keyword `a`) are ignored when classifying. One
//! remaining input and one remaining output can form a gene expression, a
//! modification or a translocation; everything else is a plain `rxn(...)`.

use crate::term::{Catalyst, Keyword, Regulator, Relation, Term};
use crate::validation::{AssertionValidator, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{error, warn};

/// Deduplicated participants of one reaction.
#[derive(Debug, Clone, Default)]
pub struct ReactionComponents {
    pub inputs: BTreeSet<Term>,
    pub outputs: BTreeSet<Term>,
    pub catalysts: BTreeSet<Catalyst>,
    pub regulators: BTreeSet<Regulator>,
}

/// Shape of a reaction's target term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    GeneExpression,
    Modification,
    Translocation,
    Reaction,
}

impl Pattern {
    /// Whether the target is emitted on its own when there is no subject.
    pub fn stands_alone(self) -> bool {
        matches!(self, Self::Reaction | Self::Translocation)
    }
}

/// The object of a reaction's subject assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub pattern: Pattern,
    pub text: String,
}

/// One synthesized statement. `relation` and `object` are absent for a
/// standalone target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<Relation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

impl Assertion {
    pub fn statement(
        subject: impl Into<String>,
        relation: Relation,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: Some(relation),
            object: Some(object.into()),
        }
    }

    pub fn standalone(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            relation: None,
            object: None,
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.relation, &self.object) {
            (Some(relation), Some(object)) => {
                write!(f, "{} {} {}", self.subject, relation, object)
            }
            _ => f.write_str(&self.subject),
        }
    }
}

/// Classify a reaction and build its target.
pub fn classify(inputs: &BTreeSet<Term>, outputs: &BTreeSet<Term>) -> Target {
    if let ([input], [output]) = (
        non_chemical(inputs).as_slice(),
        non_chemical(outputs).as_slice(),
    ) {
        if input.keyword() == Keyword::Gene && output.keyword() == Keyword::Protein {
            return Target {
                pattern: Pattern::GeneExpression,
                text: output.render().to_string(),
            };
        }
        if input.modifiers().is_empty() && !output.modifiers().is_empty() {
            return Target {
                pattern: Pattern::Modification,
                text: output.render().to_string(),
            };
        }
        if let (Some(from), Some(to)) = (input.location(), output.location()) {
            if from != to {
                return Target {
                    pattern: Pattern::Translocation,
                    text: format!(
                        "tloc({}, fromLoc({}), toLoc({}))",
                        input.render_stripped(),
                        from.render(),
                        to.render()
                    ),
                };
            }
        }
    }

    let joined = |terms: &BTreeSet<Term>| {
        terms
            .iter()
            .map(Term::render)
            .collect::<Vec<_>>()
            .join(", ")
    };
    Target {
        pattern: Pattern::Reaction,
        text: format!(
            "rxn(reactants({}), products({}))",
            joined(inputs),
            joined(outputs)
        ),
    }
}

fn non_chemical(terms: &BTreeSet<Term>) -> Vec<&Term> {
    terms
        .iter()
        .filter(|t| t.keyword() != Keyword::Abundance)
        .collect()
}

/// Builds and validates a reaction's assertions.
pub struct AssertionSynthesizer<'a> {
    validator: &'a dyn AssertionValidator,
}

impl<'a> AssertionSynthesizer<'a> {
    pub fn new(validator: &'a dyn AssertionValidator) -> Self {
        Self { validator }
    }

    /// All assertions for one reaction, links first.
    pub fn synthesize(&self, components: &ReactionComponents) -> Vec<Assertion> {
        let mut assertions = Vec::new();

        for regulator in &components.regulators {
            for catalyst in &components.catalysts {
                assertions.push(Assertion::statement(
                    regulator.node().render(),
                    regulator.relation(),
                    catalyst.node().render(),
                ));
            }
        }

        let target = classify(&components.inputs, &components.outputs);

        if !components.catalysts.is_empty() {
            for catalyst in &components.catalysts {
                assertions.push(Assertion::statement(
                    catalyst.node().render(),
                    catalyst.relation(),
                    target.text.clone(),
                ));
            }
        } else if !components.regulators.is_empty() {
            for regulator in &components.regulators {
                assertions.push(Assertion::statement(
                    regulator.node().render(),
                    regulator.relation(),
                    target.text.clone(),
                ));
            }
        } else if target.pattern.stands_alone() {
            assertions.push(Assertion::standalone(target.text));
        }

        for assertion in &assertions {
            self.check(assertion);
        }
        assertions
    }

    fn check(&self, assertion: &Assertion) {
        let relation = assertion.relation.map(Relation::as_str);
        let object = assertion.object.as_deref();
        let issues = self.validator.validate(&assertion.subject, relation, object);
        for issue in issues {
            match issue.severity {
                Severity::Error => {
                    error!(assertion = %assertion, issue = %issue.message, "invalid assertion")
                }
                Severity::Warning => {
                    warn!(assertion = %assertion, issue = %issue.message, "questionable assertion")
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

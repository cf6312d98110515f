//! # BEL Term Model
//!
//! Typed nodes produced by the resolver and consumed by the synthesizer:
//! - `Entity`, `Location` (namespaced references)
//! - `PMod`, `Variance` (modifiers attached to functions)
//! - `Function`, `Complex`, `EntitySet` (renderable terms)
//! - `Regulator`, `Catalyst` (a term plus a directional relation; only the
//!   term renders, the relation is joined in by the synthesizer)
//!
//! ## Canonical Text
//!
//! Every node renders to BEL text exactly once, at construction. Equality,
//! ordering and hashing of [`Term`] go through that cached text (plus the
//! relation, for regulators and catalysts), so sets of terms dedup and sort
//! deterministically no matter how they were reached.

use crate::canonical;
use crate::primitives::REACTOME_NAMESPACE;
use crate::types::{DbId, SourceIds};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// QUOTING
// =============================================================================

/// Quote a namespace id or label when BEL syntax requires it.
///
/// Text containing whitespace or any of `,()":!` is wrapped in double quotes
/// with inner quotes escaped. Already-quoted text passes through.
pub fn quote(text: &str) -> Cow<'_, str> {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        return Cow::Borrowed(text);
    }
    let needs_quotes = text
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, ',' | '(' | ')' | '"' | ':' | '!'));
    if needs_quotes {
        Cow::Owned(format!("\"{}\"", text.replace('"', "\\\"")))
    } else {
        Cow::Borrowed(text)
    }
}

/// Render `NS:id` or `NS:id!label`.
pub fn render_reference(namespace: &str, id: &str, label: &str) -> String {
    if label.is_empty() || label == id {
        format!("{}:{}", namespace, quote(id))
    } else {
        format!("{}:{}!{}", namespace, quote(id), quote(label))
    }
}

// =============================================================================
// LOCATION & ENTITY
// =============================================================================

/// Cellular location tag, e.g. `GO:0005829!cytosol`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub namespace: String,
    pub id: String,
    pub label: String,
}

impl Location {
    pub fn new(
        namespace: impl Into<String>,
        id: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
            label: label.into(),
        }
    }

    pub fn render(&self) -> String {
        render_reference(&self.namespace, &self.id, &self.label)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// A namespaced reference to a biological thing.
#[derive(Debug, Clone)]
pub struct Entity {
    pub namespace: String,
    pub id: String,
    pub label: String,
    pub source: SourceIds,
    pub location: Option<Location>,
}

impl Entity {
    pub fn render(&self) -> String {
        render_reference(&self.namespace, &self.id, &self.label)
    }
}

// =============================================================================
// KEYWORDS & RELATIONS
// =============================================================================

/// BEL function keyword of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Keyword {
    Protein,
    Gene,
    Rna,
    Abundance,
    Activity,
    Complex,
    /// Placeholder for polymers, which have no BEL function yet.
    Polymer,
    /// Set members disagree and no keyword could be inferred.
    Missing,
}

impl Keyword {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Protein => "p",
            Self::Gene => "g",
            Self::Rna => "r",
            Self::Abundance => "a",
            Self::Activity => "activity",
            Self::Complex => "complex",
            Self::Polymer => "FNTBDPolymer",
            Self::Missing => "MISSING",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relation between an assertion subject and object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "directlyIncreases")]
    DirectlyIncreases,
    #[serde(rename = "directlyDecreases")]
    DirectlyDecreases,
    #[serde(rename = "increases")]
    Increases,
    #[serde(rename = "regulates")]
    Regulates,
    #[serde(rename = "isA")]
    IsA,
}

impl Relation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DirectlyIncreases => "directlyIncreases",
            Self::DirectlyDecreases => "directlyDecreases",
            Self::Increases => "increases",
            Self::Regulates => "regulates",
            Self::IsA => "isA",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// MODIFIERS
// =============================================================================

/// Protein modification, rendered `pmod(code[, residue][, coordinate])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PMod {
    /// Modification code, e.g. `Ph` or `PSIMOD:00048`.
    pub code: String,
    /// Optional label appended as `code!label`.
    pub label: Option<String>,
    pub residue: Option<String>,
    pub coordinate: Option<i64>,
    /// Modification record this was derived from.
    pub source: DbId,
}

impl PMod {
    fn code_text(&self) -> String {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => format!("{}!{}", self.code, quote(label)),
            _ => self.code.clone(),
        }
    }

    /// Full rendering: `pmod(c)`, `pmod(c, r)` or `pmod(c, r-or-empty, n)`.
    pub fn render(&self) -> String {
        let code = self.code_text();
        let residue = self.residue.as_deref().filter(|r| !r.is_empty());
        match (residue, self.coordinate) {
            (residue, Some(coordinate)) => {
                format!("pmod({}, {}, {})", code, residue.unwrap_or(""), coordinate)
            }
            (Some(residue), None) => format!("pmod({}, {})", code, residue),
            (None, None) => format!("pmod({})", code),
        }
    }

    /// Code-only rendering used when aggregating across set members.
    pub fn render_mod_only(&self) -> String {
        format!("pmod({})", self.code_text())
    }
}

/// Sequence variant, rendered `var("p.<description>")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variance {
    pub description: String,
    pub source: DbId,
}

impl Variance {
    pub fn render(&self) -> String {
        format!("var(\"p.{}\")", self.description)
    }
}

/// A modifier attached to a function term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    PMod(PMod),
    Variance(Variance),
}

impl Modifier {
    pub fn render(&self) -> String {
        match self {
            Self::PMod(pmod) => pmod.render(),
            Self::Variance(var) => var.render(),
        }
    }

    pub fn render_mod_only(&self) -> String {
        match self {
            Self::PMod(pmod) => pmod.render_mod_only(),
            Self::Variance(var) => var.render(),
        }
    }
}

// =============================================================================
// FUNCTION
// =============================================================================

/// Parameter of a function term.
#[derive(Debug, Clone)]
pub enum Param {
    Entity(Entity),
    Term(Box<Term>),
}

impl Param {
    fn render(&self, strip_location: bool) -> String {
        match self {
            Self::Entity(entity) => entity.render(),
            Self::Term(term) if strip_location => term.render_stripped().to_string(),
            Self::Term(term) => term.render().to_string(),
        }
    }
}

/// A BEL function such as `p(...)`, `a(...)` or `activity(...)`.
#[derive(Debug, Clone)]
pub struct Function {
    keyword: Keyword,
    params: Vec<Param>,
    modifiers: Vec<Modifier>,
    location: Option<Location>,
    source: SourceIds,
    rendered: String,
    stripped: String,
}

impl Function {
    /// Build a function; modifiers are sorted by rendered text.
    pub fn new(
        keyword: Keyword,
        params: Vec<Param>,
        mut modifiers: Vec<Modifier>,
        location: Option<Location>,
        source: SourceIds,
    ) -> Self {
        modifiers.sort_by_cached_key(Modifier::render);
        let rendered = render_function(keyword, &params, &modifiers, location.as_ref(), false);
        let stripped = render_function(keyword, &params, &modifiers, None, true);
        Self {
            keyword,
            params,
            modifiers,
            location,
            source,
            rendered,
            stripped,
        }
    }

    /// Wrap a single entity, taking location and source ids from it.
    pub fn of_entity(keyword: Keyword, entity: Entity, modifiers: Vec<Modifier>) -> Self {
        let location = entity.location.clone();
        let source = entity.source.clone();
        Self::new(keyword, vec![Param::Entity(entity)], modifiers, location, source)
    }

    /// `activity(<term>)`
    pub fn activity(inner: Term) -> Self {
        let source = inner.source().clone();
        Self::new(
            Keyword::Activity,
            vec![Param::Term(Box::new(inner))],
            Vec::new(),
            None,
            source,
        )
    }

    pub fn keyword(&self) -> Keyword {
        self.keyword
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn source(&self) -> &SourceIds {
        &self.source
    }

    pub fn render(&self) -> &str {
        &self.rendered
    }

    /// Rendering without the trailing `loc(...)`.
    pub fn render_stripped(&self) -> &str {
        &self.stripped
    }
}

fn render_function(
    keyword: Keyword,
    params: &[Param],
    modifiers: &[Modifier],
    location: Option<&Location>,
    strip_location: bool,
) -> String {
    let mut parts: Vec<String> = params.iter().map(|p| p.render(strip_location)).collect();
    parts.extend(modifiers.iter().map(Modifier::render));
    if let Some(loc) = location {
        parts.push(format!("loc({})", loc.render()));
    }
    format!("{}({})", keyword, parts.join(", "))
}

// =============================================================================
// COMPLEX
// =============================================================================

/// A molecular complex. Nested complexes are flattened into leaf members.
#[derive(Debug, Clone)]
pub struct Complex {
    components: Vec<Term>,
    members: Vec<Term>,
    location: Option<Location>,
    label: String,
    source: SourceIds,
    rendered: String,
    stripped: String,
}

impl Complex {
    pub fn new(components: Vec<Term>, label: impl Into<String>, source: SourceIds) -> Self {
        let components = canonical::dedup_by_render(components);
        // Only direct Function members vote; nested complexes keep their own.
        let location = canonical::shared_location(
            components.iter().filter_map(|m| match m {
                Term::Function(f) => Some(f.location()),
                _ => None,
            }),
            source.db_id,
        );
        let members = canonical::flatten_members(&components);
        let rendered = canonical::render_complex(&members, location.as_ref());
        let stripped = canonical::render_complex(&members, None);
        Self {
            components,
            members,
            location,
            label: label.into(),
            source,
            rendered,
            stripped,
        }
    }

    /// Direct components as declared, possibly nested complexes.
    pub fn components(&self) -> &[Term] {
        &self.components
    }

    /// Flattened, deduplicated, sorted leaf members.
    pub fn members(&self) -> &[Term] {
        &self.members
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &SourceIds {
        &self.source
    }

    pub fn render(&self) -> &str {
        &self.rendered
    }

    pub fn render_stripped(&self) -> &str {
        &self.stripped
    }
}

// =============================================================================
// ENTITY SET
// =============================================================================

/// Subtype of an entity set, taken from the record's schema class.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SetKind {
    /// Mutually exclusive alternative fillers.
    Defined,
    /// Named alternatives rendered with explicit membership relations.
    Candidate,
    Other(String),
}

impl SetKind {
    pub fn from_schema_class(schema_class: &str) -> Self {
        match schema_class {
            "DefinedSet" => Self::Defined,
            "CandidateSet" => Self::Candidate,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A named set of alternative members, rendered as one atomic term.
#[derive(Debug, Clone)]
pub struct EntitySet {
    kind: SetKind,
    members: Vec<Term>,
    label: String,
    keyword: Keyword,
    location: Option<Location>,
    modifiers: Vec<Modifier>,
    source: SourceIds,
    reference: String,
    rendered: String,
    stripped: String,
}

impl EntitySet {
    pub fn new(
        kind: SetKind,
        members: Vec<Term>,
        label: impl Into<String>,
        source: SourceIds,
    ) -> Self {
        let label = label.into();
        let members = canonical::dedup_by_render(members);
        let keyword = canonical::infer_set_keyword(&members, source.db_id);
        let location = canonical::shared_location(
            members.iter().filter_map(|m| match m {
                Term::Function(f) => Some(f.location()),
                _ => None,
            }),
            source.db_id,
        );
        let modifiers = canonical::merge_modifiers(&members);
        let reference = render_reference(REACTOME_NAMESPACE, &source.st_id_version, &label);
        let rendered = render_set(keyword, &reference, &modifiers, location.as_ref());
        let stripped = render_set(keyword, &reference, &modifiers, None);
        Self {
            kind,
            members,
            label,
            keyword,
            location,
            modifiers,
            source,
            reference,
            rendered,
            stripped,
        }
    }

    pub fn kind(&self) -> &SetKind {
        &self.kind
    }

    pub fn members(&self) -> &[Term] {
        &self.members
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn keyword(&self) -> Keyword {
        self.keyword
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn source(&self) -> &SourceIds {
        &self.source
    }

    /// Bare `REACTOME:<id>!<label>` reference.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn render(&self) -> &str {
        &self.rendered
    }

    pub fn render_stripped(&self) -> &str {
        &self.stripped
    }
}

fn render_set(
    keyword: Keyword,
    reference: &str,
    modifiers: &[Modifier],
    location: Option<&Location>,
) -> String {
    let mut parts = vec![reference.to_string()];
    parts.extend(modifiers.iter().map(Modifier::render_mod_only));
    if let Some(loc) = location {
        parts.push(format!("loc({})", loc.render()));
    }
    format!("{}({})", keyword, parts.join(", "))
}

// =============================================================================
// REGULATOR & CATALYST
// =============================================================================

/// A term that regulates a reaction, paired with its relation.
#[derive(Debug, Clone)]
pub struct Regulator {
    node: Box<Term>,
    relation: Relation,
    source: SourceIds,
}

impl Regulator {
    pub fn new(node: Term, relation: Relation, source: SourceIds) -> Self {
        Self {
            node: Box::new(node),
            relation,
            source,
        }
    }

    pub fn node(&self) -> &Term {
        &self.node
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn source(&self) -> &SourceIds {
        &self.source
    }
}

/// A term that catalyses a reaction. The relation is always `directlyIncreases`.
#[derive(Debug, Clone)]
pub struct Catalyst {
    node: Box<Term>,
    source: SourceIds,
}

impl Catalyst {
    pub const RELATION: Relation = Relation::DirectlyIncreases;

    pub fn new(node: Term, source: SourceIds) -> Self {
        Self {
            node: Box::new(node),
            source,
        }
    }

    pub fn node(&self) -> &Term {
        &self.node
    }

    pub fn relation(&self) -> Relation {
        Self::RELATION
    }

    pub fn source(&self) -> &SourceIds {
        &self.source
    }
}

// =============================================================================
// TERM
// =============================================================================

/// Any node the resolver can produce.
#[derive(Debug, Clone)]
pub enum Term {
    Function(Function),
    Complex(Complex),
    Set(EntitySet),
    Regulator(Regulator),
    Catalyst(Catalyst),
}

impl Term {
    /// Canonical text. Stable for the lifetime of the node.
    ///
    /// Regulators and catalysts render their node only.
    pub fn render(&self) -> &str {
        match self {
            Self::Function(f) => f.render(),
            Self::Complex(c) => c.render(),
            Self::Set(s) => s.render(),
            Self::Regulator(r) => r.node().render(),
            Self::Catalyst(c) => c.node().render(),
        }
    }

    /// Relation carried by a regulator or catalyst.
    pub fn relation(&self) -> Option<Relation> {
        match self {
            Self::Regulator(r) => Some(r.relation()),
            Self::Catalyst(c) => Some(c.relation()),
            Self::Function(_) | Self::Complex(_) | Self::Set(_) => None,
        }
    }

    fn sort_key(&self) -> (&str, Option<Relation>) {
        (self.render(), self.relation())
    }

    pub fn render_stripped(&self) -> &str {
        match self {
            Self::Function(f) => f.render_stripped(),
            Self::Complex(c) => c.render_stripped(),
            Self::Set(s) => s.render_stripped(),
            Self::Regulator(r) => r.node().render_stripped(),
            Self::Catalyst(c) => c.node().render_stripped(),
        }
    }

    /// Rendering inside `complex(...)`: locations dropped, and a set whose
    /// keyword is `complex` collapses to its bare reference.
    pub fn render_as_member(&self) -> &str {
        match self {
            Self::Set(s) if s.keyword() == Keyword::Complex => s.reference(),
            other => other.render_stripped(),
        }
    }

    pub fn keyword(&self) -> Keyword {
        match self {
            Self::Function(f) => f.keyword(),
            Self::Complex(_) => Keyword::Complex,
            Self::Set(s) => s.keyword(),
            Self::Regulator(r) => r.node().keyword(),
            Self::Catalyst(c) => c.node().keyword(),
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::Function(f) => f.location(),
            Self::Complex(c) => c.location(),
            Self::Set(s) => s.location(),
            Self::Regulator(r) => r.node().location(),
            Self::Catalyst(c) => c.node().location(),
        }
    }

    pub fn modifiers(&self) -> &[Modifier] {
        match self {
            Self::Function(f) => f.modifiers(),
            Self::Set(s) => s.modifiers(),
            Self::Complex(_) | Self::Regulator(_) | Self::Catalyst(_) => &[],
        }
    }

    pub fn source(&self) -> &SourceIds {
        match self {
            Self::Function(f) => f.source(),
            Self::Complex(c) => c.source(),
            Self::Set(s) => s.source(),
            Self::Regulator(r) => r.source(),
            Self::Catalyst(c) => c.source(),
        }
    }

    /// Wrap in `activity(...)` unless the term is a chemical abundance.
    pub fn into_activity(self) -> Self {
        if self.keyword() == Keyword::Abundance {
            self
        } else {
            Self::Function(Function::activity(self))
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render())
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for Term {}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}

macro_rules! node_ord {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.cmp(other) == Ordering::Equal
            }
        }

        impl Eq for $ty {}

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> Ordering {
                self.node
                    .render()
                    .cmp(other.node.render())
                    .then_with(|| self.relation().cmp(&other.relation()))
            }
        }
    };
}

node_ord!(Regulator);
node_ord!(Catalyst);

// =============================================================================
// TESTS
// =============================================================================

//! Free-text name filters for customer search
//!
//! A query such as `"John  Mith"` is split into lower-cased search tokens
//! (`["john", "mith"]`), each of which becomes a case-insensitive
//! "name contains token" predicate. The predicates are combined with a
//! configurable [`Combinator`]. The resulting [`NameFilter`] can be
//! evaluated in memory or rendered as a parameterized SQL condition.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single lower-cased, non-blank search term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchToken(String);

impl SearchToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How individual token predicates are joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// Logical OR: a name matching any token is included.
    #[default]
    Any,
    /// Logical AND: a name must contain every token.
    All,
}

/// What a query with no usable tokens evaluates to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum EmptyQueryPolicy {
    #[default]
    MatchNothing,
    MatchEverything,
    /// Callers using [`PredicateBuilder::try_build`] get
    /// [`ValidationError::EmptySearchQuery`].
    Reject,
}

/// Split a free-text query into search tokens.
///
/// Every whitespace character counts as a separator. Tokens are
/// lower-cased and de-duplicated, keeping the first occurrence's position.
pub fn tokenize(query: &str) -> Vec<SearchToken> {
    let mut tokens: Vec<SearchToken> = Vec::new();
    for raw in query.split(char::is_whitespace) {
        if raw.is_empty() {
            continue;
        }
        let token = SearchToken(raw.to_lowercase());
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

// ============================================================================
// NAME FILTER
// ============================================================================

/// A parameterized SQL boolean expression.
///
/// Placeholders are numbered from the offset passed to
/// [`NameFilter::to_sql`]; `params` lines up with them in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlCondition {
    pub clause: String,
    pub params: Vec<String>,
}

/// Compiled name predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFilter {
    tokens: Vec<SearchToken>,
    combinator: Combinator,
    on_empty: EmptyQueryPolicy,
}

impl NameFilter {
    pub fn tokens(&self) -> &[SearchToken] {
        &self.tokens
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// True when the query produced no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn matches_when_empty(&self) -> bool {
        matches!(self.on_empty, EmptyQueryPolicy::MatchEverything)
    }

    /// Evaluate the filter against a single name.
    pub fn matches(&self, name: &str) -> bool {
        if self.tokens.is_empty() {
            return self.matches_when_empty();
        }
        let lowered = name.to_lowercase();
        match self.combinator {
            Combinator::Any => self.tokens.iter().any(|t| lowered.contains(t.as_str())),
            Combinator::All => self.tokens.iter().all(|t| lowered.contains(t.as_str())),
        }
    }

    /// Render as a SQL condition over `column`.
    ///
    /// `column` is interpolated as-is and must be a trusted identifier.
    /// Token text only ever travels as a bound parameter, with LIKE
    /// metacharacters escaped.
    pub fn to_sql(&self, column: &str, first_param: usize) -> SqlCondition {
        if self.tokens.is_empty() {
            let clause = if self.matches_when_empty() { "TRUE" } else { "FALSE" };
            return SqlCondition {
                clause: clause.to_string(),
                params: Vec::new(),
            };
        }

        let joiner = match self.combinator {
            Combinator::Any => " OR ",
            Combinator::All => " AND ",
        };
        let parts: Vec<String> = (0..self.tokens.len())
            .map(|i| format!("lower({}) LIKE ${} ESCAPE '\\'", column, first_param + i))
            .collect();
        let params = self
            .tokens
            .iter()
            .map(|t| format!("%{}%", escape_like(t.as_str())))
            .collect();

        SqlCondition {
            clause: format!("({})", parts.join(joiner)),
            params,
        }
    }
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds [`NameFilter`]s from free-text queries under a fixed policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredicateBuilder {
    pub combinator: Combinator,
    pub empty_policy: EmptyQueryPolicy,
}

impl PredicateBuilder {
    pub fn new(combinator: Combinator, empty_policy: EmptyQueryPolicy) -> Self {
        Self {
            combinator,
            empty_policy,
        }
    }

    /// Build a filter. Never fails; under [`EmptyQueryPolicy::Reject`] an
    /// empty query yields a filter that matches nothing.
    pub fn build_name_filter(&self, query: &str) -> NameFilter {
        NameFilter {
            tokens: tokenize(query),
            combinator: self.combinator,
            on_empty: self.empty_policy,
        }
    }

    /// Like [`build_name_filter`](Self::build_name_filter), but an empty
    /// query is an error when the policy is [`EmptyQueryPolicy::Reject`].
    pub fn try_build(&self, query: &str) -> Result<NameFilter, ValidationError> {
        let filter = self.build_name_filter(query);
        if filter.is_empty() && self.empty_policy == EmptyQueryPolicy::Reject {
            return Err(ValidationError::EmptySearchQuery);
        }
        Ok(filter)
    }
}

//! WHERE clause builders for the two search paths.

use persondb_core::criteria::{AttributePath, CriteriaSet, MatchMode};
use rusqlite::types::Value;

use crate::schema::UNICODE_LOWER;

/// Columns a free-text term is matched against.
const FREE_TEXT_COLUMNS: [&str; 3] = ["name", "country", "city"];

/// A SQL fragment (empty, or starting with ` WHERE`) and its bound parameters.
#[derive(Debug, Default, PartialEq)]
pub struct WhereClause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl WhereClause {
    fn from_parts(parts: Vec<String>, params: Vec<Value>) -> Self {
        if parts.is_empty() {
            return Self::default();
        }
        Self { sql: format!(" WHERE {}", parts.join(" AND ")), params }
    }
}

fn column(path: AttributePath) -> &'static str {
    match path {
        AttributePath::Name => "name",
        AttributePath::AddressCountry => "country",
        AttributePath::AddressCity => "city",
    }
}

/// `ulower(column) LIKE ?`, to be bound to a [`contains_pattern`].
fn contains_predicate(column: &str) -> String {
    format!("{UNICODE_LOWER}({column}) LIKE ? ESCAPE '\\'")
}

/// Lowercased `%value%` with LIKE metacharacters escaped, so the value
/// matches literally.
pub fn contains_pattern(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('%');
    for ch in value.to_lowercase().chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

/// Every whitespace-separated term must appear in at least one of name,
/// country or city. A blank or absent query matches everything.
pub fn free_text(query: Option<&str>) -> WhereClause {
    let mut parts = Vec::new();
    let mut params = Vec::new();
    for term in query.unwrap_or_default().split_whitespace() {
        let pattern = contains_pattern(term);
        let ors: Vec<String> = FREE_TEXT_COLUMNS
            .iter()
            .map(|c| contains_predicate(c))
            .collect();
        parts.push(format!("({})", ors.join(" OR ")));
        params.extend(FREE_TEXT_COLUMNS.iter().map(|_| Value::Text(pattern.clone())));
    }
    WhereClause::from_parts(parts, params)
}

/// AND of all criteria. An empty set yields no WHERE clause at all.
pub fn criteria(set: &CriteriaSet) -> WhereClause {
    let mut parts = Vec::with_capacity(set.len());
    let mut params = Vec::with_capacity(set.len());
    for c in set {
        match c.mode {
            MatchMode::ContainsIgnoreCase => {
                parts.push(contains_predicate(column(c.path)));
                params.push(Value::Text(contains_pattern(&c.value)));
            }
        }
    }
    WhereClause::from_parts(parts, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_criteria_has_no_where() {
        assert_eq!(criteria(&CriteriaSet::new()), WhereClause::default());
    }

    #[test]
    fn criteria_are_anded_in_order() {
        let set = CriteriaSet::new()
            .contains(AttributePath::Name, Some("joe"))
            .contains(AttributePath::AddressCity, Some("Paris"));
        let w = criteria(&set);
        assert_eq!(w.sql, " WHERE ulower(name) LIKE ? ESCAPE '\\' AND ulower(city) LIKE ? ESCAPE '\\'");
        assert_eq!(w.params, vec![Value::Text("%joe%".into()), Value::Text("%paris%".into())]);
    }

    #[test]
    fn wildcards_in_values_are_escaped() {
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn patterns_are_lowercased_beyond_ascii() {
        assert_eq!(contains_pattern("ÉMILE"), "%émile%");
    }

    #[test]
    fn blank_free_text_matches_all() {
        assert_eq!(free_text(Some("   ")), WhereClause::default());
        assert_eq!(free_text(None), WhereClause::default());
    }

    #[test]
    fn each_free_text_term_binds_every_column() {
        let w = free_text(Some("joe paris"));
        assert_eq!(w.params.len(), 6);
        assert_eq!(w.sql.matches(" AND ").count(), 1);
    }
}

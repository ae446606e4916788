//! Structured search predicates.
//!
//! A [`CriteriaSet`] is an ordered list of [`SearchCriterion`] combined with
//! logical AND. Record stores translate it into their native query language.

use std::fmt;

/// Attribute paths a criterion can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributePath {
    Name,
    AddressCountry,
    AddressCity,
}

impl AttributePath {
    /// Dotted path as exposed to clients (`address.country`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            AttributePath::Name => "name",
            AttributePath::AddressCountry => "address.country",
            AttributePath::AddressCity => "address.city",
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Case-insensitive substring match.
    ContainsIgnoreCase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriterion {
    pub path: AttributePath,
    pub mode: MatchMode,
    pub value: String,
}

impl SearchCriterion {
    pub fn contains_ignore_case(path: AttributePath, value: impl Into<String>) -> Self {
        Self { path, mode: MatchMode::ContainsIgnoreCase, value: value.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaSet {
    criteria: Vec<SearchCriterion>,
}

impl CriteriaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a case-insensitive substring predicate when `value` is present.
    /// An absent value adds nothing.
    #[must_use]
    pub fn contains(mut self, path: AttributePath, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.criteria.push(SearchCriterion::contains_ignore_case(path, value));
        }
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchCriterion> {
        self.criteria.iter()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl<'a> IntoIterator for &'a CriteriaSet {
    type Item = &'a SearchCriterion;
    type IntoIter = std::slice::Iter<'a, SearchCriterion>;

    fn into_iter(self) -> Self::IntoIter {
        self.criteria.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_values_are_omitted() {
        let set = CriteriaSet::new()
            .contains(AttributePath::Name, None)
            .contains(AttributePath::AddressCountry, Some("France"))
            .contains(AttributePath::AddressCity, None);
        assert_eq!(set.len(), 1);
        let only = set.iter().next().expect("one criterion");
        assert_eq!(only.path, AttributePath::AddressCountry);
        assert_eq!(only.value, "France");
    }

    #[test]
    fn order_is_preserved() {
        let set = CriteriaSet::new()
            .contains(AttributePath::AddressCity, Some("Paris"))
            .contains(AttributePath::Name, Some("joe"));
        let paths: Vec<_> = set.iter().map(|c| c.path).collect();
        assert_eq!(paths, vec![AttributePath::AddressCity, AttributePath::Name]);
    }
}

use crate::criteria::CriteriaSet;
use crate::types::{IndexPage, Person};

/// Canonical relational store. Source of truth for identity.
///
/// All reads and writes go through a [`RecordSession`], which holds the store
/// exclusively from `begin_transaction` until it is dropped. Sessions are not
/// reentrant; prefer [`crate::transaction::TransactionScope`] over opening
/// them directly.
pub trait RecordStore: Send + Sync {
    type Session<'a>: RecordSession
    where
        Self: 'a;

    /// Blocks until no other session holds the store, then opens a transaction.
    fn begin_transaction(&self) -> anyhow::Result<Self::Session<'_>>;
}

/// One open transaction on a [`RecordStore`].
pub trait RecordSession {
    fn commit(&mut self) -> anyhow::Result<()>;

    fn get_by_reference(&self, reference: &str) -> anyhow::Result<Option<Person>>;
    /// Inserts when `person.id` is absent, updates otherwise. Returns the
    /// stored person carrying its identity.
    fn save(&self, person: &Person) -> anyhow::Result<Person>;
    fn delete(&self, person: &Person) -> anyhow::Result<()>;

    fn count_like_free_text(&self, query: Option<&str>) -> anyhow::Result<u64>;
    fn find_like_free_text(&self, query: Option<&str>, from: usize, size: usize) -> anyhow::Result<Vec<Person>>;
    fn count_with_criteria(&self, criteria: &CriteriaSet) -> anyhow::Result<u64>;
    fn find_with_criteria(&self, criteria: &CriteriaSet, from: usize, size: usize) -> anyhow::Result<Vec<Person>>;
}

/// Search index holding a denormalized copy of each person, keyed by reference.
pub trait IndexGateway: Send + Sync {
    /// Upsert by reference: indexing the same reference twice leaves one document.
    fn index(&self, person: &Person) -> anyhow::Result<()>;
    fn delete(&self, reference: &str) -> anyhow::Result<()>;
    fn search(&self, query: Option<&str>, from: usize, size: usize) -> anyhow::Result<IndexPage>;

    fn index_all(&self, people: &[Person]) -> anyhow::Result<()> {
        for p in people {
            self.index(p)?;
        }
        Ok(())
    }
}

/// Copies fields present on `source` onto `target`, leaving the others untouched.
pub trait FieldCopier: Send + Sync {
    fn copy_onto(&self, source: &Person, target: &mut Person);
}

pub trait PersonGenerator: Send + Sync {
    fn generate(&self) -> anyhow::Result<Person>;
}

use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;

use persondb_core::criteria::{AttributePath, CriteriaSet};
use persondb_core::response::{build_response, SearchResponse};
use persondb_core::traits::{FieldCopier, IndexGateway, PersonGenerator, RecordSession, RecordStore};
use persondb_core::transaction::{in_transaction, TransactionScope};
use persondb_core::types::Person;

/// Reference and name given to the first person created by [`PersonService::init`].
pub const FIXTURE_REFERENCE: &str = "0";
pub const FIXTURE_NAME: &str = "Joe Smith";

/// Keeps the record store and the search index aligned for people.
///
/// The record store is written first and owns identity; the index follows,
/// keyed by reference. Each public operation runs inside exactly one
/// transactional scope on the record store.
pub struct PersonService<S, I>
where
    S: RecordStore,
    I: IndexGateway,
{
    store: S,
    index: I,
    copier: Box<dyn FieldCopier>,
    generator: Box<dyn PersonGenerator>,
}

impl<S, I> PersonService<S, I>
where
    S: RecordStore,
    I: IndexGateway,
{
    pub fn new(store: S, index: I, copier: Box<dyn FieldCopier>, generator: Box<dyn PersonGenerator>) -> Self {
        Self { store, index, copier, generator }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn get(&self, reference: &str) -> Result<Option<Person>> {
        let person = in_transaction(&self.store, |s| s.get_by_reference(reference))?;
        tracing::debug!(reference, found = person.is_some(), "get");
        Ok(person)
    }

    pub fn save(&self, person: &Person) -> Result<Person> {
        let saved = in_transaction(&self.store, |s| s.save(person))?;
        self.index.index(&saved)?;
        Ok(saved)
    }

    /// Merges `incoming` onto the person stored under `reference`, or creates
    /// it. The stored reference is always `reference`, whatever the payload says.
    pub fn upsert(&self, reference: &str, incoming: Person) -> Result<Person> {
        let mut person = match self.get(reference)? {
            Some(mut existing) => {
                self.copier.copy_onto(&incoming, &mut existing);
                existing
            }
            // Identity comes from the record store only.
            None => Person { id: None, ..incoming },
        };
        person.reference = Some(reference.to_string());
        self.save(&person)
    }

    /// Returns `false` when nothing is stored under `reference`.
    pub fn delete(&self, reference: &str) -> Result<bool> {
        tracing::debug!(reference, "delete");
        let deleted = in_transaction(&self.store, |s| match s.get_by_reference(reference)? {
            Some(person) => s.delete(&person).map(|()| true),
            None => Ok(false),
        })?;
        if !deleted {
            tracing::debug!(reference, "person does not exist");
            return Ok(false);
        }
        self.index.delete(reference)?;
        tracing::debug!(reference, "person deleted");
        Ok(true)
    }

    /// Free-text search against the record store.
    ///
    /// `country` and `date` are accepted for client compatibility but do not
    /// narrow the result. `Ok(None)` means the response could not be serialized.
    pub fn search(
        &self,
        query: Option<&str>,
        country: Option<&str>,
        date: Option<&str>,
        from: usize,
        size: usize,
    ) -> Result<Option<String>> {
        let start = Instant::now();
        let (total, found) = in_transaction(&self.store, |s| {
            let total = s.count_like_free_text(query)?;
            let found = s.find_like_free_text(query, from, size)?;
            Ok((total, found))
        })?;
        let response = build_response(found, total, start.elapsed());
        tracing::debug!(?query, ?country, ?date, total = response.total_hits(), "search");
        Ok(to_json(&response))
    }

    /// Criteria search: every present filter must match as a case-insensitive
    /// substring. With no filters at all every person matches.
    pub fn advanced_search(
        &self,
        name: Option<&str>,
        country: Option<&str>,
        city: Option<&str>,
        from: usize,
        size: usize,
    ) -> Result<Option<String>> {
        let criteria = CriteriaSet::new()
            .contains(AttributePath::Name, name)
            .contains(AttributePath::AddressCountry, country)
            .contains(AttributePath::AddressCity, city);

        let start = Instant::now();
        let (total, found) = in_transaction(&self.store, |s| {
            let total = s.count_with_criteria(&criteria)?;
            let found = s.find_with_criteria(&criteria, from, size)?;
            Ok((total, found))
        })?;
        let response = build_response(found, total, start.elapsed());
        tracing::debug!(?name, ?country, ?city, total = response.total_hits(), "advanced search");
        Ok(to_json(&response))
    }

    /// Same contract as [`Self::search`], answered by the index instead.
    pub fn search_index(&self, query: Option<&str>, from: usize, size: usize) -> Result<Option<String>> {
        let start = Instant::now();
        let page = self.index.search(query, from, size)?;
        let response = build_response(page.people, page.total, start.elapsed());
        tracing::debug!(?query, total = response.total_hits(), "index search");
        Ok(to_json(&response))
    }

    /// Generates and stores `count` people under one scope. The first one is
    /// the well-known fixture; the others get references `1..count`.
    ///
    /// A generation failure stops the loop but keeps what was already saved,
    /// so `true` does not mean all `count` people exist. References that are
    /// already stored are overwritten in place, so `init` can be run again.
    pub fn init(&self, count: usize) -> Result<bool> {
        tracing::info!(count, "initializing database");
        let start = Instant::now();

        let scope = TransactionScope::begin(&self.store)?;
        let mut saved = Vec::with_capacity(count);
        for i in 0..count {
            let mut person = match self.generator.generate() {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(error = %e, generated = i, "error while generating data");
                    break;
                }
            };
            if i == 0 {
                person.name = Some(FIXTURE_NAME.to_string());
            }
            let reference = i.to_string();
            person.id = scope.session().get_by_reference(&reference)?.and_then(|p| p.id);
            person.reference = Some(reference);
            saved.push(scope.session().save(&person)?);
        }
        scope.commit()?;
        self.index.index_all(&saved)?;

        let took = start.elapsed();
        tracing::info!(
            count = saved.len(),
            took_ms = u64::try_from(took.as_millis()).unwrap_or(u64::MAX),
            per_second = per_second(saved.len(), took),
            "database initialized"
        );
        Ok(true)
    }

    /// Re-sends every stored person to the index, `batch_size` at a time.
    /// Index writes are upserts, so running this over a healthy index is a no-op.
    pub fn reindex(&self, batch_size: usize) -> Result<u64> {
        let batch_size = batch_size.max(1);
        let all = CriteriaSet::new();
        let mut from = 0;
        let mut indexed = 0u64;
        loop {
            let batch = in_transaction(&self.store, |s| s.find_with_criteria(&all, from, batch_size))?;
            if batch.is_empty() {
                break;
            }
            self.index.index_all(&batch)?;
            indexed += batch.len() as u64;
            from += batch.len();
        }
        tracing::info!(indexed, "reindex complete");
        Ok(indexed)
    }
}

fn per_second(count: usize, took: Duration) -> u64 {
    let secs = took.as_secs_f64().max(1e-3);
    (count as f64 / secs) as u64
}

fn to_json<T: Serialize>(response: &SearchResponse<T>) -> Option<String> {
    match serde_json::to_string(response) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!(error = %e, "can not serialize to json");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<Ser: serde::Serializer>(&self, _serializer: Ser) -> std::result::Result<Ser::Ok, Ser::Error> {
            Err(Ser::Error::custom("not representable"))
        }
    }

    #[test]
    fn serialization_failure_yields_none() {
        let response = build_response(vec![Unserializable], 1, Duration::ZERO);
        assert!(to_json(&response).is_none());
    }

    #[test]
    fn zero_hits_still_serialize() {
        let response = build_response(Vec::<Person>::new(), 0, Duration::ZERO);
        assert_eq!(to_json(&response).as_deref(), Some(r#"{"took":0,"hits":{"total":0,"hits":[]}}"#));
    }

    #[test]
    fn throughput_never_divides_by_zero() {
        assert_eq!(per_second(5, Duration::ZERO), 5000);
        assert_eq!(per_second(10, Duration::from_secs(2)), 5);
    }
}

use std::sync::Arc;
use std::thread;

use persondb_core::criteria::{AttributePath, CriteriaSet};
use persondb_core::traits::{RecordSession, RecordStore};
use persondb_core::transaction::in_transaction;
use persondb_core::types::{Address, GeoPoint, Marketing, Person};
use persondb_store::SqliteRecordStore;
use tempfile::TempDir;

fn person(reference: &str, name: &str, country: &str, city: &str) -> Person {
    Person {
        reference: Some(reference.to_string()),
        name: Some(name.to_string()),
        address: Some(Address {
            country: Some(country.to_string()),
            city: Some(city.to_string()),
            ..Address::default()
        }),
        ..Person::default()
    }
}

fn seeded() -> SqliteRecordStore {
    let store = SqliteRecordStore::open_in_memory().expect("open");
    in_transaction(&store, |s| {
        for p in [
            person("1", "Joe Smith", "France", "Paris"),
            person("2", "Jane Smith", "France", "Lyon"),
            person("3", "Jack Doe", "Germany", "Berlin"),
            person("4", "Anna Schmidt", "Germany", "Paris"),
        ] {
            s.save(&p)?;
        }
        Ok(())
    })
    .expect("seed");
    store
}

#[test]
fn save_assigns_identity_and_round_trips_all_fields() {
    let store = SqliteRecordStore::open_in_memory().expect("open");
    let mut p = person("42", "Joe", "France", "Paris");
    p.date_of_birth = Some("1970-01-01".into());
    p.children = Some(3);
    p.marketing = Some(Marketing { cars: Some(1200), food: Some(40), ..Marketing::default() });
    if let Some(a) = p.address.as_mut() {
        a.location = Some(GeoPoint { lat: 48.85, lon: 2.35 });
    }
    let saved = in_transaction(&store, |s| s.save(&p)).expect("save");
    assert!(saved.id.is_some());

    let loaded = in_transaction(&store, |s| s.get_by_reference("42")).expect("get").expect("present");
    assert_eq!(loaded, saved);
}

#[test]
fn save_with_identity_updates_in_place() {
    let store = SqliteRecordStore::open_in_memory().expect("open");
    let session = store.begin_transaction().expect("begin");
    let mut saved = session.save(&person("1", "Joe", "France", "Paris")).expect("save");
    saved.name = Some("Joseph".into());
    let updated = session.save(&saved).expect("update");
    assert_eq!(updated.id, saved.id);
    assert_eq!(session.count_with_criteria(&CriteriaSet::new()).expect("count"), 1);
    let loaded = session.get_by_reference("1").expect("get").expect("present");
    assert_eq!(loaded.name.as_deref(), Some("Joseph"));
}

#[test]
fn unknown_reference_is_absent() {
    let store = seeded();
    let session = store.begin_transaction().expect("begin");
    assert!(session.get_by_reference("nope").expect("get").is_none());
}

#[test]
fn delete_removes_the_row() {
    let store = seeded();
    let session = store.begin_transaction().expect("begin");
    let p = session.get_by_reference("3").expect("get").expect("present");
    session.delete(&p).expect("delete");
    assert!(session.get_by_reference("3").expect("get").is_none());
    assert_eq!(session.count_like_free_text(None).expect("count"), 3);
}

#[test]
fn criteria_are_case_insensitive_substrings_anded() {
    let store = seeded();
    let session = store.begin_transaction().expect("begin");
    let set = CriteriaSet::new()
        .contains(AttributePath::Name, Some("SMI"))
        .contains(AttributePath::AddressCountry, Some("fra"));
    assert_eq!(session.count_with_criteria(&set).expect("count"), 2);
    let found = session.find_with_criteria(&set, 0, 10).expect("find");
    let refs: Vec<_> = found.iter().filter_map(|p| p.reference.as_deref()).collect();
    assert_eq!(refs, vec!["1", "2"]);
}

#[test]
fn case_folding_covers_non_ascii_letters() {
    let store = SqliteRecordStore::open_in_memory().expect("open");
    let mut session = store.begin_transaction().expect("begin");
    session.save(&person("1", "Émile Zola", "Österreich", "Wien")).expect("save");
    let by_name = CriteriaSet::new().contains(AttributePath::Name, Some("émile"));
    assert_eq!(session.count_with_criteria(&by_name).expect("count"), 1);
    let by_country = CriteriaSet::new().contains(AttributePath::AddressCountry, Some("ÖSTER"));
    assert_eq!(session.count_with_criteria(&by_country).expect("count"), 1);
    assert_eq!(session.count_like_free_text(Some("ZOLA émile")).expect("count"), 1);
    session.commit().expect("commit");
}

#[test]
fn criteria_pagination_keeps_total() {
    let store = seeded();
    let session = store.begin_transaction().expect("begin");
    let set = CriteriaSet::new().contains(AttributePath::AddressCity, Some("paris"));
    assert_eq!(session.count_with_criteria(&set).expect("count"), 2);
    let page = session.find_with_criteria(&set, 1, 1).expect("find");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].reference.as_deref(), Some("4"));
}

#[test]
fn empty_criteria_match_everything() {
    let store = seeded();
    let session = store.begin_transaction().expect("begin");
    let all = CriteriaSet::new();
    assert_eq!(session.count_with_criteria(&all).expect("count"), 4);
    assert_eq!(session.find_with_criteria(&all, 0, 3).expect("find").len(), 3);
}

#[test]
fn free_text_requires_every_term() {
    let store = seeded();
    let session = store.begin_transaction().expect("begin");
    assert_eq!(session.count_like_free_text(Some("smith")).expect("count"), 2);
    assert_eq!(session.count_like_free_text(Some("smith lyon")).expect("count"), 1);
    assert_eq!(session.count_like_free_text(Some("paris")).expect("count"), 2);
    let found = session.find_like_free_text(Some("germany"), 0, 10).expect("find");
    assert_eq!(found.len(), 2);
}

#[test]
fn transactions_are_not_reentrant() {
    let store = SqliteRecordStore::open_in_memory().expect("open");
    let mut session = store.begin_transaction().expect("begin");
    assert!(store.begin_transaction().is_err());
    session.commit().expect("commit");
    assert!(session.commit().is_err(), "nothing left to commit");
    drop(session);
    assert!(store.begin_transaction().is_ok(), "store is free once the session is gone");
}

#[test]
fn dropped_session_rolls_back() {
    let store = SqliteRecordStore::open_in_memory().expect("open");
    {
        let session = store.begin_transaction().expect("begin");
        session.save(&person("9", "Temp", "France", "Paris")).expect("save");
    }
    let found = in_transaction(&store, |s| s.get_by_reference("9")).expect("get");
    assert!(found.is_none());
}

#[test]
fn concurrent_sessions_are_serialized() {
    let store = Arc::new(SqliteRecordStore::open_in_memory().expect("open"));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..50 {
                    let reference = format!("{t}-{i}");
                    in_transaction(store.as_ref(), |s| {
                        s.save(&person(&reference, "Joe", "France", "Paris"))?;
                        let own = s.get_by_reference(&reference)?;
                        anyhow::ensure!(own.is_some(), "own write not visible");
                        Ok(())
                    })
                    .expect("transaction");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("thread");
    }
    let total = in_transaction(store.as_ref(), |s| s.count_with_criteria(&CriteriaSet::new())).expect("count");
    assert_eq!(total, 400);
}

#[test]
fn committed_writes_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested/persons.db");
    {
        let store = SqliteRecordStore::open(&path).expect("open");
        let mut session = store.begin_transaction().expect("begin");
        session.save(&person("7", "Joe", "France", "Paris")).expect("save");
        session.commit().expect("commit");
    }
    let store = SqliteRecordStore::open(&path).expect("reopen");
    assert!(in_transaction(&store, |s| s.get_by_reference("7")).expect("get").is_some());
}

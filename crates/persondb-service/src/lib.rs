//! persondb-service
//!
//! Orchestration over a [`RecordStore`](persondb_core::traits::RecordStore)
//! and an [`IndexGateway`](persondb_core::traits::IndexGateway): transactional
//! CRUD, merge-on-write upsert, the search paths and bulk initialization.
pub mod generator;
pub mod service;

pub use generator::RandomPersonGenerator;
pub use service::{PersonService, FIXTURE_NAME, FIXTURE_REFERENCE};

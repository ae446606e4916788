use anyhow::Result;
use std::path::Path;
use std::sync::Mutex;
use tantivy::directory::MmapDirectory;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use persondb_core::error::Error;
use persondb_core::traits::IndexGateway;
use persondb_core::types::{IndexPage, Person};

use crate::search::{parse_query, search_page};
use crate::tantivy_utils::{build_schema, register_tokenizer, PersonFields};

const WRITER_MEMORY_BUDGET: usize = 50_000_000;

/// One document per person, keyed by `reference`.
///
/// Every write deletes the reference's previous document in the same commit,
/// so indexing is an upsert and replaying a write is harmless. The single
/// writer is shared by all callers; writes are serialized on it.
pub struct TantivyIndex {
	index: Index,
	reader: IndexReader,
	writer: Mutex<IndexWriter>,
	fields: PersonFields,
}

impl TantivyIndex {
	/// Opens the index stored in `index_dir`, creating it (and the directory) if needed.
	pub fn open_or_create(index_dir: &Path) -> Result<Self, anyhow::Error> {
		std::fs::create_dir_all(index_dir)?;
		let index = Index::open_or_create(MmapDirectory::open(index_dir)?, build_schema())?;
		tracing::debug!(dir = %index_dir.display(), "opened index");
		Self::with_index(index)
	}

	pub fn create_in_ram() -> Result<Self, anyhow::Error> {
		Self::with_index(Index::create_in_ram(build_schema()))
	}

	fn with_index(index: Index) -> Result<Self, anyhow::Error> {
		register_tokenizer(&index);
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		let fields = PersonFields::from_schema(&index.schema())?;
		let writer: IndexWriter = index.writer(WRITER_MEMORY_BUDGET)?;
		Ok(Self { index, reader, writer: Mutex::new(writer), fields })
	}

	/// Documents currently visible to searches.
	pub fn num_docs(&self) -> u64 {
		self.reader.searcher().num_docs()
	}

	fn to_document(&self, person: &Person) -> Result<TantivyDocument> {
		let reference = person
			.reference
			.as_deref()
			.ok_or_else(|| Error::Operation("cannot index a person without a reference".to_string()))?;
		let mut doc = TantivyDocument::default();
		doc.add_text(self.fields.reference, reference);
		if let Some(name) = &person.name { doc.add_text(self.fields.name, name); }
		if let Some(country) = person.country() { doc.add_text(self.fields.country, country); }
		if let Some(city) = person.city() { doc.add_text(self.fields.city, city); }
		doc.add_text(self.fields.source, serde_json::to_string(person)?);
		Ok(doc)
	}

	fn reference_term(&self, reference: &str) -> Term {
		Term::from_field_text(self.fields.reference, reference)
	}

	/// Runs `ops` on the shared writer, commits, and makes the result searchable.
	/// Ops that fail are rolled back so the next commit does not pick them up.
	fn write<F>(&self, ops: F) -> Result<()>
	where
		F: FnOnce(&mut IndexWriter) -> Result<()>,
	{
		let mut index_writer = self
			.writer
			.lock()
			.map_err(|_| Error::Operation("index writer poisoned".to_string()))?;
		if let Err(e) = ops(&mut *index_writer) {
			index_writer.rollback()?;
			return Err(e);
		}
		index_writer.commit()?;
		self.reader.reload()?;
		Ok(())
	}
}

impl IndexGateway for TantivyIndex {
	fn index(&self, person: &Person) -> anyhow::Result<()> {
		self.index_all(std::slice::from_ref(person))
	}

	fn index_all(&self, people: &[Person]) -> anyhow::Result<()> {
		if people.is_empty() { return Ok(()); }
		let docs = people.iter().map(|p| self.to_document(p)).collect::<Result<Vec<_>>>()?;
		self.write(|writer| {
			for (person, doc) in people.iter().zip(docs) {
				if let Some(reference) = person.reference.as_deref() {
					writer.delete_term(self.reference_term(reference));
				}
				writer.add_document(doc)?;
			}
			Ok(())
		})?;
		tracing::debug!(count = people.len(), "indexed people");
		Ok(())
	}

	fn delete(&self, reference: &str) -> anyhow::Result<()> {
		self.write(|writer| {
			writer.delete_term(self.reference_term(reference));
			Ok(())
		})?;
		tracing::debug!(reference, "removed from index");
		Ok(())
	}

	fn search(&self, query: Option<&str>, from: usize, size: usize) -> anyhow::Result<IndexPage> {
		let searcher = self.reader.searcher();
		let query = parse_query(&self.index, &self.fields, query)?;
		search_page(&searcher, &self.fields, query.as_ref(), from, size)
	}
}

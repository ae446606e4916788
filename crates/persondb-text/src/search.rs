use anyhow::Result;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{AllQuery, Query, QueryParser};
use tantivy::schema::Value;
use tantivy::{Index, Searcher, TantivyDocument};

use persondb_core::types::{IndexPage, Person};

use crate::tantivy_utils::PersonFields;

/// Parses `query_text` over name/country/city with AND between terms.
/// A blank or absent query matches every document.
pub fn parse_query(index: &Index, fields: &PersonFields, query_text: Option<&str>) -> Result<Box<dyn Query>> {
	let query_text = query_text.map(str::trim).unwrap_or_default();
	if query_text.is_empty() {
		return Ok(Box::new(AllQuery));
	}
	let mut query_parser = QueryParser::for_index(index, fields.text_fields());
	query_parser.set_conjunction_by_default();
	Ok(query_parser.parse_query(query_text)?)
}

/// Counts every match and loads the `[from, from + size)` window, best score first.
pub fn search_page(searcher: &Searcher, fields: &PersonFields, query: &dyn Query, from: usize, size: usize) -> Result<IndexPage> {
	if size == 0 {
		let total = searcher.search(query, &Count)?;
		return Ok(IndexPage { total: total as u64, people: Vec::new() });
	}
	let (total, top_docs) = searcher.search(query, &(Count, TopDocs::with_limit(size).and_offset(from)))?;
	let mut people = Vec::with_capacity(top_docs.len());
	for (_score, doc_address) in top_docs {
		let doc: TantivyDocument = searcher.doc(doc_address)?;
		let source = doc.get_first(fields.source).and_then(|v| v.as_str()).unwrap_or("{}");
		people.push(serde_json::from_str::<Person>(source)?);
	}
	Ok(IndexPage { total: total as u64, people })
}

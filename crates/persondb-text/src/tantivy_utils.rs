use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{AsciiFoldingFilter, LowerCaser, SimpleTokenizer, TextAnalyzer};
use tantivy::Index;

pub const PERSON_TOKENIZER: &str = "person_text";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let _reference_field = schema_builder.add_text_field("reference", STRING | STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(PERSON_TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
	let _name_field = schema_builder.add_text_field("name", text_options.clone());
	let _country_field = schema_builder.add_text_field("country", text_options.clone());
	let _city_field = schema_builder.add_text_field("city", text_options);
	let _source_field = schema_builder.add_text_field("source", STORED);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(AsciiFoldingFilter)
		.build();
	index.tokenizers().register(PERSON_TOKENIZER, tokenizer);
}

/// Field handles resolved once from the schema.
#[derive(Debug, Clone, Copy)]
pub struct PersonFields {
	pub reference: Field,
	pub name: Field,
	pub country: Field,
	pub city: Field,
	pub source: Field,
}

impl PersonFields {
	pub fn from_schema(schema: &Schema) -> anyhow::Result<Self> {
		Ok(Self {
			reference: schema.get_field("reference")?,
			name: schema.get_field("name")?,
			country: schema.get_field("country")?,
			city: schema.get_field("city")?,
			source: schema.get_field("source")?,
		})
	}

	/// Fields searched by free-text queries.
	pub fn text_fields(&self) -> Vec<Field> {
		vec![self.name, self.country, self.city]
	}
}

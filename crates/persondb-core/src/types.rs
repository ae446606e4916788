//! Domain types shared by the record store, the index and the service.

use serde::{Deserialize, Serialize};

pub type PersonId = i64;
pub type Reference = String;

/// A person as stored in the record store and mirrored in the index.
///
/// - `id`: internal identity, assigned by the record store on first insert
/// - `reference`: stable external identifier; the only key shared with the index
/// - everything else is a business attribute
///
/// All fields are optional so that a partial payload (as sent to `upsert`)
/// and a fully populated stored record share one type. Absent fields are
/// left out of the JSON output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PersonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// ISO-8601 calendar date, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing: Option<Marketing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl Person {
    /// Country of the address, if both are known.
    pub fn country(&self) -> Option<&str> {
        self.address.as_ref().and_then(|a| a.country.as_deref())
    }

    /// City of the address, if both are known.
    pub fn city(&self) -> Option<&str> {
        self.address.as_ref().and_then(|a| a.city.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countrycode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Per-category marketing scores. Higher means more spent in that category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marketing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cars: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toys: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fashion: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub garden: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electronic: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hifi: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<u32>,
}

/// One page of people answered by the index, plus the total match count.
#[derive(Debug, Clone, Default)]
pub struct IndexPage {
    pub total: u64,
    pub people: Vec<Person>,
}

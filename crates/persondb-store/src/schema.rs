use persondb_core::types::{Address, GeoPoint, Marketing, Person};
use rusqlite::types::{Type, Value};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, Row};

pub const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS person(
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    reference     TEXT UNIQUE,
    name          TEXT,
    date_of_birth TEXT,
    gender        TEXT,
    children      INTEGER,
    marketing     TEXT,
    country       TEXT,
    zipcode       TEXT,
    city          TEXT,
    countrycode   TEXT,
    lat           REAL,
    lon           REAL
);
CREATE INDEX IF NOT EXISTS person_name ON person(name);
";

/// Column list shared by every SELECT, in the order `person_from_row` reads it.
pub const SELECT_COLUMNS: &str =
    "id, reference, name, date_of_birth, gender, children, marketing, country, zipcode, city, countrycode, lat, lon";

/// Writable columns, in the order `person_values` binds them.
pub const WRITE_COLUMNS: [&str; 12] = [
    "reference", "name", "date_of_birth", "gender", "children", "marketing",
    "country", "zipcode", "city", "countrycode", "lat", "lon",
];

/// SQL function lowercasing its argument with full Unicode case folding.
/// The built-in `lower` and `LIKE` only fold ASCII.
pub const UNICODE_LOWER: &str = "ulower";

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_TABLES)
}

pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value = ctx.get::<Option<String>>(0)?;
            Ok(value.map(|s| s.to_lowercase()))
        },
    )
}

fn text(v: Option<&String>) -> Value {
    v.map_or(Value::Null, |s| Value::Text(s.clone()))
}

/// Binds the writable columns of `person`, matching `WRITE_COLUMNS`.
pub fn person_values(person: &Person) -> anyhow::Result<Vec<Value>> {
    let marketing = match &person.marketing {
        Some(m) => Value::Text(serde_json::to_string(m)?),
        None => Value::Null,
    };
    let address = person.address.as_ref();
    let location = address.and_then(|a| a.location);
    Ok(vec![
        text(person.reference.as_ref()),
        text(person.name.as_ref()),
        text(person.date_of_birth.as_ref()),
        text(person.gender.as_ref()),
        person.children.map_or(Value::Null, |c| Value::Integer(i64::from(c))),
        marketing,
        text(address.and_then(|a| a.country.as_ref())),
        text(address.and_then(|a| a.zipcode.as_ref())),
        text(address.and_then(|a| a.city.as_ref())),
        text(address.and_then(|a| a.countrycode.as_ref())),
        location.map_or(Value::Null, |l| Value::Real(l.lat)),
        location.map_or(Value::Null, |l| Value::Real(l.lon)),
    ])
}

pub fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    let marketing = match row.get::<_, Option<String>>(6)? {
        Some(json) => Some(
            serde_json::from_str::<Marketing>(&json)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?,
        ),
        None => None,
    };
    let location = match (row.get::<_, Option<f64>>(11)?, row.get::<_, Option<f64>>(12)?) {
        (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
        _ => None,
    };
    let address = Address {
        country: row.get(7)?,
        zipcode: row.get(8)?,
        city: row.get(9)?,
        countrycode: row.get(10)?,
        location,
    };
    let address = (address != Address::default()).then_some(address);
    Ok(Person {
        id: row.get(0)?,
        reference: row.get(1)?,
        name: row.get(2)?,
        date_of_birth: row.get(3)?,
        gender: row.get(4)?,
        children: row.get(5)?,
        marketing,
        address,
    })
}

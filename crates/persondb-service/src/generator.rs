//! Synthetic people for bulk initialization.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use persondb_core::error::Error;
use persondb_core::traits::PersonGenerator;
use persondb_core::types::{Address, GeoPoint, Marketing, Person};

const MALE_NAMES: &[&str] = &["David", "Thomas", "Lucas", "Hugo", "Paul", "Marco", "Jan", "Pedro", "Liam", "Oscar"];
const FEMALE_NAMES: &[&str] = &["Emma", "Louise", "Chloe", "Lina", "Sofia", "Anna", "Julia", "Maria", "Olivia", "Ines"];
const LAST_NAMES: &[&str] = &[
    "Martin", "Bernard", "Dubois", "Muller", "Schmidt", "Rossi", "Garcia", "Lopez", "Brown", "Wilson", "Jansen", "Silva",
];

struct Place {
    country: &'static str,
    countrycode: &'static str,
    city: &'static str,
    zipcode: &'static str,
    lat: f64,
    lon: f64,
}

const PLACES: &[Place] = &[
    Place { country: "France", countrycode: "FR", city: "Paris", zipcode: "75001", lat: 48.8566, lon: 2.3522 },
    Place { country: "France", countrycode: "FR", city: "Lyon", zipcode: "69001", lat: 45.7640, lon: 4.8357 },
    Place { country: "Germany", countrycode: "DE", city: "Berlin", zipcode: "10115", lat: 52.5200, lon: 13.4050 },
    Place { country: "Germany", countrycode: "DE", city: "Munich", zipcode: "80331", lat: 48.1351, lon: 11.5820 },
    Place { country: "Italy", countrycode: "IT", city: "Rome", zipcode: "00118", lat: 41.9028, lon: 12.4964 },
    Place { country: "Spain", countrycode: "ES", city: "Madrid", zipcode: "28001", lat: 40.4168, lon: -3.7038 },
    Place { country: "Netherlands", countrycode: "NL", city: "Amsterdam", zipcode: "1011", lat: 52.3676, lon: 4.9041 },
    Place { country: "Portugal", countrycode: "PT", city: "Lisbon", zipcode: "1100", lat: 38.7223, lon: -9.1393 },
    Place { country: "United Kingdom", countrycode: "GB", city: "London", zipcode: "EC1A", lat: 51.5074, lon: -0.1278 },
];

/// Produces plausible random people. Seed it for reproducible runs.
pub struct RandomPersonGenerator {
    rng: Mutex<StdRng>,
}

impl Default for RandomPersonGenerator {
    fn default() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }
}

impl RandomPersonGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }
}

fn pick<R: Rng>(rng: &mut R, items: &'static [&'static str]) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}

fn score<R: Rng>(rng: &mut R) -> Option<u32> {
    rng.gen_bool(0.6).then(|| rng.gen_range(0..=5000))
}

fn marketing<R: Rng>(rng: &mut R) -> Marketing {
    Marketing {
        cars: score(rng),
        shoes: score(rng),
        toys: score(rng),
        fashion: score(rng),
        music: score(rng),
        garden: score(rng),
        electronic: score(rng),
        hifi: score(rng),
        food: score(rng),
    }
}

impl PersonGenerator for RandomPersonGenerator {
    fn generate(&self) -> anyhow::Result<Person> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| Error::Generation("random source poisoned".to_string()))?;
        let rng = &mut *rng;

        let (gender, first) = if rng.gen_bool(0.5) {
            ("male", pick(rng, MALE_NAMES))
        } else {
            ("female", pick(rng, FEMALE_NAMES))
        };
        let place = PLACES
            .choose(rng)
            .ok_or_else(|| Error::Generation("no places to pick from".to_string()))?;
        let date_of_birth = format!(
            "{:04}-{:02}-{:02}",
            rng.gen_range(1940..=2010),
            rng.gen_range(1..=12),
            rng.gen_range(1..=28)
        );
        // Jitter around the city centre so points do not all overlap.
        let location = GeoPoint {
            lat: place.lat + rng.gen_range(-0.05..0.05),
            lon: place.lon + rng.gen_range(-0.05..0.05),
        };

        Ok(Person {
            id: None,
            reference: None,
            name: Some(format!("{first} {}", pick(rng, LAST_NAMES))),
            date_of_birth: Some(date_of_birth),
            gender: Some(gender.to_string()),
            children: Some(rng.gen_range(0..=4)),
            marketing: Some(marketing(rng)),
            address: Some(Address {
                country: Some(place.country.to_string()),
                zipcode: Some(place.zipcode.to_string()),
                city: Some(place.city.to_string()),
                countrycode: Some(place.countrycode.to_string()),
                location: Some(location),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_people_are_fully_populated_and_unreferenced() {
        let generator = RandomPersonGenerator::seeded(7);
        for _ in 0..20 {
            let p = generator.generate().expect("generate");
            assert!(p.id.is_none());
            assert!(p.reference.is_none());
            assert!(p.name.is_some());
            assert!(p.country().is_some() && p.city().is_some());
            assert_eq!(p.date_of_birth.as_deref().map(str::len), Some(10));
        }
    }

    #[test]
    fn same_seed_same_people() {
        let a = RandomPersonGenerator::seeded(42).generate().expect("a");
        let b = RandomPersonGenerator::seeded(42).generate().expect("b");
        assert_eq!(a, b);
    }
}

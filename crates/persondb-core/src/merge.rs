//! Merge-on-update field copier.

use crate::traits::FieldCopier;
use crate::types::{Address, Marketing, Person};

/// Copies every present field of the source onto the target, descending into
/// `address` and `marketing`. Identity (`id`) is never copied.
#[derive(Debug, Default, Clone, Copy)]
pub struct MergeCopier;

fn merge_opt<T: Clone>(src: Option<&T>, dst: &mut Option<T>) {
    if let Some(v) = src {
        *dst = Some(v.clone());
    }
}

fn merge_address(src: &Address, dst: &mut Address) {
    merge_opt(src.country.as_ref(), &mut dst.country);
    merge_opt(src.zipcode.as_ref(), &mut dst.zipcode);
    merge_opt(src.city.as_ref(), &mut dst.city);
    merge_opt(src.countrycode.as_ref(), &mut dst.countrycode);
    merge_opt(src.location.as_ref(), &mut dst.location);
}

fn merge_marketing(src: &Marketing, dst: &mut Marketing) {
    merge_opt(src.cars.as_ref(), &mut dst.cars);
    merge_opt(src.shoes.as_ref(), &mut dst.shoes);
    merge_opt(src.toys.as_ref(), &mut dst.toys);
    merge_opt(src.fashion.as_ref(), &mut dst.fashion);
    merge_opt(src.music.as_ref(), &mut dst.music);
    merge_opt(src.garden.as_ref(), &mut dst.garden);
    merge_opt(src.electronic.as_ref(), &mut dst.electronic);
    merge_opt(src.hifi.as_ref(), &mut dst.hifi);
    merge_opt(src.food.as_ref(), &mut dst.food);
}

impl FieldCopier for MergeCopier {
    fn copy_onto(&self, source: &Person, target: &mut Person) {
        merge_opt(source.reference.as_ref(), &mut target.reference);
        merge_opt(source.name.as_ref(), &mut target.name);
        merge_opt(source.date_of_birth.as_ref(), &mut target.date_of_birth);
        merge_opt(source.gender.as_ref(), &mut target.gender);
        merge_opt(source.children.as_ref(), &mut target.children);
        if let Some(src) = &source.marketing {
            merge_marketing(src, target.marketing.get_or_insert_with(Marketing::default));
        }
        if let Some(src) = &source.address {
            merge_address(src, target.address.get_or_insert_with(Address::default));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Person {
        Person {
            id: Some(7),
            reference: Some("7".into()),
            name: Some("B".into()),
            gender: Some("female".into()),
            address: Some(Address { country: Some("FR".into()), city: Some("Paris".into()), ..Address::default() }),
            ..Person::default()
        }
    }

    #[test]
    fn unspecified_fields_survive() {
        let mut target = stored();
        let patch = Person { name: Some("A".into()), ..Person::default() };
        MergeCopier.copy_onto(&patch, &mut target);
        assert_eq!(target.name.as_deref(), Some("A"));
        assert_eq!(target.country(), Some("FR"));
        assert_eq!(target.gender.as_deref(), Some("female"));
    }

    #[test]
    fn nested_address_is_merged_field_by_field() {
        let mut target = stored();
        let patch = Person {
            address: Some(Address { city: Some("Lyon".into()), ..Address::default() }),
            ..Person::default()
        };
        MergeCopier.copy_onto(&patch, &mut target);
        assert_eq!(target.city(), Some("Lyon"));
        assert_eq!(target.country(), Some("FR"));
    }

    #[test]
    fn identity_is_never_copied() {
        let mut target = stored();
        let patch = Person { id: Some(999), ..Person::default() };
        MergeCopier.copy_onto(&patch, &mut target);
        assert_eq!(target.id, Some(7));
    }
}

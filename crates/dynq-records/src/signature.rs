use std::hash::{DefaultHasher, Hash, Hasher};

use dynq_types::Ty;

/// A named, typed record field request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicProperty {
    name: String,
    ty: Ty,
}

impl DynamicProperty {
    /// Create a field request. The name must be non-empty.
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "record field name must be non-empty");
        Self { name, ty }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Ty {
        &self.ty
    }
}

/// An ordered field list with a precomputed structural hash.
///
/// The hash is the XOR over all entries of `hash(name) ^ hash(type)`,
/// so it is order-insensitive while equality is positional; the cache
/// relies on equality, the hash only buckets.
#[derive(Clone, Debug)]
pub struct Signature {
    properties: Vec<DynamicProperty>,
    hash: u64,
}

impl Signature {
    pub fn new(properties: Vec<DynamicProperty>) -> Self {
        let mut hash = 0u64;
        for p in &properties {
            hash ^= hash_one(&p.name) ^ hash_one(&p.ty);
        }
        Self { properties, hash }
    }

    pub fn properties(&self) -> &[DynamicProperty] {
        &self.properties
    }
}

fn hash_one<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties // positional, exact
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_field_lists_hash_equal() {
        let a = Signature::new(vec![
            DynamicProperty::new("Len", Ty::int32()),
            DynamicProperty::new("Name", Ty::string()),
        ]);
        let b = Signature::new(vec![
            DynamicProperty::new("Len", Ty::int32()),
            DynamicProperty::new("Name", Ty::string()),
        ]);
        assert_eq!(a, b);
        assert_eq!(hash_one(&a), hash_one(&b));
    }

    #[test]
    fn equality_is_positional() {
        let ab = Signature::new(vec![
            DynamicProperty::new("A", Ty::int32()),
            DynamicProperty::new("B", Ty::string()),
        ]);
        let ba = Signature::new(vec![
            DynamicProperty::new("B", Ty::string()),
            DynamicProperty::new("A", Ty::int32()),
        ]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn name_and_type_both_participate() {
        let a = Signature::new(vec![DynamicProperty::new("A", Ty::int32())]);
        let b = Signature::new(vec![DynamicProperty::new("A", Ty::int64())]);
        let c = Signature::new(vec![DynamicProperty::new("B", Ty::int32())]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn empty_field_name_is_rejected() {
        DynamicProperty::new("", Ty::int32());
    }
}

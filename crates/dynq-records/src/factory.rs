use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use dynq_types::{ClassBuilder, Ty};

use crate::signature::{DynamicProperty, Signature};

/// The process-wide signature-keyed cache of minted record types.
/// Insertion-only; entries live for the lifetime of the process.
fn cache() -> &'static RwLock<FxHashMap<Signature, Ty>> {
    static CACHE: OnceLock<RwLock<FxHashMap<Signature, Ty>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(FxHashMap::default()))
}

/// Return the record type for the given field list, minting it on first
/// request.
///
/// Readers proceed concurrently under a shared guard. A miss re-acquires
/// exclusively and re-checks before emitting, so racing requesters for
/// the same signature observe a single minted type.
pub fn create_class(properties: &[DynamicProperty]) -> Ty {
    let signature = Signature::new(properties.to_vec());

    if let Some(ty) = cache().read().get(&signature) {
        return ty.clone();
    }

    let mut classes = cache().write();
    if let Some(ty) = classes.get(&signature) {
        return ty.clone();
    }
    let ty = emit(&signature);
    classes.insert(signature, ty.clone());
    ty
}

/// Synthesize a fresh nominal record type: one public property per
/// requested field, in order.
fn emit(signature: &Signature) -> Ty {
    static NEXT: AtomicU32 = AtomicU32::new(1);
    let n = NEXT.fetch_add(1, Ordering::Relaxed);

    let mut builder = ClassBuilder::new(format!("Record{n}")).record();
    for p in signature.properties() {
        builder = builder.property(p.name(), p.ty().clone());
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_signature_returns_the_same_type() {
        let fields = vec![
            DynamicProperty::new("Len", Ty::int32()),
            DynamicProperty::new("Name", Ty::string()),
        ];
        let a = create_class(&fields);
        let b = create_class(&fields);
        assert_eq!(a, b);
    }

    #[test]
    fn different_signatures_return_different_types() {
        let a = create_class(&[DynamicProperty::new("X", Ty::int32())]);
        let b = create_class(&[DynamicProperty::new("X", Ty::int64())]);
        assert_ne!(a, b);
    }

    #[test]
    fn minted_type_exposes_the_requested_properties() {
        let ty = create_class(&[
            DynamicProperty::new("First", Ty::string()),
            DynamicProperty::new("Second", Ty::bool()),
        ]);
        let Ty::Class(def) = &ty else {
            panic!("expected a class type")
        };
        assert!(def.is_record);
        let names: Vec<&str> = def.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert_eq!(def.properties[1].ty, Ty::bool());
    }

    #[test]
    fn concurrent_requests_agree_on_identity() {
        let fields = vec![DynamicProperty::new("Shared", Ty::double())];
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let fields = fields.clone();
                std::thread::spawn(move || create_class(&fields))
            })
            .collect();
        let types: Vec<Ty> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(types.windows(2).all(|w| w[0] == w[1]));
    }
}

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use dynq_types::{Ty, Value};

/// A failure constructing a record instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The type was not minted by the record factory.
    NotARecordType(String),
    /// Slot count does not match the type's property count.
    SlotCountMismatch { expected: usize, found: usize },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotARecordType(name) => write!(f, "type `{name}` is not a record type"),
            Self::SlotCountMismatch { expected, found } => {
                write!(f, "record expects {expected} slot(s), found {found}")
            }
        }
    }
}

impl std::error::Error for RecordError {}

/// An instance of a minted record type: one value slot per property.
///
/// Equality requires the exact same minted type, then compares slots in
/// order, stopping at the first mismatch. The hash starts from zero and
/// XORs in each slot's hash.
#[derive(Clone, Debug)]
pub struct Record {
    ty: Ty,
    slots: Vec<Value>,
}

impl Record {
    /// Create an instance of a factory-minted record type.
    pub fn new(ty: Ty, slots: Vec<Value>) -> Result<Record, RecordError> {
        let Ty::Class(def) = &ty else {
            return Err(RecordError::NotARecordType(ty.name()));
        };
        if !def.is_record {
            return Err(RecordError::NotARecordType(ty.name()));
        }
        if def.properties.len() != slots.len() {
            return Err(RecordError::SlotCountMismatch {
                expected: def.properties.len(),
                found: slots.len(),
            });
        }
        Ok(Record { ty, slots })
    }

    pub fn ty(&self) -> &Ty {
        &self.ty
    }

    pub fn slots(&self) -> &[Value] {
        &self.slots
    }

    /// Look up a slot by property name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let Ty::Class(def) = &self.ty else {
            return None;
        };
        def.properties
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
            .map(|i| &self.slots[i])
    }

    /// The structural hash: zero, XOR-folded with each slot's hash.
    pub fn hash_code(&self) -> u64 {
        let mut code = 0u64;
        for slot in &self.slots {
            let mut hasher = DefaultHasher::new();
            slot.hash(&mut hasher);
            code ^= hasher.finish();
        }
        code
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        if self.ty != other.ty {
            return false;
        }
        // Slot-wise with short-circuit on the first mismatch.
        self.slots
            .iter()
            .zip(&other.slots)
            .all(|(a, b)| a == b)
    }
}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ty::Class(def) = &self.ty else {
            return write!(f, "<record>");
        };
        write!(f, "{} {{ ", def.name)?;
        for (i, (p, v)) in def.properties.iter().zip(&self.slots).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = {}", p.name, v)?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::create_class;
    use crate::signature::DynamicProperty;

    fn len_name_type() -> Ty {
        create_class(&[
            DynamicProperty::new("Len", Ty::int32()),
            DynamicProperty::new("Name", Ty::string()),
        ])
    }

    #[test]
    fn instances_of_one_type_compare_by_slots() {
        let ty = len_name_type();
        let a = Record::new(ty.clone(), vec![Value::Int32(4), Value::Str("food".into())])
            .expect("record");
        let b = Record::new(ty.clone(), vec![Value::Int32(4), Value::Str("food".into())])
            .expect("record");
        let c =
            Record::new(ty, vec![Value::Int32(3), Value::Str("dog".into())]).expect("record");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.hash_code(), b.hash_code());
    }

    #[test]
    fn instances_of_different_types_never_compare_equal() {
        let a = create_class(&[DynamicProperty::new("V", Ty::int32())]);
        let b = create_class(&[DynamicProperty::new("W", Ty::int32())]);
        let ra = Record::new(a, vec![Value::Int32(1)]).expect("record");
        let rb = Record::new(b, vec![Value::Int32(1)]).expect("record");
        assert_ne!(ra, rb);
    }

    #[test]
    fn slot_lookup_is_case_insensitive() {
        let ty = len_name_type();
        let r = Record::new(ty, vec![Value::Int32(4), Value::Str("food".into())])
            .expect("record");
        assert_eq!(r.get("len"), Some(&Value::Int32(4)));
        assert_eq!(r.get("NAME"), Some(&Value::Str("food".into())));
        assert_eq!(r.get("other"), None);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let ty = len_name_type();
        let err = Record::new(ty, vec![Value::Int32(4)]).unwrap_err();
        assert_eq!(
            err,
            RecordError::SlotCountMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn non_record_types_are_rejected() {
        let err = Record::new(Ty::string(), vec![]).unwrap_err();
        assert!(matches!(err, RecordError::NotARecordType(_)));
    }
}

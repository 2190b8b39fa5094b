//! Secondary Type Dispatch (spec §4.8, §9): a registry that maps an
//! application-level type (e.g. a UUID, a big decimal) to and from one of
//! the primary wire types (e.g. `ByteArrayFixed(W16)`, `String`), so typed
//! accessors like `Message::get_int` can widen/narrow across related
//! primary representations, and so application code can round-trip a
//! richer type through a field without this crate knowing about it.
//!
//! Grounded on the id-keyed, bidirectional conversion-table shape of the
//! teacher's `crypto/mod.rs` (`ExtType` dispatch), generalized from a
//! fixed enum of crypto extension types to an open, string-keyed registry
//! any application type can register itself into.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};
use crate::field::FieldValue;

/// A bidirectional conversion between one application type and its
/// primary wire representation.
pub trait SecondaryType: Send + Sync {
    /// Stable name this type is registered under (used in
    /// [`Error::NoSecondaryConversion`] messages).
    fn type_name(&self) -> &'static str;

    /// Convert an application value into its primary wire representation.
    fn to_primary(&self, value: &dyn Any) -> Result<FieldValue>;

    /// Attempt to convert a primary wire value back into this application
    /// type. Returns `None` if `value`'s shape doesn't match (e.g. wrong
    /// wire type or wrong fixed-array width), distinct from a hard error.
    fn from_primary(&self, value: &FieldValue) -> Option<Box<dyn Any>>;
}

/// Registry of [`SecondaryType`] conversions, keyed by type name.
#[derive(Default)]
pub struct SecondaryTypeRegistry {
    types: RwLock<HashMap<&'static str, Arc<dyn SecondaryType>>>,
}

impl SecondaryTypeRegistry {
    pub fn new() -> SecondaryTypeRegistry {
        SecondaryTypeRegistry {
            types: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, secondary_type: Arc<dyn SecondaryType>) {
        let mut types = self.types.write().unwrap();
        types.insert(secondary_type.type_name(), secondary_type);
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<dyn SecondaryType>> {
        self.types.read().unwrap().get(type_name).cloned()
    }

    /// Convert `value` to its primary wire representation using the
    /// registered converter for `type_name`. Fails with
    /// [`Error::NoSecondaryConversion`] if nothing is registered under
    /// that name.
    pub fn to_primary(&self, type_name: &'static str, value: &dyn Any) -> Result<FieldValue> {
        self.get(type_name)
            .ok_or(Error::NoSecondaryConversion { type_name })?
            .to_primary(value)
    }

    /// Convert a primary wire `value` back to `type_name`'s application
    /// type. Fails with [`Error::NoSecondaryConversion`] if nothing is
    /// registered; returns `Ok(None)` (not an error) if the registered
    /// converter declines the shape.
    pub fn from_primary(
        &self,
        type_name: &'static str,
        value: &FieldValue,
    ) -> Result<Option<Box<dyn Any>>> {
        Ok(self
            .get(type_name)
            .ok_or(Error::NoSecondaryConversion { type_name })?
            .from_primary(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire_type::FixedArrayWidth;

    struct FixedId16;

    impl SecondaryType for FixedId16 {
        fn type_name(&self) -> &'static str {
            "fixed_id_16"
        }

        fn to_primary(&self, value: &dyn Any) -> Result<FieldValue> {
            let bytes = value.downcast_ref::<[u8; 16]>().ok_or(Error::NoSecondaryConversion {
                type_name: self.type_name(),
            })?;
            Ok(FieldValue::ByteArrayFixed {
                width: FixedArrayWidth::W16,
                bytes: bytes.to_vec(),
            })
        }

        fn from_primary(&self, value: &FieldValue) -> Option<Box<dyn Any>> {
            match value {
                FieldValue::ByteArrayFixed {
                    width: FixedArrayWidth::W16,
                    bytes,
                } => {
                    let arr: [u8; 16] = bytes.as_slice().try_into().ok()?;
                    Some(Box::new(arr))
                }
                _ => None,
            }
        }
    }

    #[test]
    fn registered_type_round_trips_through_primary() {
        let registry = SecondaryTypeRegistry::new();
        registry.register(Arc::new(FixedId16));

        let id: [u8; 16] = [7; 16];
        let primary = registry.to_primary("fixed_id_16", &id).unwrap();
        assert_eq!(primary.wire_type(), crate::wire_type::WireType::ByteArrayFixed(FixedArrayWidth::W16));

        let back = registry
            .from_primary("fixed_id_16", &primary)
            .unwrap()
            .unwrap();
        assert_eq!(*back.downcast::<[u8; 16]>().unwrap(), id);
    }

    #[test]
    fn unregistered_type_errors() {
        let registry = SecondaryTypeRegistry::new();
        assert!(matches!(
            registry.to_primary("missing", &0i32),
            Err(Error::NoSecondaryConversion { .. })
        ));
    }

    #[test]
    fn from_primary_declines_wrong_shape_without_erroring() {
        let registry = SecondaryTypeRegistry::new();
        registry.register(Arc::new(FixedId16));
        let wrong = FieldValue::Int(5);
        assert_eq!(registry.from_primary("fixed_id_16", &wrong).unwrap().is_none(), true);
    }
}

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use datadrive_common::{DecodeError, Fragment};
use serde::de::DeserializeOwned;

type ErasedValue = Box<dyn Any + Send + Sync>;
type DecodeFn = fn(Fragment<'_>) -> Result<ErasedValue, DecodeError>;

fn decode_erased<T>(fragment: Fragment<'_>) -> Result<ErasedValue, DecodeError>
where
    T: DeserializeOwned + Any + Send + Sync,
{
    fragment
        .decode::<T>()
        .map(|value| Box::new(value) as ErasedValue)
}

/// Runtime handle for a declared target type.
///
/// Identity is the [`TypeId`]; the descriptor also carries the type's name and
/// a decoder that instantiates the type from a matched [`Fragment`].
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    decode: DecodeFn,
}

impl TypeDescriptor {
    pub fn of<T>() -> Self
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            decode: decode_erased::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name as reported by the compiler.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without module paths (`app::model::OrderRecord` →
    /// `OrderRecord`). Generic arguments of a named type are dropped; tuples,
    /// slices and references keep their shape with each component shortened
    /// (`(a::A, b::B)` → `(A, B)`).
    pub fn short_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut segment = String::new();
        for c in self.name.chars() {
            if c.is_alphanumeric() || c == '_' {
                segment.push(c);
            } else if c == ':' {
                segment.clear();
            } else {
                out.push_str(&segment);
                segment.clear();
                out.push(c);
            }
        }
        out.push_str(&segment);

        let named = out.starts_with(|c: char| c.is_alphanumeric() || c == '_');
        match out.find('<') {
            Some(generics) if named => out[..generics].to_string(),
            _ => out,
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Instantiate this type from matched content.
    pub fn decode(&self, fragment: Fragment<'_>) -> Result<BoundValue, DecodeError> {
        (self.decode)(fragment).map(|value| BoundValue {
            descriptor: *self,
            value,
        })
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeDescriptor").field(&self.name).finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// An instantiated value of a declared type, erased so rows can mix types.
pub struct BoundValue {
    descriptor: TypeDescriptor,
    value: ErasedValue,
}

impl BoundValue {
    pub fn new<T>(value: T) -> Self
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        Self {
            descriptor: TypeDescriptor::of::<T>(),
            value: Box::new(value),
        }
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn type_name(&self) -> &'static str {
        self.descriptor.name()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Take the value out, or get `self` back when the type does not match.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let descriptor = self.descriptor;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self { descriptor, value }),
        }
    }
}

impl fmt::Debug for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundValue")
            .field("type", &self.descriptor.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datadrive_common::DataValue;
    use serde::Deserialize;

    mod model {
        use serde::Deserialize;

        #[derive(Debug, Deserialize, PartialEq)]
        pub struct OrderRecord {
            pub id: u32,
        }

        #[derive(Debug, Deserialize)]
        pub struct Wrapper<T> {
            #[allow(dead_code)]
            pub inner: T,
        }
    }

    #[derive(Debug, Deserialize)]
    struct Other;

    #[test]
    fn identity_is_the_type() {
        let a = TypeDescriptor::of::<model::OrderRecord>();
        let b = TypeDescriptor::of::<model::OrderRecord>();
        assert_eq!(a, b);
        assert_ne!(a, TypeDescriptor::of::<Other>());
        assert!(a.is::<model::OrderRecord>());
        assert!(!a.is::<Other>());
    }

    #[test]
    fn short_name_strips_path_and_generics() {
        assert_eq!(
            TypeDescriptor::of::<model::OrderRecord>().short_name(),
            "OrderRecord"
        );
        assert_eq!(
            TypeDescriptor::of::<model::Wrapper<model::OrderRecord>>().short_name(),
            "Wrapper"
        );
        assert_eq!(TypeDescriptor::of::<String>().short_name(), "String");
        assert_eq!(
            TypeDescriptor::of::<(model::OrderRecord, model::Wrapper<u8>)>().short_name(),
            "(OrderRecord, Wrapper<u8>)"
        );
        assert_eq!(
            TypeDescriptor::of::<Vec<(u32, model::OrderRecord)>>().short_name(),
            "Vec"
        );
    }

    #[test]
    fn decode_produces_downcastable_value() {
        let fields = vec![("id".to_string(), DataValue::Number(9.0))];
        let bound = TypeDescriptor::of::<model::OrderRecord>()
            .decode(Fragment::Fields(&fields))
            .expect("decode");
        assert!(bound.is::<model::OrderRecord>());
        assert_eq!(
            bound.downcast_ref::<model::OrderRecord>(),
            Some(&model::OrderRecord { id: 9 })
        );
        let bound = bound.downcast::<Other>().expect_err("wrong type");
        assert_eq!(
            bound.downcast::<model::OrderRecord>().unwrap(),
            model::OrderRecord { id: 9 }
        );
    }
}

use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The type used for primary keys in storage.
pub type KeyValue = i32;

/// A storage key for any entity type.
///
/// The type parameter keeps keys of different entities from being mixed up,
/// while the value itself is whatever the database handed out.
pub struct Key<T> {
    value: KeyValue,
    kind: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub fn new(value: KeyValue) -> Self {
        Self {
            value,
            kind: PhantomData,
        }
    }

    pub fn value(&self) -> KeyValue {
        self.value
    }
}

impl<T> From<KeyValue> for Key<T> {
    fn from(value: KeyValue) -> Self {
        Self::new(value)
    }
}

impl<T> Debug for Key<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Display for Key<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> PartialOrd for Key<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Key<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}
impl<T> Eq for Key<T> {}

impl<T> Serialize for Key<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Key<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        KeyValue::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod test {
    use super::Key;

    struct Thing;

    #[test]
    fn keys_compare_by_value() {
        let a: Key<Thing> = Key::new(3);
        let b: Key<Thing> = Key::new(7);

        assert!(a < b);
        assert_eq!(a, Key::new(3));
        assert_eq!(serde_json::to_string(&b).unwrap(), "7");
        assert_eq!(serde_json::from_str::<Key<Thing>>("7").unwrap(), b);
    }
}

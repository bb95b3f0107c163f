//! Code for handling IDs
use anyhow::{Context, Result};
use indexmap::IndexMap;

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone, std::hash::Hash, PartialEq, Eq, serde::Deserialize, Debug, serde::Serialize,
        )]
        /// An ID type (e.g. `FuelID`, `FeedstockID`, etc.)
        pub struct $name(pub std::rc::Rc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::rc::Rc::from(id))
            }
        }
    };
}
pub(crate) use define_id_type;

#[cfg(test)]
define_id_type!(GenericID);

/// An ID-keyed table of entities
pub trait IDTable<ID, T> {
    /// Look up an entry by ID, failing with a useful message if it is absent
    fn get_entry(&self, id: &ID) -> Result<&T>;
}

impl<ID, T> IDTable<ID, T> for IndexMap<ID, T>
where
    ID: Eq + std::hash::Hash + std::fmt::Display,
{
    fn get_entry(&self, id: &ID) -> Result<&T> {
        self.get(id)
            .with_context(|| format!("Unknown ID {id} found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_entry() {
        let map: IndexMap<GenericID, u32> = [("a".into(), 1)].into_iter().collect();
        assert_eq!(*map.get_entry(&"a".into()).unwrap(), 1);
        assert!(map.get_entry(&"b".into()).is_err());
    }
}

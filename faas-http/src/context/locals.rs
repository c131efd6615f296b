//! Per-invocation side channel between middleware and the handler.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// String-keyed store of arbitrary values.
///
/// Values are dynamically typed; [`Locals::get`] downcasts to the type the
/// caller asks for and yields `None` on a missing key or a type mismatch.
#[derive(Default)]
pub struct Locals {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set<V>(&mut self, key: impl Into<String>, value: V)
    where
        V: Any + Send + Sync,
    {
        self.values.insert(key.into(), Box::new(value));
    }

    pub fn get<V: Any>(&self, key: &str) -> Option<&V> {
        self.values.get(key)?.downcast_ref()
    }

    pub fn get_mut<V: Any>(&mut self, key: &str) -> Option<&mut V> {
        self.values.get_mut(key)?.downcast_mut()
    }

    /// The untyped value under `key`.
    pub fn get_any(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.values.get(key).map(|v| &**v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Box<dyn Any + Send + Sync>> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Locals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let mut locals = Locals::new();
        locals.set("user", "alice".to_string());
        locals.set("attempts", 3u32);

        assert_eq!(locals.get::<String>("user").map(String::as_str), Some("alice"));
        assert_eq!(locals.get::<u32>("attempts"), Some(&3));
        assert_eq!(locals.len(), 2);
    }

    #[test]
    fn test_type_mismatch_is_none() {
        let mut locals = Locals::new();
        locals.set("attempts", 3u32);
        assert!(locals.get::<i64>("attempts").is_none());
        assert!(locals.get_any("attempts").is_some());
    }

    #[test]
    fn test_set_replaces() {
        let mut locals = Locals::new();
        locals.set("k", 1i32);
        locals.set("k", "two");
        assert!(locals.get::<i32>("k").is_none());
        assert_eq!(locals.get::<&str>("k"), Some(&"two"));
    }

    #[test]
    fn test_get_mut_and_remove() {
        let mut locals = Locals::new();
        locals.set("hits", 1u64);
        *locals.get_mut::<u64>("hits").unwrap() += 1;
        assert_eq!(locals.get::<u64>("hits"), Some(&2));

        assert!(locals.remove("hits").is_some());
        assert!(!locals.contains_key("hits"));
        assert!(locals.is_empty());
        assert!(locals.remove("hits").is_none());
    }

    #[test]
    fn test_debug_lists_keys() {
        let mut locals = Locals::new();
        locals.set("only", ());
        assert_eq!(format!("{locals:?}"), r#"{"only"}"#);
    }
}

//! String interner (component C): canonical storage for string literal
//! bytes, keyed by their post-escape content so that two literals with
//! identical decoded text share a record (P5).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringId(pub u32);

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One interned record: the decoded text, and (after emission) a handle to
/// the IR-side global constant holding its null-terminated bytes.
#[derive(Debug, Clone)]
pub struct InternedString {
    pub text: String,
    ir_handle: Option<String>,
}

impl InternedString {
    pub fn ir_handle(&self) -> Option<&str> {
        self.ir_handle.as_deref()
    }
}

/// Append-only bijective map from decoded literal text to [`StringId`].
#[derive(Debug, Default)]
pub struct StringInterner {
    by_text: HashMap<String, StringId>,
    records: Vec<InternedString>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `text`, returning the existing id if this text was already
    /// seen, or allocating a fresh one otherwise.
    pub fn intern(&mut self, text: &str) -> StringId {
        if let Some(&id) = self.by_text.get(text) {
            return id;
        }
        let id = StringId(self.records.len() as u32);
        self.records.push(InternedString {
            text: text.to_string(),
            ir_handle: None,
        });
        self.by_text.insert(text.to_string(), id);
        id
    }

    pub fn get(&self, id: StringId) -> &InternedString {
        &self.records[id.0 as usize]
    }

    /// Records the IR global constant name backing `id`, set once during
    /// emission.
    pub fn set_ir_handle(&mut self, id: StringId, handle: impl Into<String>) {
        self.records[id.0 as usize].ir_handle = Some(handle.into());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates interned records in allocation order, pairing each with its id.
    pub fn iter(&self) -> impl Iterator<Item = (StringId, &InternedString)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, rec)| (StringId(i as u32), rec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// P5 at the interner level: interning the same text any number of
        /// times always returns the same id and never grows the table past
        /// one record for it.
        #[test]
        fn repeated_interning_is_idempotent(text in "[a-z]{1,12}", reps in 1usize..8) {
            let mut interner = StringInterner::new();
            let first = interner.intern(&text);
            for _ in 0..reps {
                prop_assert_eq!(interner.intern(&text), first);
            }
            prop_assert_eq!(interner.len(), 1);
        }

        /// Distinct text always gets a distinct id, regardless of interning order.
        #[test]
        fn distinct_text_never_aliases(a in "[a-z]{1,8}", b in "[A-Z]{1,8}") {
            let mut interner = StringInterner::new();
            let id_a = interner.intern(&a);
            let id_b = interner.intern(&b);
            prop_assert_ne!(id_a, id_b);
        }
    }

    #[test]
    fn identical_text_shares_one_record() {
        let mut interner = StringInterner::new();
        let a = interner.intern("hello\n");
        let b = interner.intern("hello\n");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn distinct_text_gets_distinct_ids() {
        let mut interner = StringInterner::new();
        let a = interner.intern("foo");
        let b = interner.intern("bar");
        assert_ne!(a, b);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn ir_handle_roundtrips() {
        let mut interner = StringInterner::new();
        let id = interner.intern("x");
        assert!(interner.get(id).ir_handle().is_none());
        interner.set_ir_handle(id, "@.str.0");
        assert_eq!(interner.get(id).ir_handle(), Some("@.str.0"));
    }
}

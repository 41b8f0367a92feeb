//! Reference bookkeeping for written tokens.
//!
//! After a problem is written, the caller needs to find the token array for
//! each model attribute again to scatter solved values back. The table
//! records, per (entity kind, attribute), whether the attribute is
//! time-varying and a free-text provenance tag, and stores the tokens
//! themselves through a storage backend. Variable and constraint entries
//! for the same key coexist.
//!
//! The table is owned by the caller's model object and passed by reference
//! into the writer's bookkeeping calls; there is no ambient state.

use crate::error::{WriteError, WriteResult};
use crate::token::{TokenArray, TokenKind};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

/// Metadata kept per registered (entity kind, attribute) key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefEntry {
    /// Whether the tokens live in the time-varying (2-D) storage area.
    pub time_varying: bool,
    /// Free-text provenance, comma-joined across repeated registrations.
    pub provenance: String,
}

/// Storage backend holding the actual token arrays.
///
/// Consumers with their own model storage implement this with two areas: a
/// 1-D static table and a 2-D time-indexed table per entity kind, keyed by
/// entity-kind name and attribute name. The table does not care about the
/// backend's schema beyond these operations.
pub trait TokenStore {
    fn set(
        &mut self,
        kind: TokenKind,
        entity: &str,
        attr: &str,
        time_varying: bool,
        tokens: TokenArray,
    );

    fn get(&self, kind: TokenKind, entity: &str, attr: &str, time_varying: bool)
        -> Option<&TokenArray>;

    fn take(
        &mut self,
        kind: TokenKind,
        entity: &str,
        attr: &str,
        time_varying: bool,
    ) -> Option<TokenArray>;

    /// Drop every stored array of the given kind, or of both kinds when
    /// `None`.
    fn clear(&mut self, kind: Option<TokenKind>);
}

type StoreKey = (TokenKind, String, String);

/// In-memory [`TokenStore`] over two ordered maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    static_area: BTreeMap<StoreKey, TokenArray>,
    series_area: BTreeMap<StoreKey, TokenArray>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn area(&self, time_varying: bool) -> &BTreeMap<StoreKey, TokenArray> {
        if time_varying {
            &self.series_area
        } else {
            &self.static_area
        }
    }

    fn area_mut(&mut self, time_varying: bool) -> &mut BTreeMap<StoreKey, TokenArray> {
        if time_varying {
            &mut self.series_area
        } else {
            &mut self.static_area
        }
    }
}

impl TokenStore for MemoryStore {
    fn set(
        &mut self,
        kind: TokenKind,
        entity: &str,
        attr: &str,
        time_varying: bool,
        tokens: TokenArray,
    ) {
        self.area_mut(time_varying)
            .insert((kind, entity.to_string(), attr.to_string()), tokens);
    }

    fn get(
        &self,
        kind: TokenKind,
        entity: &str,
        attr: &str,
        time_varying: bool,
    ) -> Option<&TokenArray> {
        self.area(time_varying)
            .get(&(kind, entity.to_string(), attr.to_string()))
    }

    fn take(
        &mut self,
        kind: TokenKind,
        entity: &str,
        attr: &str,
        time_varying: bool,
    ) -> Option<TokenArray> {
        self.area_mut(time_varying)
            .remove(&(kind, entity.to_string(), attr.to_string()))
    }

    fn clear(&mut self, kind: Option<TokenKind>) {
        for area in [&mut self.static_area, &mut self.series_area] {
            match kind {
                Some(k) => area.retain(|(kind, _, _), _| *kind != k),
                None => area.clear(),
            }
        }
    }
}

/// Reference table mapping (entity kind, attribute) to stored token arrays.
#[derive(Debug, Default)]
pub struct RefTable<S: TokenStore = MemoryStore> {
    entries: BTreeMap<StoreKey, RefEntry>,
    store: S,
}

impl RefTable<MemoryStore> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: TokenStore> RefTable<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            entries: BTreeMap::new(),
            store,
        }
    }

    /// Register a token array under (entity kind, attribute).
    ///
    /// Empty token arrays are a no-op. Re-registering an existing key with a
    /// non-empty provenance appends it comma-joined and keeps the recorded
    /// storage-kind flag; re-registering without provenance overwrites the
    /// entry, flag and all, together with the stored array.
    pub fn set_ref(
        &mut self,
        entity: &str,
        attr: &str,
        tokens: TokenArray,
        time_varying: bool,
        provenance: &str,
    ) {
        if tokens.is_empty() {
            return;
        }
        let kind = tokens.kind();
        let key = (kind, entity.to_string(), attr.to_string());
        let stored_in_series = match self.entries.entry(key) {
            Entry::Occupied(mut occupied) if !provenance.is_empty() => {
                let entry = occupied.get_mut();
                entry.provenance.push_str(", ");
                entry.provenance.push_str(provenance);
                entry.time_varying
            }
            Entry::Occupied(mut occupied) => {
                occupied.insert(RefEntry {
                    time_varying,
                    provenance: String::new(),
                });
                time_varying
            }
            Entry::Vacant(vacant) => {
                vacant.insert(RefEntry {
                    time_varying,
                    provenance: provenance.to_string(),
                });
                time_varying
            }
        };
        debug!(%kind, entity, attr, count = tokens.len(), "registered reference");
        self.store.set(kind, entity, attr, stored_in_series, tokens);
    }

    /// Fetch the token array registered under (entity kind, attribute).
    pub fn get_ref(&self, kind: TokenKind, entity: &str, attr: &str) -> WriteResult<&TokenArray> {
        let entry = self.entry(kind, entity, attr)?;
        self.store
            .get(kind, entity, attr, entry.time_varying)
            .ok_or_else(|| unknown(kind, entity, attr))
    }

    /// Fetch and remove the token array, once solved values have been
    /// scattered and the raw tokens no longer need to be retained.
    pub fn take_ref(&mut self, kind: TokenKind, entity: &str, attr: &str) -> WriteResult<TokenArray> {
        let time_varying = self.entry(kind, entity, attr)?.time_varying;
        self.store
            .take(kind, entity, attr, time_varying)
            .ok_or_else(|| unknown(kind, entity, attr))
    }

    /// Entry metadata for a registered key.
    pub fn entry(&self, kind: TokenKind, entity: &str, attr: &str) -> WriteResult<&RefEntry> {
        self.entries
            .get(&(kind, entity.to_string(), attr.to_string()))
            .ok_or_else(|| unknown(kind, entity, attr))
    }

    /// Drop all stored token arrays and their entries for the given kind,
    /// or for both kinds when `None`. Used to reclaim memory after a solve.
    pub fn clear(&mut self, kind: Option<TokenKind>) {
        match kind {
            Some(k) => self.entries.retain(|(kind, _, _), _| *kind != k),
            None => self.entries.clear(),
        }
        self.store.clear(kind);
    }
}

fn unknown(kind: TokenKind, entity: &str, attr: &str) -> WriteError {
    WriteError::UnknownRef {
        kind,
        entity: entity.to_string(),
        attr: attr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use crate::token::TokenAllocator;

    fn tokens(alloc: &mut TokenAllocator, kind: TokenKind, n: usize) -> TokenArray {
        alloc.allocate(kind, Vec::new(), Shape::new(vec![n]))
    }

    #[test]
    fn set_and_get_round_trip() {
        let mut alloc = TokenAllocator::new();
        let mut table = RefTable::new();
        let vars = tokens(&mut alloc, TokenKind::Variable, 2);
        table.set_ref("Generator", "p", vars.clone(), true, "");
        let got = table.get_ref(TokenKind::Variable, "Generator", "p").unwrap();
        assert_eq!(got, &vars);
        assert!(table
            .entry(TokenKind::Variable, "Generator", "p")
            .unwrap()
            .time_varying);
    }

    #[test]
    fn var_and_con_entries_coexist() {
        let mut alloc = TokenAllocator::new();
        let mut table = RefTable::new();
        table.set_ref(
            "Generator",
            "p",
            tokens(&mut alloc, TokenKind::Variable, 1),
            false,
            "",
        );
        table.set_ref(
            "Generator",
            "p",
            tokens(&mut alloc, TokenKind::Constraint, 1),
            false,
            "",
        );
        assert!(table.get_ref(TokenKind::Variable, "Generator", "p").is_ok());
        assert!(table
            .get_ref(TokenKind::Constraint, "Generator", "p")
            .is_ok());
    }

    #[test]
    fn provenance_accumulates_without_flipping_flag() {
        let mut alloc = TokenAllocator::new();
        let mut table = RefTable::new();
        table.set_ref(
            "Generator",
            "p",
            tokens(&mut alloc, TokenKind::Variable, 1),
            true,
            "dispatchable",
        );
        table.set_ref(
            "Generator",
            "p",
            tokens(&mut alloc, TokenKind::Variable, 1),
            false,
            "extendable",
        );
        let entry = table.entry(TokenKind::Variable, "Generator", "p").unwrap();
        assert_eq!(entry.provenance, "dispatchable, extendable");
        assert!(entry.time_varying, "merge must not flip the storage flag");
    }

    #[test]
    fn empty_provenance_overwrites() {
        let mut alloc = TokenAllocator::new();
        let mut table = RefTable::new();
        table.set_ref(
            "Generator",
            "p",
            tokens(&mut alloc, TokenKind::Variable, 1),
            true,
            "dispatchable",
        );
        table.set_ref(
            "Generator",
            "p",
            tokens(&mut alloc, TokenKind::Variable, 1),
            false,
            "",
        );
        let entry = table.entry(TokenKind::Variable, "Generator", "p").unwrap();
        assert_eq!(entry.provenance, "");
        assert!(!entry.time_varying);
    }

    #[test]
    fn empty_tokens_are_a_no_op() {
        let mut alloc = TokenAllocator::new();
        let mut table = RefTable::new();
        let empty = alloc.allocate(TokenKind::Variable, Vec::new(), Shape::default());
        table.set_ref("Generator", "p", empty, false, "");
        assert!(table.get_ref(TokenKind::Variable, "Generator", "p").is_err());
    }

    #[test]
    fn take_consumes() {
        let mut alloc = TokenAllocator::new();
        let mut table = RefTable::new();
        table.set_ref(
            "Line",
            "mu_upper",
            tokens(&mut alloc, TokenKind::Constraint, 3),
            false,
            "",
        );
        let taken = table
            .take_ref(TokenKind::Constraint, "Line", "mu_upper")
            .unwrap();
        assert_eq!(taken.len(), 3);
        assert!(table
            .get_ref(TokenKind::Constraint, "Line", "mu_upper")
            .is_err());
    }

    #[test]
    fn unknown_ref_is_fatal() {
        let table = RefTable::new();
        let err = table
            .get_ref(TokenKind::Variable, "Generator", "p")
            .unwrap_err();
        assert!(matches!(err, WriteError::UnknownRef { .. }));
    }

    #[test]
    fn clear_removes_both_kinds() {
        let mut alloc = TokenAllocator::new();
        let mut table = RefTable::new();
        table.set_ref(
            "Generator",
            "p",
            tokens(&mut alloc, TokenKind::Variable, 1),
            true,
            "",
        );
        table.set_ref(
            "Bus",
            "balance",
            tokens(&mut alloc, TokenKind::Constraint, 1),
            true,
            "",
        );
        table.clear(None);
        assert!(table.get_ref(TokenKind::Variable, "Generator", "p").is_err());
        assert!(table.get_ref(TokenKind::Constraint, "Bus", "balance").is_err());
    }

    #[test]
    fn clear_can_filter_by_kind() {
        let mut alloc = TokenAllocator::new();
        let mut table = RefTable::new();
        table.set_ref(
            "Generator",
            "p",
            tokens(&mut alloc, TokenKind::Variable, 1),
            false,
            "",
        );
        table.set_ref(
            "Bus",
            "balance",
            tokens(&mut alloc, TokenKind::Constraint, 1),
            false,
            "",
        );
        table.clear(Some(TokenKind::Constraint));
        assert!(table.get_ref(TokenKind::Variable, "Generator", "p").is_ok());
        assert!(table.get_ref(TokenKind::Constraint, "Bus", "balance").is_err());
    }
}

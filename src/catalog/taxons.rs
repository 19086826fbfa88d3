//! Taxons
//!
//! The taxon hierarchy, stored in an arena keyed by [`TaxonKey`].

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use thiserror::Error;

new_key_type! {
    /// Taxon Key
    pub struct TaxonKey;
}

/// Errors raised while building a taxon tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxonError {
    /// A taxon with this code already exists.
    #[error("taxon {0} already exists")]
    DuplicateCode(String),

    /// The parent taxon does not exist.
    #[error("parent taxon {0} not found")]
    ParentNotFound(String),
}

/// A single node in the taxon tree.
#[derive(Debug, Clone)]
pub struct Taxon {
    code: String,
    name: String,
    parent: Option<TaxonKey>,
    children: SmallVec<[TaxonKey; 4]>,
}

impl Taxon {
    /// Taxon code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Taxon name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent taxon, if this is not a root.
    pub fn parent(&self) -> Option<TaxonKey> {
        self.parent
    }

    /// Direct children
    pub fn children(&self) -> &[TaxonKey] {
        &self.children
    }
}

/// Taxon hierarchy
#[derive(Debug, Default)]
pub struct TaxonTree {
    taxons: SlotMap<TaxonKey, Taxon>,
    codes: FxHashMap<String, TaxonKey>,
}

impl TaxonTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root taxon.
    ///
    /// # Errors
    ///
    /// Returns [`TaxonError::DuplicateCode`] if the code is already taken.
    pub fn add_root(&mut self, code: &str, name: &str) -> Result<TaxonKey, TaxonError> {
        self.insert(code, name, None)
    }

    /// Add a taxon under the taxon with code `parent`.
    ///
    /// # Errors
    ///
    /// - [`TaxonError::ParentNotFound`]: no taxon has the code `parent`.
    /// - [`TaxonError::DuplicateCode`]: the code is already taken.
    pub fn add_child(
        &mut self,
        parent: &str,
        code: &str,
        name: &str,
    ) -> Result<TaxonKey, TaxonError> {
        let parent_key = self
            .key(parent)
            .ok_or_else(|| TaxonError::ParentNotFound(parent.to_string()))?;

        self.insert(code, name, Some(parent_key))
    }

    fn insert(
        &mut self,
        code: &str,
        name: &str,
        parent: Option<TaxonKey>,
    ) -> Result<TaxonKey, TaxonError> {
        if self.codes.contains_key(code) {
            return Err(TaxonError::DuplicateCode(code.to_string()));
        }

        let key = self.taxons.insert(Taxon {
            code: code.to_string(),
            name: name.to_string(),
            parent,
            children: SmallVec::new(),
        });

        if let Some(parent) = parent.and_then(|parent| self.taxons.get_mut(parent)) {
            parent.children.push(key);
        }

        self.codes.insert(code.to_string(), key);

        Ok(key)
    }

    /// Look up a taxon key by code.
    pub fn key(&self, code: &str) -> Option<TaxonKey> {
        self.codes.get(code).copied()
    }

    /// Look up a taxon by key.
    pub fn get(&self, key: TaxonKey) -> Option<&Taxon> {
        self.taxons.get(key)
    }

    /// Number of taxons in the tree.
    pub fn len(&self) -> usize {
        self.taxons.len()
    }

    /// Returns whether the tree has no taxons.
    pub fn is_empty(&self) -> bool {
        self.taxons.is_empty()
    }

    /// Collect the codes of the taxon `code` and all of its descendants.
    ///
    /// Codes unknown to the tree yield just themselves.
    pub fn self_and_descendant_codes<'t>(&'t self, code: &'t str) -> FxHashSet<&'t str> {
        let mut codes = FxHashSet::default();

        match self.codes.get_key_value(code) {
            Some((known, key)) => {
                codes.insert(known.as_str());
                self.collect_descendants(*key, &mut codes);
            }
            None => {
                codes.insert(code);
            }
        }

        codes
    }

    fn collect_descendants<'t>(&'t self, key: TaxonKey, codes: &mut FxHashSet<&'t str>) {
        let Some(taxon) = self.taxons.get(key) else {
            return;
        };

        for child in &taxon.children {
            if let Some(child_taxon) = self.taxons.get(*child) {
                codes.insert(child_taxon.code.as_str());
                self.collect_descendants(*child, codes);
            }
        }
    }
}

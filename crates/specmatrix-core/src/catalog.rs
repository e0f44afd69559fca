//! Vector catalog: the canonical feature → vector set of a corpus.
//!
//! Built once per run from the corpus as it exists on disk and read-only
//! afterwards. Both corpus layouts converge on the same [`VectorCorpus`] shape.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::domain::error::CatalogError;
use crate::domain::sdk::{Domain, VectorLayout};

const VECTOR_EXTENSION: &str = ".json";
const SCHEMA_SUFFIX: &str = ".schema.json";
const EXCLUDED_FILES: [&str; 2] = ["package.json", "package-lock.json"];

/// Folder name that groups vector files under their feature directory.
const VECTORS_DIR: &str = "vectors";

/// Canonical mapping of PascalCase feature name to vector names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorCorpus {
    features: BTreeMap<String, BTreeSet<String>>,
}

impl VectorCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `root` and collect every vector file under it.
    pub fn build(root: &Path, layout: VectorLayout) -> Result<Self, CatalogError> {
        if !root.exists() {
            return Err(CatalogError::RootMissing(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(CatalogError::NotADirectory(root.to_path_buf()));
        }

        let mut corpus = Self::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| CatalogError::Walk {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf()),
                detail: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            if !is_vector_file(relative) {
                continue;
            }

            match parse_vector_path(relative, layout) {
                Some((feature, vector)) => {
                    corpus.insert(feature, vector);
                }
                None => debug!(path = %relative.display(), "vector path has no derivable feature"),
            }
        }

        info!(
            root = %root.display(),
            layout = ?layout,
            features = corpus.feature_count(),
            vectors = corpus.len(),
            "vector catalog built"
        );
        Ok(corpus)
    }

    /// Returns `false` when the pair was already present.
    pub fn insert(&mut self, feature: impl Into<String>, vector: impl Into<String>) -> bool {
        self.features
            .entry(feature.into())
            .or_default()
            .insert(vector.into())
    }

    /// Whether `(feature, vector)` is part of the corpus.
    pub fn contains(&self, feature: &str, vector: &str) -> bool {
        self.features
            .get(feature)
            .is_some_and(|vectors| vectors.contains(vector))
    }

    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// Vector names of `feature`, sorted.
    pub fn vectors(&self, feature: &str) -> Option<&BTreeSet<String>> {
        self.features.get(feature)
    }

    /// All `(feature, vector)` pairs in sorted order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.features.iter().flat_map(|(feature, vectors)| {
            vectors
                .iter()
                .map(move |vector| (feature.as_str(), vector.as_str()))
        })
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Number of `(feature, vector)` pairs.
    pub fn len(&self) -> usize {
        self.features.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// The per-domain catalogs of a run.
#[derive(Debug, Clone, Default)]
pub struct CatalogSet {
    corpora: BTreeMap<Domain, VectorCorpus>,
}

impl CatalogSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `corpus` as the catalog for `domain`, replacing any previous one.
    pub fn with(mut self, domain: Domain, corpus: VectorCorpus) -> Self {
        self.corpora.insert(domain, corpus);
        self
    }

    /// Catalog for `domain`, if one was built.
    pub fn get(&self, domain: Domain) -> Option<&VectorCorpus> {
        self.corpora.get(&domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Domain, &VectorCorpus)> {
        self.corpora.iter().map(|(domain, corpus)| (*domain, corpus))
    }
}

fn is_vector_file(relative: &Path) -> bool {
    let Some(name) = relative.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(VECTOR_EXTENSION)
        && !name.ends_with(SCHEMA_SUFFIX)
        && !EXCLUDED_FILES.contains(&name)
}

/// Derive `(feature, vector)` from a path relative to the corpus root.
pub fn parse_vector_path(relative: &Path, layout: VectorLayout) -> Option<(String, String)> {
    let segments: Vec<&str> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    let (file, dirs) = segments.split_last()?;
    let stem = file.strip_suffix(VECTOR_EXTENSION).unwrap_or(file);

    match layout {
        VectorLayout::Flat => {
            let feature = dirs.last()?;
            Some((pascal_case(feature), stem.to_string()))
        }
        VectorLayout::Nested => {
            let feature = match dirs {
                [.., feature, last] if *last == VECTORS_DIR => feature,
                [.., feature] if *feature != VECTORS_DIR => feature,
                _ => return None,
            };
            Some((pascal_case(feature), stem.replace('-', "_")))
        }
    }
}

/// `did_dht_resolve` → `DidDhtResolve`.
pub fn pascal_case(input: &str) -> String {
    input
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

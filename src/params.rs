//! Parameter space enumeration.
//!
//! A benchmark declares named parameter domains; the engine expands them into
//! the full Cartesian product of [`Binding`]s. Intermediate cross-joins run
//! through unordered sets for content dedup, so the final list is explicitly
//! sorted by a canonical fixed-width signature to keep scenario order
//! reproducible run to run.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BenchError;

/// Width of one value column inside a binding signature.
const SIGNATURE_COLUMN: usize = 20;

/// Named parameter domains for one run: parameter name to its ordered set of
/// distinct legal values. Names iterate in lexical order.
#[derive(Clone, Debug, Default)]
pub struct ParamDomain {
    domains: BTreeMap<String, Vec<String>>,
}

impl ParamDomain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare one parameter with its legal values. Duplicate values are
    /// dropped, first occurrence wins; re-declaring a name replaces it.
    pub fn insert<N, V, I>(&mut self, name: N, values: I) -> &mut Self
    where
        N: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = V>,
    {
        let mut seen = HashSet::new();
        let distinct: Vec<String> = values
            .into_iter()
            .map(Into::into)
            .filter(|v| seen.insert(v.clone()))
            .collect();
        self.domains.insert(name.into(), distinct);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.domains.get(name).map(Vec::as_slice)
    }

    /// Expand the full Cartesian product into an ordered binding list.
    ///
    /// Length equals the product of the per-domain value counts; an empty
    /// domain set yields exactly one empty binding (a single scenario). A
    /// declared parameter with zero values is a configuration error, never a
    /// silent "contributes nothing".
    pub fn enumerate(&self) -> Result<Vec<Binding>, BenchError> {
        let mut collect: HashSet<BTreeMap<String, String>> = HashSet::new();

        for (name, values) in &self.domains {
            if values.is_empty() {
                return Err(BenchError::Config(format!(
                    "parameter '{name}' declares no values"
                )));
            }

            if collect.is_empty() {
                for value in values {
                    let mut map = BTreeMap::new();
                    map.insert(name.clone(), value.clone());
                    collect.insert(map);
                }
            } else {
                let mut inject = HashSet::new();
                for partial in &collect {
                    for value in values {
                        let mut map = partial.clone();
                        map.insert(name.clone(), value.clone());
                        inject.insert(map);
                    }
                }
                collect = inject;
            }
        }

        if collect.is_empty() {
            return Ok(vec![Binding::default()]);
        }

        let mut list: Vec<Binding> = collect.into_iter().map(Binding).collect();
        // Set iteration above is unordered; the signature sort is what makes
        // scenario order reproducible.
        list.sort_by(|a, b| a.signature().cmp(&b.signature()));
        Ok(list)
    }
}

/// Split a comma-separated value list into parameter values.
pub fn value_list(text: &str) -> Vec<String> {
    text.split(',').map(str::to_string).collect()
}

/// One fully-resolved combination of parameter values: every name in the
/// domain mapped to exactly one chosen value. Compares and hashes by content
/// so it can key a run's scenario map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Binding(BTreeMap<String, String>);

impl Binding {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Fetch and parse one parameter value; missing or malformed values are
    /// configuration errors.
    pub fn get_parsed<T>(&self, name: &str) -> Result<T, BenchError>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        let raw = self
            .get(name)
            .ok_or_else(|| BenchError::Config(format!("missing parameter '{name}'")))?;
        raw.parse().map_err(|e| {
            BenchError::Config(format!("parameter '{name}': cannot parse '{raw}': {e}"))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Canonical sort key: values right-aligned into fixed-width columns,
    /// concatenated in lexical parameter-name order.
    pub fn signature(&self) -> String {
        let mut text = String::with_capacity(self.0.len() * SIGNATURE_COLUMN);
        for value in self.0.values() {
            text.push_str(&format!("{value:>width$}", width = SIGNATURE_COLUMN));
        }
        text
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{name}={value}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromIterator<(String, String)> for Binding {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Binding(iter.into_iter().collect())
    }
}

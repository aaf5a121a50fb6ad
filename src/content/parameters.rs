use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

static EMPTY_PARAMETERS: OnceLock<Parameters> = OnceLock::new();

/// Request-scoped, immutable key/value bag used to resolve URI templates.
///
/// Cloning is cheap: the map is shared between all fragment tasks of one page execution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parameters {
    params: Arc<BTreeMap<String, String>>,
}

impl Parameters {
    /// The shared empty parameters instance.
    pub fn empty() -> Parameters {
        EMPTY_PARAMETERS.get_or_init(Parameters::default).clone()
    }

    pub fn from_map(params: BTreeMap<String, String>) -> Self {
        Self {
            params: Arc::new(params),
        }
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

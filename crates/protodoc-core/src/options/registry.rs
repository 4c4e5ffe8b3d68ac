//! Plugin-provided option transforms.

use super::OptionMap;
use prost_reflect::DynamicMessage;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Converts the value of one option extension into a documentation value.
///
/// Closures of the matching signature implement this trait:
///
/// ```
/// use protodoc_core::ExtensionRegistry;
///
/// let registry = ExtensionRegistry::new().register("acme.audit", |value: &prost_reflect::Value| {
///     value.as_bool().map(serde_json::Value::Bool)
/// });
/// assert!(registry.contains("acme.audit"));
/// ```
pub trait OptionTransform: Send + Sync {
    /// Returns the value to record, or `None` to skip the extension
    fn transform(&self, value: &prost_reflect::Value) -> Option<serde_json::Value>;
}

impl<F> OptionTransform for F
where
    F: Fn(&prost_reflect::Value) -> Option<serde_json::Value> + Send + Sync,
{
    fn transform(&self, value: &prost_reflect::Value) -> Option<serde_json::Value> {
        self(value)
    }
}

/// Transforms keyed by extension full name, e.g. `validate.rules`
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    transforms: BTreeMap<String, Arc<dyn OptionTransform>>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.transforms.keys()).finish()
    }
}

impl ExtensionRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transform for the extension with the given full name
    pub fn register(
        mut self,
        extension: impl Into<String>,
        transform: impl OptionTransform + 'static,
    ) -> Self {
        self.insert(extension, transform);
        self
    }

    /// Registers a transform in place, replacing any previous one
    pub fn insert(
        &mut self,
        extension: impl Into<String>,
        transform: impl OptionTransform + 'static,
    ) {
        self.transforms.insert(extension.into(), Arc::new(transform));
    }

    /// Returns true if a transform is registered for the extension
    pub fn contains(&self, extension: &str) -> bool {
        self.transforms.contains_key(extension)
    }

    /// Registered extension names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.transforms.keys().map(String::as_str)
    }

    /// Number of registered transforms
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Runs the registered transforms over the extensions set on `options`
    pub fn apply(&self, options: &DynamicMessage) -> OptionMap {
        if self.transforms.is_empty() {
            return OptionMap::new();
        }
        options
            .extensions()
            .filter_map(|(extension, value)| {
                let name = extension.full_name();
                let transform = self.transforms.get(name)?;
                Some((name.to_string(), transform.transform(value)?))
            })
            .collect()
    }
}

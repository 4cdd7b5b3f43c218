//! Identity strategies: how collection items are matched across the
//! working and base graphs.

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use objdiff_model::Value;

/// Hash returned by [`IdentityStrategy::identity_hash`] when a strategy
/// does not derive one from its own key extraction.
pub const CONSTANT_IDENTITY_HASH: u64 = 31;

/// Decides whether a working item and a base item are the same logical
/// element.
pub trait IdentityStrategy: fmt::Debug + Send + Sync {
    /// Returns `true` if `working` and `base` denote the same element.
    fn equals(&self, working: &Value, base: &Value) -> bool;

    /// A hash consistent with [`equals`](Self::equals).
    ///
    /// The default is a constant, which is always consistent but makes
    /// hash-keyed lookups of collection-item selectors degrade to a linear
    /// scan. Strategies with a key extraction should override it.
    fn identity_hash(&self, _item: &Value) -> u64 {
        CONSTANT_IDENTITY_HASH
    }
}

pub type IdentityStrategyRef = Arc<dyn IdentityStrategy>;

/// Structural equality (`Value` equality). The default strategy.
#[derive(Clone, Copy, Debug, Default)]
pub struct EqualsIdentityStrategy;

impl EqualsIdentityStrategy {
    pub fn shared() -> IdentityStrategyRef {
        Arc::new(Self)
    }
}

impl IdentityStrategy for EqualsIdentityStrategy {
    fn equals(&self, working: &Value, base: &Value) -> bool {
        working == base
    }

    fn identity_hash(&self, item: &Value) -> u64 {
        item.hash_code()
    }
}

/// Matches beans by a fixed set of properties, regardless of how the bean
/// type defines its own equality.
#[derive(Clone, Debug)]
pub struct PropertyIdentityStrategy {
    properties: Vec<String>,
}

impl PropertyIdentityStrategy {
    pub fn new<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }

    fn key(&self, item: &Value) -> Vec<Value> {
        self.properties
            .iter()
            .map(|name| item.property(name).unwrap_or_default())
            .collect()
    }
}

impl IdentityStrategy for PropertyIdentityStrategy {
    fn equals(&self, working: &Value, base: &Value) -> bool {
        match (working, base) {
            (Value::Bean(_), Value::Bean(_)) => self.key(working) == self.key(base),
            _ => working == base,
        }
    }

    fn identity_hash(&self, item: &Value) -> u64 {
        match item {
            Value::Bean(_) => {
                let mut hasher = DefaultHasher::new();
                self.key(item).hash(&mut hasher);
                hasher.finish()
            }
            other => other.hash_code(),
        }
    }
}

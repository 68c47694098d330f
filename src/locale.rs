//! Locale-deferred text.
//!
//! Labels, descriptions and placeholders are not localized when the model is
//! built. They keep the raw text and a resolver that is called with the
//! locale the host renders for.

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A language tag such as `en` or `de-DE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag, e.g. `de` for `de-DE`.
    pub fn language(&self) -> &str {
        self.0.split(['-', '_']).next().unwrap_or(self.0.as_str())
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self("en".to_string())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type Resolver = dyn Fn(Option<&str>, &Locale) -> Option<String> + Send + Sync;

/// Raw text plus the function that localizes it.
#[derive(Clone)]
pub struct LocalizedText {
    raw: Option<String>,
    resolver: Arc<Resolver>,
}

impl LocalizedText {
    /// Text that resolves to itself for every locale.
    pub fn fixed(raw: Option<String>) -> Self {
        Self {
            raw,
            resolver: Arc::new(|raw: Option<&str>, _: &Locale| raw.map(str::to_string)),
        }
    }

    /// Text with a custom resolver, e.g. a message catalog lookup.
    pub fn with_resolver(
        raw: Option<String>,
        resolver: impl Fn(Option<&str>, &Locale) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            raw,
            resolver: Arc::new(resolver),
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn resolve(&self, locale: &Locale) -> Option<String> {
        (self.resolver)(self.raw.as_deref(), locale)
    }
}

impl fmt::Debug for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalizedText").field(&self.raw).finish()
    }
}

impl Serialize for LocalizedText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

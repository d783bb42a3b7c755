//! Temporary language switching.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::trace;

/// A translation backend with a single active language.
pub trait Translator {
    /// The currently active language code.
    fn language(&self) -> String;

    fn activate(&self, language: &str);

    /// Translate `text` into the active language.
    fn gettext(&self, text: &str) -> String;
}

/// Restores the previously active language when dropped.
#[must_use = "the previous language is restored when the guard is dropped"]
pub struct LanguageGuard<'a, T: Translator + ?Sized> {
    translator: &'a T,
    previous: String,
}

impl<T: Translator + ?Sized> Drop for LanguageGuard<'_, T> {
    fn drop(&mut self) {
        trace!(language = %self.previous, "restoring language");
        self.translator.activate(&self.previous);
    }
}

/// Activate `language` until the returned guard is dropped.
///
/// `None` keeps the current language active.
pub fn localize<'a, T>(translator: &'a T, language: Option<&str>) -> LanguageGuard<'a, T>
where
    T: Translator + ?Sized,
{
    let previous = translator.language();
    translator.activate(language.unwrap_or(previous.as_str()));
    LanguageGuard {
        translator,
        previous,
    }
}

/// Translate `text` into `language` without changing the active language.
pub fn get_translation<T>(translator: &T, text: Option<&str>, language: &str) -> Option<String>
where
    T: Translator + ?Sized,
{
    let text = text?;
    let _guard = localize(translator, Some(language));
    Some(translator.gettext(text))
}

/// In-memory message catalog keyed by (language, message).
///
/// Messages without a translation in the active language are returned
/// unchanged.
#[derive(Debug)]
pub struct Catalog {
    active: RwLock<String>,
    messages: HashMap<(String, String), String>,
}

impl Catalog {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            active: RwLock::new(default_language.into()),
            messages: HashMap::new(),
        }
    }

    pub fn with_message(
        mut self,
        language: impl Into<String>,
        text: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        self.messages
            .insert((language.into(), text.into()), translation.into());
        self
    }
}

impl Translator for Catalog {
    fn language(&self) -> String {
        self.active.read().expect("lock poisoned").clone()
    }

    fn activate(&self, language: &str) {
        *self.active.write().expect("lock poisoned") = language.to_string();
    }

    fn gettext(&self, text: &str) -> String {
        let key = (self.language(), text.to_string());
        self.messages
            .get(&key)
            .cloned()
            .unwrap_or_else(|| text.to_string())
    }
}

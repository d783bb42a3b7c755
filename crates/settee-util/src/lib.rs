//! Value and iteration helpers.
//!
//! - [`OneShot`] / [`Restartable`]: make "can this be iterated twice?" a
//!   type-level question instead of a silent empty second pass
//! - [`Lazy`]: a field computed on first access
//! - [`Memoized`]: a thread-safe memo table
//! - [`localize`] / [`LanguageGuard`]: temporarily switch the active language

pub mod i18n;
pub mod iter;
pub mod lazy;
pub mod memo;

pub use i18n::{get_translation, localize, Catalog, LanguageGuard, Translator};
pub use iter::{AlreadyConsumed, Drain, OneShot, Restartable};
pub use lazy::Lazy;
pub use memo::Memoized;

//! One-shot and restartable sequences.
//!
//! A plain iterator that has been run to completion just yields nothing on
//! a second pass, which hides bugs where a caller expected the data again.
//! [`OneShot`] reports that second pass as [`AlreadyConsumed`];
//! [`Restartable`] rebuilds the sequence from a factory on every pass.

use thiserror::Error;

/// Returned when a [`OneShot`] is iterated after it was exhausted.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("iterator already consumed")]
pub struct AlreadyConsumed;

/// A sequence that may be iterated to exhaustion exactly once.
///
/// A pass that stops early can be resumed by calling [`OneShot::iter`]
/// again; only a pass that reached the end makes later passes fail.
#[derive(Debug)]
pub struct OneShot<I> {
    inner: I,
    consumed: bool,
}

impl<I: Iterator> OneShot<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            consumed: false,
        }
    }

    /// Start (or resume) a pass.
    pub fn iter(&mut self) -> Result<Drain<'_, I>, AlreadyConsumed> {
        if self.consumed {
            return Err(AlreadyConsumed);
        }
        Ok(Drain { shot: self })
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
}

/// A pass over a [`OneShot`].
#[derive(Debug)]
pub struct Drain<'a, I> {
    shot: &'a mut OneShot<I>,
}

impl<I: Iterator> Iterator for Drain<'_, I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if self.shot.consumed {
            return None;
        }
        let item = self.shot.inner.next();
        if item.is_none() {
            self.shot.consumed = true;
        }
        item
    }
}

/// A sequence rebuilt from its factory on every pass.
///
/// Side effects of the factory run again on every pass.
#[derive(Clone)]
pub struct Restartable<F> {
    factory: F,
}

impl<F, I> Restartable<F>
where
    F: Fn() -> I,
    I: IntoIterator,
{
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// A fresh pass from the beginning.
    pub fn iter(&self) -> I::IntoIter {
        (self.factory)().into_iter()
    }
}

impl<'a, F, I> IntoIterator for &'a Restartable<F>
where
    F: Fn() -> I,
    I: IntoIterator,
{
    type Item = I::Item;
    type IntoIter = I::IntoIter;

    fn into_iter(self) -> I::IntoIter {
        self.iter()
    }
}

impl<F> std::fmt::Debug for Restartable<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Restartable").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn one_shot_fails_on_second_full_pass() {
        let mut shot = OneShot::new(0..3);
        let first: Vec<_> = shot.iter().unwrap().collect();
        assert_eq!(first, vec![0, 1, 2]);
        assert!(shot.is_consumed());
        assert_eq!(shot.iter().unwrap_err(), AlreadyConsumed);
    }

    #[test]
    fn one_shot_partial_pass_can_resume() {
        let mut shot = OneShot::new(0..4);
        let head: Vec<_> = shot.iter().unwrap().take(2).collect();
        assert_eq!(head, vec![0, 1]);
        assert!(!shot.is_consumed());
        let tail: Vec<_> = shot.iter().unwrap().collect();
        assert_eq!(tail, vec![2, 3]);
        assert!(shot.iter().is_err());
    }

    #[test]
    fn empty_one_shot_is_consumed_after_first_pass() {
        let mut shot = OneShot::new(std::iter::empty::<u8>());
        assert_eq!(shot.iter().unwrap().count(), 0);
        assert!(shot.iter().is_err());
    }

    #[test]
    fn restartable_yields_from_the_start_every_time() {
        let seq = Restartable::new(|| 0..3);
        assert_eq!(seq.iter().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!((&seq).into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
        let mut total = 0;
        for x in &seq {
            total += x;
        }
        assert_eq!(total, 3);
    }

    #[test]
    fn restartable_reruns_the_factory() {
        let calls = Cell::new(0);
        let seq = Restartable::new(|| {
            calls.set(calls.get() + 1);
            vec!["a"]
        });
        let _ = seq.iter().count();
        let _ = seq.iter().count();
        assert_eq!(calls.get(), 2);
    }
}

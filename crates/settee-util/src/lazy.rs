use std::sync::OnceLock;

/// A value computed on first access and cached for the life of its owner.
///
/// ```
/// use settee_util::Lazy;
///
/// struct Report {
///     rows: Vec<u32>,
///     total: Lazy<u32>,
/// }
///
/// impl Report {
///     fn total(&self) -> u32 {
///         *self.total.get_or_init(|| self.rows.iter().sum())
///     }
/// }
///
/// let report = Report { rows: vec![1, 2, 3], total: Lazy::new() };
/// assert_eq!(report.total(), 6);
/// ```
pub struct Lazy<T> {
    cell: OnceLock<T>,
}

impl<T> Lazy<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// The cached value, computing it with `f` on first access.
    pub fn get_or_init<F>(&self, f: F) -> &T
    where
        F: FnOnce() -> T,
    {
        self.cell.get_or_init(f)
    }

    /// Like [`Lazy::get_or_init`], but an error leaves the value uncomputed.
    pub fn get_or_try_init<F, E>(&self, f: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }
        let value = f()?;
        // A racing initializer may have won; either value is acceptable.
        Ok(self.cell.get_or_init(|| value))
    }

    /// The value if it has been computed.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Forget the cached value so the next access recomputes it.
    pub fn reset(&mut self) -> Option<T> {
        self.cell.take()
    }
}

impl<T> Default for Lazy<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        let cell = OnceLock::new();
        if let Some(value) = self.cell.get() {
            let _ = cell.set(value.clone());
        }
        Self { cell }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Lazy").field(value).finish(),
            None => f.write_str("Lazy(<uninit>)"),
        }
    }
}

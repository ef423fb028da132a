//! The producer contract: a zero-argument computation of the cached value.

/// Boxed error returned by producers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Computes the value held by a [`RefreshCache`](crate::RefreshCache).
///
/// A producer is invoked once per refresh tick and must be safe to call
/// repeatedly. Returning `Err` (or panicking) leaves the cached value untouched.
///
/// Any `Fn() -> Result<T, E>` closure is a producer:
///
/// ```ignore
/// let producer = || std::fs::read_to_string("settings.toml");
/// ```
pub trait Producer<T>: Send + Sync {
    fn produce(&self) -> Result<T, BoxError>;
}

impl<T, E, F> Producer<T> for F
where
    F: Fn() -> Result<T, E> + Send + Sync,
    E: Into<BoxError>,
{
    fn produce(&self) -> Result<T, BoxError> {
        self().map_err(Into::into)
    }
}

/// Producer wrapping a closure that cannot fail.
pub struct FromFn<F>(F);

impl<T, F> Producer<T> for FromFn<F>
where
    F: Fn() -> T + Send + Sync,
{
    fn produce(&self) -> Result<T, BoxError> {
        Ok((self.0)())
    }
}

/// Adapt an infallible closure into a [`Producer`].
pub fn from_fn<T, F>(f: F) -> FromFn<F>
where
    F: Fn() -> T + Send + Sync,
{
    FromFn(f)
}

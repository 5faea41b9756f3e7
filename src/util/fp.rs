/// Pipes a value through a function, so a result can be built at the end of a chain.
///
/// ```rust
/// use quill::util::fp::Pipe;
/// let doubled = 5.pipe(|x| x * 2);
/// assert_eq!(doubled, 10);
/// let status: Result<u16, ()> = 204.pipe(Ok);
/// assert_eq!(status, Ok(204));
/// ```
pub trait Pipe {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
        Self: Sized;
}

impl<T> Pipe for T {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
        Self: Sized,
    {
        f(self)
    }
}

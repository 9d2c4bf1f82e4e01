use crate::Context;
use std::pin::Pin;
use std::sync::Arc;

/// A shared, pinned handler.  This is the unit a [`HandlerChain`] is built
/// out of; the same middleware instance is shared between every chain that
/// inherits it.
pub type BoxHandler = Pin<Arc<dyn Handler>>;

/// An ordered, immutable sequence of handlers.  Inherited middleware comes
/// first, followed by the route's own handlers.
pub type HandlerChain = Arc<[BoxHandler]>;

#[async_trait]
/// A unit of request processing.
///
/// Handlers are run in the order of the chain they were registered in.  A
/// handler does not need to (and cannot) call the next handler itself; once
/// it returns, the next handler in the chain runs, unless the handler called
/// [`Context::abort`].
///
/// This is automatically implemented for `Fn(&mut Context) -> impl
/// IntoOutcome` types, which covers most synchronous handlers.  For handlers
/// that need to `.await`, either implement this trait, or use
/// [`crate::handlers::future`].
pub trait Handler: Send + Sync + 'static {
    /// Processes the request.  Returning an error aborts the chain; the error
    /// is then handled by the router (see [`crate::Router::recover`]).
    async fn apply(self: Pin<&Self>, context: &mut Context) -> Result<(), anyhow::Error>;

    #[doc(hidden)]
    fn describe(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", std::any::type_name::<Self>())
    }
}

impl std::fmt::Debug for dyn Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.describe(f)
    }
}

#[async_trait]
impl<F, Res> Handler for F
where
    F: Fn(&mut Context) -> Res + Send + Sync + 'static,
    Res: IntoOutcome + Send + 'static,
{
    async fn apply(self: Pin<&Self>, context: &mut Context) -> Result<(), anyhow::Error> {
        (*self)(context).into_outcome()
    }
}

/// Converts the return value of a synchronous handler into the outcome of
/// that handler.
///
/// Implemented for `()` (always successful) and for `Result<(), E>` where
/// `E` converts into an [`anyhow::Error`].
pub trait IntoOutcome {
    /// Converts the value into the handler's outcome.
    fn into_outcome(self) -> Result<(), anyhow::Error>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

impl<E> IntoOutcome for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_outcome(self) -> Result<(), anyhow::Error> {
        self.map_err(Into::into)
    }
}

/// Boxes a handler so it can be placed in a chain.
///
/// # Examples
/// ```rust
/// # use thicket::*;
/// fn ping(context: &mut Context) {
///     context.text(http::StatusCode::OK, "pong");
/// }
///
/// let mut http = thicket::http();
/// http.register("GET", "/ping", vec![thicket::boxed(ping)]).unwrap();
/// ```
pub fn boxed<H: Handler>(handler: H) -> BoxHandler {
    Arc::pin(handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_conversion() {
        assert!(().into_outcome().is_ok());
        assert!(Ok::<_, std::io::Error>(()).into_outcome().is_ok());
        let failed: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "nope"));
        assert_eq!(failed.into_outcome().unwrap_err().to_string(), "nope");
    }

    #[test]
    fn describe_names_the_type() {
        fn noop(_: &mut Context) {}
        let handler = boxed(noop);
        let name = format!("{:?}", &*handler);
        assert!(name.contains("noop"), "{}", name);
    }
}

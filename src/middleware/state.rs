use std::pin::Pin;

use crate::{Context, Handler};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A state value from the state middleware.
///
/// This wraps state values for inserting into the request extensions, so that
/// they cannot collide with other extensions of the same type.  It is easily
/// dereferencable into the inner type; handlers usually read it through
/// [`Context::state`].
pub struct State<T>(pub T);

impl<T> State<T> {
    /// Turns the given state into its inner value, consuming the state.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::middleware::State;
    /// let state = State(123u32);
    /// assert_eq!(state.into_inner(), 123u32);
    /// ```
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for State<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Clone)]
/// The middleware for inserting state into a request.
///
/// This inserts a clone of the state value into the request every time it
/// runs, before the rest of the chain.  You can attach as many state
/// middlewares as you like, as long as the inner type `T` does not overlap
/// (otherwise, the later value wins).
///
/// It is recommended to wrap the value in a reference-counting type, like
/// [`std::sync::Arc`], if it is expensive to clone.
///
/// # Examples
/// ```rust
/// # use thicket::*;
/// # use std::sync::Arc;
/// # use std::sync::atomic::{AtomicU32, Ordering};
/// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
/// let hits = Arc::new(AtomicU32::new(0));
/// let mut http = thicket::http();
/// http.with(thicket::middleware::StateMiddleware::new(hits.clone()));
/// http.at("/hit").get(|context: &mut Context| {
///     if let Some(hits) = context.state::<Arc<AtomicU32>>() {
///         hits.fetch_add(1, Ordering::SeqCst);
///     }
/// })?;
/// http.handle(Request::get("/hit")?).await?;
/// http.handle(Request::get("/hit")?).await?;
/// assert_eq!(hits.load(Ordering::SeqCst), 2);
/// # Ok(())
/// # }
/// ```
pub struct StateMiddleware<T>(T);

impl<T> StateMiddleware<T> {
    /// Creates an instance of the state middleware with the given value.
    pub fn new(value: T) -> Self {
        StateMiddleware(value)
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Handler for StateMiddleware<T> {
    async fn apply(self: Pin<&Self>, context: &mut Context) -> Result<(), anyhow::Error> {
        context
            .request_mut()
            .extensions_mut()
            .insert(State(self.0.clone()));
        Ok(())
    }

    fn describe(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl<T> std::fmt::Debug for StateMiddleware<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = std::any::type_name::<T>();

        f.debug_tuple("StateMiddleware").field(&name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Request;

    #[tokio::test]
    async fn later_state_wins() {
        let mut http = crate::http();
        http.with(StateMiddleware::new(1u8));
        http.at("/")
            .with(StateMiddleware::new(2u8))
            .get(|context: &mut Context| {
                let value = context.state::<u8>().copied().unwrap_or_default();
                context.write(value.to_string());
            })
            .unwrap();
        let response = http.handle(Request::get("/").unwrap()).await.unwrap();
        assert_eq!(response.body(), b"2");
    }
}

//! Pre-defined handlers.
//!
//! This module defines a few handler constructors that might be useful for a
//! given HTTP application.  Their use should be as simple as this:
//!
//! ```rust
//! # use thicket::*;
//! # fn main() -> Result<(), anyhow::Error> {
//! let mut http = thicket::http();
//! http.at("/home").get(thicket::handlers::sync(|context| {
//!     context.text(http::StatusCode::OK, "hello, there!");
//! }))?;
//! # Ok(())
//! # }
//! ```

mod future;
mod sync;

pub(crate) use self::future::FutureHandler;
pub(crate) use self::sync::SyncHandler;
use crate::handler::IntoOutcome;
use crate::{Context, Handler};
use futures::future::BoxFuture;

/// Creates a handler from a synchronous closure.
///
/// Closures already implement [`Handler`]; however, a closure passed directly
/// to a generic function needs its argument type spelled out
/// (`|context: &mut Context| ..`).  Wrapping it in this function lets the
/// compiler infer the argument type instead.
///
/// # Examples
///
/// ```rust
/// # use thicket::*;
/// # fn main() -> Result<(), anyhow::Error> {
/// let mut http = thicket::http();
/// http.at("/teapot").get(thicket::handlers::sync(|context| {
///     context.text(http::StatusCode::IM_A_TEAPOT, "short and stout");
/// }))?;
/// # Ok(())
/// # }
/// ```
pub fn sync<F, Res>(func: F) -> impl Handler
where
    F: Fn(&mut Context) -> Res + Send + Sync + 'static,
    Res: IntoOutcome + Send + 'static,
{
    SyncHandler(func)
}

/// Creates a handler from a closure returning a boxed future.
///
/// The future borrows the context for as long as it runs, which lets the
/// handler `.await` (e.g. on reading the request body) while still writing to
/// the response afterwards.
///
/// # Examples
///
/// ```rust
/// # use thicket::*;
/// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
/// let mut http = thicket::http();
/// http.at("/echo").post(thicket::handlers::future(|context| {
///     Box::pin(async move {
///         let body = context.body_text().await?;
///         context.text(http::StatusCode::OK, body);
///         Ok::<_, anyhow::Error>(())
///     })
/// }))?;
/// let request = Request::post("/echo")?.with_body("hello");
/// let response = http.handle(request).await?;
/// assert_eq!(response.body(), b"hello");
/// # Ok(())
/// # }
/// ```
pub fn future<F>(func: F) -> impl Handler
where
    F: for<'c> Fn(&'c mut Context) -> BoxFuture<'c, Result<(), anyhow::Error>>
        + Send
        + Sync
        + 'static,
{
    FutureHandler(func)
}

/// Creates a handler that responds with an empty body and the given status,
/// then aborts the chain.
///
/// This is best used as a [`crate::Router::fallback`].
///
/// # Examples
///
/// ```rust
/// # use thicket::*;
/// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
/// let mut http = thicket::http();
/// http.fallback(thicket::handlers::status(http::StatusCode::GONE));
/// let response = http.handle(Request::get("/missing")?).await?;
/// assert_eq!(response.status(), http::StatusCode::GONE);
/// # Ok(())
/// # }
/// ```
pub fn status(status: http::StatusCode) -> impl Handler {
    SyncHandler(move |context: &mut Context| {
        context.status(status);
        context.abort();
    })
}

//! Pre-defined middleware.
//!
//! Middleware are ordinary [`crate::Handler`]s that sit early in a chain: they
//! annotate the request, or look at it and decide whether to
//! [`crate::Context::abort`].  Attach them to the whole router, or to a single
//! group:
//!
//! ```rust
//! # use thicket::*;
//! # fn main() -> Result<(), anyhow::Error> {
//! let mut http = thicket::http();
//! http.with(thicket::middleware::TraceMiddleware::new());
//! http.at("/admin")
//!     .with(thicket::middleware::StateMiddleware::new("admin"))
//!     .get(thicket::handlers::status(http::StatusCode::NO_CONTENT))?;
//! # Ok(())
//! # }
//! ```

mod state;
mod trace;

pub use self::state::{State, StateMiddleware};
pub use self::trace::TraceMiddleware;

//! Thicket is an embeddable HTTP request router.  It matches a request's
//! method and path against a tree of path segments, and runs the chain of
//! handlers registered for the route it found.  Handlers run one after the
//! other, share a request [`Context`], and any of them can stop the chain
//! early with [`Context::abort`].  Thicket is based on Tokio and hyper.
//!
//! # Getting Started
//! To get started, just add thicket and tokio to your `Cargo.toml`:
//!
//! ```toml
//! thicket = "0.1.0"
//! tokio = { version = "1.26.0", features = ["full"] } # or whatever the latest version is
//! ```
//!
//! # Examples
//! ```rust,no_run
//! use thicket::Context;
//!
//! fn hello_world(context: &mut Context) {
//!     context.text(http::StatusCode::OK, "hello, world!");
//! }
//!
//! fn hello_user(context: &mut Context) {
//!     let name = context.param("name").unwrap_or("stranger").to_owned();
//!     context.text(http::StatusCode::OK, format!("hello, {}!", name));
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), anyhow::Error> {
//!     let mut http = thicket::http();
//!     http.with(thicket::middleware::TraceMiddleware::new()).recover();
//!     http.at("/").get(hello_world)?;
//!     http.at("/hello/:name").get(hello_user)?;
//!     http.listen("0.0.0.0:8080").await?;
//!     Ok(())
//! }
//! ```
#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]
#![deny(clippy::correctness, unused_must_use)]
#![cfg_attr(nightly, feature(doc_cfg))]

#[macro_use]
extern crate async_trait;

mod context;
mod data;
mod error;
mod handler;
pub mod handlers;
pub mod middleware;
mod request;
mod response;
mod router;

#[cfg(feature = "cookie")]
#[cfg_attr(nightly, doc(cfg(feature = "cookie")))]
pub use cookie::{Cookie, CookieJar};

pub use self::context::{Context, Keys, Params};
pub use self::data::DataStream;
pub use self::error::ThicketError;
pub use self::handler::{boxed, BoxHandler, Handler, HandlerChain, IntoOutcome};
pub use self::request::{Query, Request};
pub use self::response::Response;
pub use self::router::{Path, Resolved, RouteInfo, Router, DEFAULT_BODY_LIMIT};

#[cfg(feature = "multipart")]
#[cfg_attr(nightly, doc(cfg(feature = "multipart")))]
pub use self::context::{FormFile, MultipartForm};
#[cfg(feature = "multipart")]
#[cfg_attr(nightly, doc(cfg(feature = "multipart")))]
pub use self::router::DEFAULT_MULTIPART_MEMORY;

pub use ::http;
pub use hyper::Body;

#[must_use]
#[inline]
/// This creates a new HTTP router.  This is a shortcut for [`Router::default`].
pub fn http() -> Router {
    Router::default()
}

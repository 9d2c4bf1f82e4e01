mod path;
mod service;
mod tree;

pub(crate) use self::path::join_paths;
pub use self::path::Path;
pub use self::tree::{Resolved, RouteInfo};
use self::tree::RouteTable;
use crate::context::Params;
use crate::handler::{boxed, BoxHandler, Handler, HandlerChain};
use crate::{Context, Request, Response, ThicketError};
use tokio::sync::watch;

/// The default limit on request bodies read through [`Context`], in bytes.
pub const DEFAULT_BODY_LIMIT: u64 = 40 << 20;

/// The default limit on multipart bodies parsed through
/// [`Context::multipart`], in bytes.
#[cfg(feature = "multipart")]
pub const DEFAULT_MULTIPART_MEMORY: u64 = 40 << 20;

/// Per-router settings every [`Context`] carries.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Options {
    pub(crate) recover: bool,
    pub(crate) body_limit: u64,
    #[cfg(feature = "multipart")]
    pub(crate) multipart_memory: u64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            recover: false,
            body_limit: DEFAULT_BODY_LIMIT,
            #[cfg(feature = "multipart")]
            multipart_memory: DEFAULT_MULTIPART_MEMORY,
        }
    }
}

/// An HTTP router.
///
/// This contains one routing tree per method, and the handler chains the
/// routes point to.  Paths are split on `/` into segments; a segment starting
/// with `:` is a parameter, matching any single segment and binding it,
/// percent-decoded, under its name.  At every position, a literal segment is preferred over a
/// parameter:
///
/// ```text
/// GET /user/:id       -> show_user
/// GET /user/:id/posts -> user_posts
/// GET /about          -> about
/// ```
///
/// Lookups never backtrack, so registration refuses to put a literal and a
/// parameter at the same position of one tree.  Registering `GET /user/me`
/// next to `GET /user/:id` fails with [`ThicketError::RouteConflict`].  In
/// exchange, lookup time only depends on the number of segments in the path.
///
/// Each route runs a chain of handlers: the middleware that was attached
/// (through [`Router::with`] or [`Path::with`]) before the route was
/// registered, followed by the route's own handlers.  Any handler can stop
/// the chain with [`Context::abort`].
///
/// # Examples
/// ```rust
/// # use thicket::*;
/// fn auth(context: &mut Context) {
///     if context.param("id") != Some("Hello") {
///         context.text(http::StatusCode::NOT_FOUND, "param should be Hello");
///         context.abort();
///     }
/// }
///
/// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
/// let mut http = thicket::http();
/// http.at("/ping").get(|context: &mut Context| {
///     context.text(http::StatusCode::OK, "pong");
/// })?;
/// http.at("/p/:id").with(auth).get(|context: &mut Context| {
///     let keyword = context.query("q").unwrap_or_default().to_owned();
///     context.text(http::StatusCode::OK, keyword);
/// })?;
///
/// let response = http.handle(Request::get("/p/Hello?q=world")?).await?;
/// assert_eq!(response.body(), b"world");
/// let response = http.handle(Request::get("/nope")?).await?;
/// assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
/// # Ok(())
/// # }
/// ```
pub struct Router {
    table: RouteTable,
    middleware: Vec<BoxHandler>,
    fallback: Option<HandlerChain>,
    options: Options,
    quiet: bool,
    terminate: Option<watch::Receiver<bool>>,
}

impl Default for Router {
    fn default() -> Self {
        Router {
            table: RouteTable::default(),
            middleware: vec![],
            fallback: None,
            options: Options::default(),
            quiet: false,
            terminate: None,
        }
    }
}

impl Router {
    /// Creates a [`Path`] at the provided prefix.  See [`Path::at`] for more.
    pub fn at<P: AsRef<str>>(&mut self, prefix: P) -> Path<'_> {
        Path::new(
            join_paths("", prefix.as_ref()),
            self.middleware.clone(),
            &mut self.table,
        )
    }

    /// Creates a [`Path`] at the provided prefix, and executes the provided
    /// closure with it.  See [`Path::under`] for more.
    ///
    /// # Errors
    /// Returns the first error the closure returns.
    pub fn under<P, F>(&mut self, prefix: P, build: F) -> Result<&mut Self, ThicketError>
    where
        P: AsRef<str>,
        F: FnOnce(&mut Path<'_>) -> Result<(), ThicketError>,
    {
        {
            let mut path = self.at(prefix);
            build(&mut path)?;
        }
        Ok(self)
    }

    /// Appends middleware to the router.  Each middleware is executed in the
    /// order that it is appended to the router (i.e., the first middleware
    /// inserted executes first).  Only routes, groups and fallbacks created
    /// after this call include it.
    ///
    /// # Examples
    /// ```rust
    /// let mut http = thicket::http();
    /// http.with(thicket::middleware::TraceMiddleware::new())
    ///     .with(thicket::middleware::StateMiddleware::new(123u32));
    /// ```
    pub fn with<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.middleware.push(boxed(handler));
        self
    }

    /// Registers a chain of handlers for the given method and path.  The
    /// router's middleware is placed in front of them.
    ///
    /// # Errors
    /// See [`Path::register`].
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// let mut http = thicket::http();
    /// http.register("GET", "/user/:id", vec![]).unwrap();
    /// let error = http.register("GET", "/user/me", vec![]).unwrap_err();
    /// assert!(matches!(error, ThicketError::RouteConflict { .. }));
    /// ```
    pub fn register(
        &mut self,
        method: &str,
        path: &str,
        handlers: Vec<BoxHandler>,
    ) -> Result<&mut Self, ThicketError> {
        self.at(path).register(method, handlers)?;
        Ok(self)
    }

    /// Looks up the route for the given method and path, without running
    /// anything.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// # fn main() -> Result<(), anyhow::Error> {
    /// let mut http = thicket::http();
    /// http.at("/message/:a/:b").get(thicket::handlers::status(http::StatusCode::OK))?;
    /// let resolved = http.resolve("GET", "/message/x/y").unwrap();
    /// assert_eq!(resolved.route(), Some("/message/:a/:b"));
    /// assert_eq!(resolved.params().get("b"), Some("y"));
    /// assert!(http.resolve("POST", "/message/x/y").is_none());
    /// # Ok(())
    /// # }
    /// ```
    pub fn resolve(&self, method: &str, path: &str) -> Option<Resolved> {
        self.table.resolve(method, path)
    }

    /// Every registered route, sorted by descending path length, then
    /// alphabetically.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.table.routes()
    }

    /// Sets a fallback handler.  If no route matches the request, this
    /// runs instead, after the router's middleware.  Without a fallback, the
    /// router responds with `404 page not found`.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
    /// let mut http = thicket::http();
    /// http.at("/foo").get(thicket::handlers::status(http::StatusCode::NO_CONTENT))?;
    /// http.fallback(|context: &mut Context| {
    ///     context.text(http::StatusCode::NOT_FOUND, "nothing here");
    /// });
    /// let response = http.handle(Request::get("/foo")?).await?;
    /// assert_eq!(response.status(), http::StatusCode::NO_CONTENT);
    /// let response = http.handle(Request::get("/bar")?).await?;
    /// assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
    /// assert_eq!(response.body(), b"nothing here");
    /// # Ok(())
    /// # }
    /// ```
    pub fn fallback<H: Handler>(&mut self, handler: H) -> &mut Self {
        let chain = self
            .middleware
            .iter()
            .cloned()
            .chain(std::iter::once(boxed(handler)))
            .collect::<Vec<_>>();
        self.fallback = Some(chain.into());
        self
    }

    /// Enables recovery.  A handler that panics or returns an error then
    /// stops the chain, is logged, and the client receives a plain `500
    /// Internal Server Error` instead of whatever was written so far.
    /// Without recovery, handler errors are returned from
    /// [`Router::handle`], and panics unwind into the caller.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
    /// let mut http = thicket::http();
    /// http.recover();
    /// http.at("/boom").get(|_: &mut Context| -> Result<(), anyhow::Error> {
    ///     anyhow::bail!("no database")
    /// })?;
    /// let response = http.handle(Request::get("/boom")?).await?;
    /// assert_eq!(response.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    /// # Ok(())
    /// # }
    /// ```
    pub fn recover(&mut self) -> &mut Self {
        self.options.recover = true;
        self
    }

    /// Sets the limit, in bytes, on request bodies read through
    /// [`Context::body_bytes`] and its siblings.  Defaults to
    /// [`DEFAULT_BODY_LIMIT`].
    pub fn body_limit(&mut self, limit: u64) -> &mut Self {
        self.options.body_limit = limit;
        self
    }

    /// Sets the limit, in bytes, on `multipart/form-data` bodies parsed
    /// through [`Context::multipart`].  Parsed forms are held in memory, so
    /// this bounds what a single upload can take.  Defaults to
    /// [`DEFAULT_MULTIPART_MEMORY`].
    #[cfg(feature = "multipart")]
    #[cfg_attr(nightly, doc(cfg(feature = "multipart")))]
    pub fn multipart_memory(&mut self, limit: u64) -> &mut Self {
        self.options.multipart_memory = limit;
        self
    }

    /// Whether [`Router::listen`] logs the route table on startup.  Not
    /// quiet by default.
    pub fn quiet(&mut self, quiet: bool) -> &mut Self {
        self.quiet = quiet;
        self
    }

    /// A channel to handle the termination singal.  By default, the router does
    /// not terminate, at least not gracefully, even in the face of
    /// SIGINT/SIGTERM.  This allows you to signal to the router when it should
    /// terminate, and it will gracefully shut down, letting all current
    /// requests finish before exiting.  Note that the return type is not
    /// `Clone`, and dropping the sender will not terminate the router.
    /// [`Router::listen_graceful`] wires this up to SIGINT/SIGTERM.
    ///
    /// Note this only applies to the router when listening, and not when
    /// handling a single request.
    pub fn termination_signal(&mut self) -> watch::Sender<bool> {
        let (tx, rx) = watch::channel(false);
        self.terminate = Some(rx);
        tx
    }

    /// Handles a one-off request to the router.  The route is resolved, its
    /// chain run, and the response it wrote returned.
    ///
    /// # Errors
    /// Returns the error of a failing handler, unless recovery is enabled
    /// (see [`Router::recover`]).  A request that matches no route is not an
    /// error.
    pub async fn handle(&self, request: Request) -> Result<Response, anyhow::Error> {
        let start = std::time::Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_owned();

        let resolved = self.table.resolve(method.as_str(), &path).or_else(|| {
            self.fallback.clone().map(|handlers| Resolved {
                handlers,
                params: Params::default(),
                route: None,
            })
        });

        let resolved = match resolved {
            Some(resolved) => resolved,
            None => {
                log::trace!("{} {} --> (none)", method, path);
                return Ok(Response::not_found());
            }
        };

        log::trace!(
            "{} {} --> {} ({} handlers)",
            method,
            path,
            resolved.route().unwrap_or("fallback"),
            resolved.handlers().len()
        );
        let mut context = Context::new(request, resolved, self.options);
        context.dispatch().await?;
        let response = context.into_response();
        log::debug!(
            "{} {}: {} (in {}ms)",
            method,
            path,
            response.status(),
            start.elapsed().as_millis()
        );
        Ok(response)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.table.routes())
            .field("middleware", &self.middleware)
            .field("fallback", &self.fallback.is_some())
            .field("recover", &self.options.recover)
            .field("body_limit", &self.options.body_limit)
            .finish()
    }
}

use super::tree::RouteTable;
use crate::handler::{boxed, BoxHandler, Handler};
use crate::ThicketError;

/// A route group: a path prefix plus the middleware that routes under it
/// inherit.
///
/// This is generated when you call [`crate::Router::at`], and it contains the
/// passed prefix from that function.  Here, you can register the handlers to
/// run for each method at that prefix, attach middleware, and open nested
/// groups.  Every chain registered through a group starts with the
/// middleware the group held at the time of registration.
///
/// # Examples
/// ```rust
/// # use thicket::*;
/// fn user_index(context: &mut Context) { context.text(http::StatusCode::OK, "index"); }
/// fn user_show(context: &mut Context) { context.text(http::StatusCode::OK, "show"); }
/// fn user_update(context: &mut Context) { context.text(http::StatusCode::OK, "update"); }
/// # fn main() -> Result<(), anyhow::Error> {
/// let mut http = thicket::http();
/// let mut base = http.at("/user");
/// base.get(user_index)?;
/// base.at("/:id").get(user_show)?.post(user_update)?;
/// # Ok(())
/// # }
/// ```
pub struct Path<'a> {
    prefix: String,
    middleware: Vec<BoxHandler>,
    table: &'a mut RouteTable,
}

macro_rules! method {
    ($($(#[$m:meta])* $v:vis fn $n:ident = $meth:expr;)+) => {
        $(
            $(#[$m])*
            ///
            /// # Errors
            /// Fails if the route conflicts with one already registered.  See
            /// [`Path::register`].
            $v fn $n<H: Handler>(&mut self, handler: H) -> Result<&mut Self, ThicketError> {
                self.method($meth, handler)
            }
        )+
    };
}

impl<'a> Path<'a> {
    pub(super) fn new(
        prefix: String,
        middleware: Vec<BoxHandler>,
        table: &'a mut RouteTable,
    ) -> Self {
        Path {
            prefix,
            middleware,
            table,
        }
    }

    /// The full prefix of this group.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// This appends to the prefix, creating a new [`Path`] from the current
    /// one and the given supplemental prefix.  The new path starts with a
    /// copy of this group's middleware.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// let mut http = thicket::http();
    /// let mut api = http.at("/api");
    /// assert_eq!(api.at("v1/").prefix(), "/api/v1/");
    /// assert_eq!(api.at("").prefix(), "/api");
    /// ```
    pub fn at<P: AsRef<str>>(&mut self, path: P) -> Path<'_> {
        Path {
            prefix: join_paths(&self.prefix, path.as_ref()),
            middleware: self.middleware.clone(),
            table: self.table,
        }
    }

    /// Creates a nested [`Path`] with the given prefix, and hands it to the
    /// given closure.  This allows for a more natural way of nesting groups.
    ///
    /// # Errors
    /// Returns the first error the closure returns.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// # use thicket::handlers::status;
    /// # fn main() -> Result<(), anyhow::Error> {
    /// let mut http = thicket::http();
    /// http.under("/user", |base| {
    ///     base.get(status(http::StatusCode::OK))?;
    ///     base.at("/:id").get(status(http::StatusCode::OK))?;
    ///     Ok(())
    /// })?;
    /// assert_eq!(http.routes().len(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn under<P, F>(&mut self, path: P, build: F) -> Result<&mut Self, ThicketError>
    where
        P: AsRef<str>,
        F: FnOnce(&mut Path<'_>) -> Result<(), ThicketError>,
    {
        {
            let mut path = self.at(path);
            build(&mut path)?;
        }
        Ok(self)
    }

    /// Appends middleware to this group.  Routes registered through this
    /// group afterwards, and groups opened from it afterwards, run it after
    /// the middleware they already inherited.
    pub fn with<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.middleware.push(boxed(handler));
        self
    }

    /// Registers a chain of handlers at the current prefix, for the given
    /// method.  The group's middleware is placed in front of them.
    ///
    /// # Errors
    /// Fails with [`ThicketError::InvalidMethod`] if the method isn't
    /// uppercase letters only; [`ThicketError::InvalidParameter`] for a
    /// parameter name repeated within the path; [`ThicketError::RouteConflict`]
    /// if a parameter and a literal segment would share a position; and
    /// [`ThicketError::DuplicateRoute`] if the
    /// method and path are already registered.  The route table is left
    /// unchanged in all of these cases.
    pub fn register<M, I>(&mut self, method: M, handlers: I) -> Result<&mut Self, ThicketError>
    where
        M: AsRef<str>,
        I: IntoIterator<Item = BoxHandler>,
    {
        let chain = self
            .middleware
            .iter()
            .cloned()
            .chain(handlers)
            .collect::<Vec<_>>();
        self.table
            .insert(method.as_ref(), &self.prefix, chain.into())?;
        Ok(self)
    }

    /// Registers a single handler at the current prefix, for the given
    /// method.  See [`Path::register`].
    ///
    /// # Errors
    /// See [`Path::register`].
    pub fn method<M: AsRef<str>, H: Handler>(
        &mut self,
        method: M,
        handler: H,
    ) -> Result<&mut Self, ThicketError> {
        self.register(method, [boxed(handler)])
    }

    method![
        /// Registers a handler for `GET` requests at the current prefix.
        ///
        /// # Examples
        /// ```rust
        /// # use thicket::*;
        /// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
        /// let mut http = thicket::http();
        /// http.at("/user").get(thicket::handlers::status(http::StatusCode::NO_CONTENT))?;
        /// let response = http.handle(Request::get("/user")?).await?;
        /// assert_eq!(response.status(), http::StatusCode::NO_CONTENT);
        /// # Ok(())
        /// # }
        /// ```
        pub fn get = http::Method::GET;
        /// Registers a handler for `POST` requests at the current prefix.
        pub fn post = http::Method::POST;
        /// Registers a handler for `PUT` requests at the current prefix.
        pub fn put = http::Method::PUT;
        /// Registers a handler for `DELETE` requests at the current prefix.
        pub fn delete = http::Method::DELETE;
        /// Registers a handler for `PATCH` requests at the current prefix.
        pub fn patch = http::Method::PATCH;
        /// Registers a handler for `HEAD` requests at the current prefix.
        pub fn head = http::Method::HEAD;
        /// Registers a handler for `OPTIONS` requests at the current prefix.
        pub fn options = http::Method::OPTIONS;
        /// Registers a handler for `TRACE` requests at the current prefix.
        pub fn trace = http::Method::TRACE;
        /// Registers a handler for `CONNECT` requests at the current prefix.
        pub fn connect = http::Method::CONNECT;
    ];
}

impl std::fmt::Debug for Path<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Path")
            .field("prefix", &self.prefix)
            .field("middleware", &self.middleware)
            .finish()
    }
}

/// Joins a group prefix and a relative path.  Separators collapse, an empty
/// relative path leaves the prefix as it is, and a trailing separator on the
/// relative path is kept.  `.` and `..` are plain segments.
pub(crate) fn join_paths(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return if base.is_empty() {
            String::from("/")
        } else {
            base.to_owned()
        };
    }

    let mut buffer = String::with_capacity(base.len() + relative.len() + 2);
    for segment in base
        .split('/')
        .chain(relative.split('/'))
        .filter(|s| !s.is_empty())
    {
        buffer.push('/');
        buffer.push_str(segment);
    }

    if buffer.is_empty() || relative.ends_with('/') {
        buffer.push('/');
    }

    buffer.shrink_to_fit();
    buffer
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Context, Request};

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("", "/id"), "/id");
        assert_eq!(join_paths("", "id"), "/id");
        assert_eq!(join_paths("", ""), "/");
        assert_eq!(join_paths("", "/"), "/");
        assert_eq!(join_paths("/user", "/id"), "/user/id");
        assert_eq!(join_paths("/user/", "/id"), "/user/id");
        assert_eq!(join_paths("/user/", "id"), "/user/id");
        assert_eq!(join_paths("/user//", "//id"), "/user/id");
        assert_eq!(join_paths("/api", "v1/"), "/api/v1/");
        assert_eq!(join_paths("/api/", ""), "/api/");
        assert_eq!(join_paths("/api", ""), "/api");
        assert_eq!(join_paths("/api", "/"), "/api/");
        assert_eq!(join_paths("/a", "../b"), "/a/../b");
    }

    fn writes(text: &'static str) -> impl Handler {
        move |context: &mut Context| context.write(text)
    }

    #[tokio::test]
    async fn group_middleware_is_inherited() {
        let mut http = crate::http();
        http.with(writes("r"));
        {
            let mut admin = http.at("/admin");
            admin.with(writes("a"));
            admin.at("/users").with(writes("u")).get(writes("!")).unwrap();
            admin.get(writes("!")).unwrap();
        }
        http.at("/open").get(writes("!")).unwrap();

        let body = |response: crate::Response| String::from_utf8(response.body().to_vec()).unwrap();
        let response = http.handle(Request::get("/admin/users").unwrap()).await.unwrap();
        assert_eq!(body(response), "rau!");
        let response = http.handle(Request::get("/admin").unwrap()).await.unwrap();
        assert_eq!(body(response), "ra!");
        let response = http.handle(Request::get("/open").unwrap()).await.unwrap();
        assert_eq!(body(response), "r!");
    }

    #[tokio::test]
    async fn middleware_applies_only_to_later_routes() {
        let mut http = crate::http();
        let mut group = http.at("/g");
        group.at("/before").get(writes("!")).unwrap();
        group.with(writes("m"));
        group.at("/after").get(writes("!")).unwrap();

        let response = http.handle(Request::get("/g/before").unwrap()).await.unwrap();
        assert_eq!(response.body(), b"!");
        let response = http.handle(Request::get("/g/after").unwrap()).await.unwrap();
        assert_eq!(response.body(), b"m!");
    }

    #[tokio::test]
    async fn register_takes_whole_chains() {
        let mut http = crate::http();
        http.at("/multi")
            .register("GET", vec![boxed(writes("1")), boxed(writes("2"))])
            .unwrap()
            .method("PURGE", writes("p"))
            .unwrap();
        let response = http.handle(Request::get("/multi").unwrap()).await.unwrap();
        assert_eq!(response.body(), b"12");
        let purge = http::Method::from_bytes(b"PURGE").unwrap();
        let response = http
            .handle(Request::from_method("/multi", purge).unwrap())
            .await
            .unwrap();
        assert_eq!(response.body(), b"p");
    }

    #[test]
    fn under_propagates_errors() {
        let mut http = crate::http();
        let result = http.under("/x", |path| {
            path.get(writes("1"))?;
            path.get(writes("2"))?;
            Ok(())
        });
        assert!(matches!(result, Err(ThicketError::DuplicateRoute { .. })));
        assert_eq!(http.routes().len(), 1);
    }
}

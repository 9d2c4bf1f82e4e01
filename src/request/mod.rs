mod query;

pub use self::query::Query;
use std::convert::TryFrom;
use std::net::SocketAddr;

macro_rules! forward {
    () => {};
    (
        $(#[$m:meta])* $v:vis fn $name:ident(&self $(, $pn:ident: $pt:ty)*) -> $ret:ty;
        $($tail:tt)*
    ) => {
        $(#[$m])* $v fn $name(&self $(, $pn: $pt)*) -> $ret {
            (self.0).$name($($pn),*)
        }

        forward! { $($tail)* }
    };

    (
        $(#[$m:meta])* $v:vis fn $name:ident(&mut self $(, $pn:ident: $pt:ty)*) -> $ret:ty;
        $($tail:tt)*
    ) => {
        $(#[$m])* $v fn $name(&mut self $(, $pn: $pt)*) -> $ret {
            (self.0).$name($($pn),*)
        }

        forward! { $($tail)* }
    }
}

macro_rules! construct {
    () => {};
    ($($(#[$m:meta])* $v:vis fn $method:ident = $action:expr;)+) => {
        $($(#[$m])* $v fn $method<U>(uri: U) -> Result<Self, http::Error>
        where
            http::Uri: TryFrom<U>,
            <http::Uri as TryFrom<U>>::Error: Into<http::Error>
        {
            Self::from_method(uri, $action)
        })+
    };
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// The address of the peer that sent the request.  Inserted into the request
/// extensions by the transport.
pub(crate) struct PeerAddress(pub(crate) SocketAddr);

#[derive(Debug)]
/// Represents an HTTP request.
///
/// An HTTP Request consists of a head (a version, a method, a path, and some
/// headers), and a body (which may be empty).  The router only looks at the
/// method and the path; everything else is there for handlers.
///
/// # Examples
/// ```rust
/// # use thicket::*;
/// let request = Request::get("/user/42?tab=posts").unwrap();
/// assert_eq!(request.uri().path(), "/user/42");
/// assert_eq!(request.uri().query(), Some("tab=posts"));
/// ```
pub struct Request(http::Request<hyper::Body>);

impl Request {
    construct! {
        /// Creates a new request initialized with the GET method and the given
        /// URI.
        ///
        /// # Examples
        /// ```rust
        /// # use thicket::*;
        /// let request = Request::get("https://example.com/a").unwrap();
        /// assert_eq!(request.method(), http::Method::GET);
        /// ```
        pub fn get = http::Method::GET;
        /// Creates a new request initialized with the POST method and the given
        /// URI.
        ///
        /// # Examples
        /// ```rust
        /// # use thicket::*;
        /// let request = Request::post("https://example.com/a").unwrap();
        /// assert_eq!(request.method(), http::Method::POST);
        /// ```
        pub fn post = http::Method::POST;
        /// Creates a new request initialized with the PUT method and the given
        /// URI.
        pub fn put = http::Method::PUT;
        /// Creates a new request initialized with the DELETE method and the
        /// given URI.
        pub fn delete = http::Method::DELETE;
        /// Creates a new request initialized with the PATCH method and the
        /// given URI.
        pub fn patch = http::Method::PATCH;
        /// Creates a new request initialized with the HEAD method and the given
        /// URI.
        pub fn head = http::Method::HEAD;
        /// Creates a new request initialized with the OPTIONS method and the
        /// given URI.
        pub fn options = http::Method::OPTIONS;
    }

    /// Creates a new request initialized with the provided method and the
    /// given URI.
    ///
    /// # Errors
    /// Fails if the URI cannot be parsed.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// let method = http::Method::from_bytes(b"PURGE").unwrap();
    /// let request = Request::from_method("https://example.com/a", method.clone()).unwrap();
    /// assert_eq!(request.method(), method);
    /// ```
    pub fn from_method<U>(uri: U, method: http::Method) -> Result<Self, http::Error>
    where
        http::Uri: TryFrom<U>,
        <http::Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        http::request::Builder::new()
            .method(method)
            .uri(uri)
            .body(hyper::Body::empty())
            .map(Request)
    }

    /// Replaces the body of the request, returning the request.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// let request = Request::post("/echo").unwrap().with_body("hello");
    /// ```
    #[must_use]
    pub fn with_body<B: Into<hyper::Body>>(mut self, body: B) -> Self {
        *self.0.body_mut() = body.into();
        self
    }

    /// Sets the given header, returning the request.
    ///
    /// # Errors
    /// If the given value cannot be converted into a header value, this will
    /// return an error.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// let request = Request::get("/").unwrap()
    ///     .with_header(http::header::ACCEPT, "text/plain")
    ///     .unwrap();
    /// assert_eq!(request.header(http::header::ACCEPT), Some("text/plain"));
    /// ```
    pub fn with_header<H, V>(mut self, key: H, value: V) -> Result<Self, http::Error>
    where
        H: http::header::IntoHeaderName,
        V: TryInto<http::HeaderValue>,
        http::Error: From<<V as TryInto<http::HeaderValue>>::Error>,
    {
        self.0.headers_mut().insert(key, value.try_into()?);
        Ok(self)
    }

    /// Retrieves the first value of the given header, if it exists and is
    /// visible ASCII.
    pub fn header<H: http::header::AsHeaderName>(&self, key: H) -> Option<&str> {
        self.0.headers().get(key).and_then(|v| v.to_str().ok())
    }

    /// Parses the `Content-Type` header of the request.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// let request = Request::post("/").unwrap();
    /// assert!(request.content_type().is_none());
    /// let request = request
    ///     .with_header(http::header::CONTENT_TYPE, "application/json")
    ///     .unwrap();
    /// let ctype = request.content_type();
    /// assert_eq!(ctype.as_ref().map(|m| m.essence_str()), Some("application/json"));
    /// ```
    pub fn content_type(&self) -> Option<mime::Mime> {
        self.header(http::header::CONTENT_TYPE)?
            .parse::<mime::Mime>()
            .ok()
    }

    /// The address of the connected peer.  This is only set for requests
    /// that came in through [`crate::Router::listen`].
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.0.extensions().get::<PeerAddress>().map(|p| p.0)
    }

    /// Takes the body out of the request, leaving an empty one in its place.
    pub(crate) fn take_body(&mut self) -> hyper::Body {
        std::mem::take(self.0.body_mut())
    }

    forward! {
        /// Returns a reference to the associated URI.
        ///
        /// # Examples
        /// ```rust
        /// # use thicket::*;
        /// let request: Request = Request::get("/").unwrap();
        /// assert_eq!(&*request.uri(), "/");
        /// ```
        #[inline]
        pub fn uri(&self) -> &http::Uri;
        /// Returns a reference to the associated HTTP method.
        ///
        /// # Examples
        /// ```rust
        /// # use thicket::*;
        /// let request: Request = Request::get("/").unwrap();
        /// assert_eq!(*request.method(), http::Method::GET);
        /// ```
        #[inline]
        pub fn method(&self) -> &http::Method;
        /// Returns a reference to the associated header field map.
        #[inline]
        pub fn headers(&self) -> &http::HeaderMap<http::HeaderValue>;
        /// Returns a mutable reference to the associated header field map.
        #[inline]
        pub fn headers_mut(&mut self) -> &mut http::HeaderMap<http::HeaderValue>;
        /// Returns a reference to the associated extensions.
        #[inline]
        pub fn extensions(&self) -> &http::Extensions;
        /// Returns a mutable reference to the associated extensions.
        ///
        /// # Examples
        /// ```rust
        /// # use thicket::*;
        /// let mut request: Request = Request::get("/").unwrap();
        /// request.extensions_mut().insert("hello");
        /// assert_eq!(request.extensions().get(), Some(&"hello"));
        /// ```
        #[inline]
        pub fn extensions_mut(&mut self) -> &mut http::Extensions;
    }
}

impl From<http::Request<hyper::Body>> for Request {
    fn from(r: http::Request<hyper::Body>) -> Self {
        Request(r)
    }
}

impl From<Request> for http::Request<hyper::Body> {
    fn from(r: Request) -> Self {
        r.0
    }
}

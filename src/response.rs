use bytes::{BufMut, BytesMut};

static TEXT_PLAIN: &str = "text/plain; charset=utf-8";
#[cfg(feature = "json")]
static APPLICATION_JSON: &str = "application/json; charset=utf-8";

#[derive(Debug, Default)]
#[must_use]
/// An HTTP response.
///
/// This is the response sink handlers write into, through the
/// [`crate::Context`].  It consists of a status (defaulting to `200 OK`),
/// headers, and a buffered body that writes are appended to.  Once the chain
/// finishes, the router hands it to the transport, which turns it into a
/// [`hyper::Body`] response.
///
/// # Examples
///
/// ```rust
/// use thicket::{Context, Request};
///
/// fn handle_get(context: &mut Context) {
///     let target = context.param("target").unwrap_or("world").to_owned();
///     context.text(http::StatusCode::OK, format!("hello, {}", target));
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), anyhow::Error> {
/// let mut http = thicket::http();
/// http.at("/hello").get(handle_get)?;
/// http.at("/hello/:target").get(handle_get)?;
/// let response = http.handle(Request::get("/hello/you")?).await?;
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.body(), b"hello, you");
/// # Ok(())
/// # }
/// ```
pub struct Response(http::Response<BytesMut>);

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

impl Response {
    /// Creates a response with an empty body and a set status.  The
    /// Content-Type is not set.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// let response = Response::empty_status(http::StatusCode::NOT_FOUND);
    /// assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
    /// ```
    pub fn empty_status(status: http::StatusCode) -> Self {
        Response::default().with_status(status)
    }

    /// Creates an empty response with a status code of 404.
    pub fn empty_404() -> Self {
        Response::empty_status(http::StatusCode::NOT_FOUND)
    }

    /// Creates an empty response with a status code of 500.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// let response = Response::empty_500();
    /// assert_eq!(response.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    /// ```
    pub fn empty_500() -> Self {
        Response::empty_status(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The response the router gives when nothing matched and no fallback is
    /// set.
    pub(crate) fn not_found() -> Self {
        Response::text("404 page not found").with_status(http::StatusCode::NOT_FOUND)
    }

    /// Creates a response with the given text body.  The returned response
    /// has a `Content-Type` of `text/plain; charset=utf-8`.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// let response = Response::text("hello, world");
    /// assert_eq!(response.body(), b"hello, world");
    /// ```
    pub fn text<V: Into<String>>(body: V) -> Self {
        let mut response = Response::default();
        response.default_content_type(TEXT_PLAIN);
        response.write(body.into());
        response
    }

    /// Creates a response with the given JSON body.  The returned response
    /// has a `Content-Type` of `application/json; charset=utf-8`.
    ///
    /// # Errors
    /// This errors if the underlying JSON serialization fails; and it will
    /// return that exact error.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// let response = Response::json(&serde_json::json!({ "hello": "world" }))?;
    /// assert_eq!(response.body(), br#"{"hello":"world"}"#);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub fn json<V: serde::Serialize>(body: &V) -> Result<Self, serde_json::Error> {
        let mut response = Response::default();
        response.write_json(body)?;
        Ok(response)
    }

    /// Sets the current responses's status code.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// let mut response = Response::empty_404();
    /// response.set_status(http::StatusCode::OK);
    /// assert_eq!(response.status(), http::StatusCode::OK);
    /// ```
    pub fn set_status<S: Into<http::StatusCode>>(&mut self, status: S) {
        *self.0.status_mut() = status.into();
    }

    /// Returns a response with the new status code.
    pub fn with_status<S: Into<http::StatusCode>>(mut self, status: S) -> Self {
        self.set_status(status);
        self
    }

    /// Retrieves the first value of the given header, if it exists and is
    /// visible ASCII.
    pub fn header<H: http::header::AsHeaderName>(&self, key: H) -> Option<&str> {
        self.0.headers().get(key).and_then(|v| v.to_str().ok())
    }

    /// Sets the given header to the given value.  If there already was a
    /// header, it is replaced with the given value.
    ///
    /// # Errors
    /// If the given value cannot be converted into a header value, this will
    /// return an error.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// # use http::header::*;
    /// let mut response = Response::default();
    /// response.set_header(LOCATION, "/").unwrap();
    /// assert_eq!(response.header(LOCATION), Some("/"));
    /// ```
    pub fn set_header<H, V>(&mut self, key: H, value: V) -> Result<(), http::Error>
    where
        H: http::header::IntoHeaderName,
        V: TryInto<http::HeaderValue>,
        http::Error: From<<V as TryInto<http::HeaderValue>>::Error>,
    {
        self.0.headers_mut().insert(key, value.try_into()?);
        Ok(())
    }

    /// Appends the given header, keeping any existing values for it.
    ///
    /// # Errors
    /// If the given value cannot be converted into a header value, this will
    /// return an error.
    pub fn add_header<H, V>(&mut self, key: H, value: V) -> Result<(), http::Error>
    where
        H: http::header::IntoHeaderName,
        V: TryInto<http::HeaderValue>,
        http::Error: From<<V as TryInto<http::HeaderValue>>::Error>,
    {
        self.0.headers_mut().append(key, value.try_into()?);
        Ok(())
    }

    /// Appends bytes to the body.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// let mut response = Response::default();
    /// response.write("hello, ");
    /// response.write(b"world".to_vec());
    /// assert_eq!(response.body(), b"hello, world");
    /// ```
    pub fn write<B: AsRef<[u8]>>(&mut self, bytes: B) {
        self.0.body_mut().put_slice(bytes.as_ref());
    }

    /// The body written so far.
    pub fn body(&self) -> &[u8] {
        &self.0.body()[..]
    }

    /// Discards everything written to the body so far.
    pub fn clear_body(&mut self) {
        self.0.body_mut().clear();
    }

    #[cfg(feature = "json")]
    pub(crate) fn write_json<V: serde::Serialize>(
        &mut self,
        body: &V,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_vec(body)?;
        self.default_content_type(APPLICATION_JSON);
        self.write(value);
        Ok(())
    }

    // `<`, `>` and `&` only ever occur inside JSON strings, where the
    // `\uXXXX` form means the same thing.
    #[cfg(feature = "json")]
    pub(crate) fn write_json_escaped<V: serde::Serialize>(
        &mut self,
        body: &V,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_vec(body)?;
        let mut escaped = Vec::with_capacity(value.len());
        for byte in value {
            match byte {
                b'<' => escaped.extend_from_slice(b"\\u003c"),
                b'>' => escaped.extend_from_slice(b"\\u003e"),
                b'&' => escaped.extend_from_slice(b"\\u0026"),
                _ => escaped.push(byte),
            }
        }
        self.default_content_type(APPLICATION_JSON);
        self.write(escaped);
        Ok(())
    }

    /// Sets the `Content-Type` header, unless a handler already set one.
    pub(crate) fn default_content_type(&mut self, value: &'static str) {
        self.0
            .headers_mut()
            .entry(http::header::CONTENT_TYPE)
            .or_insert_with(|| http::HeaderValue::from_static(value));
    }

    /// Replaces whatever was written so far with a plain `500 Internal Server
    /// Error`.
    pub(crate) fn reset_to_500(&mut self) {
        self.clear_body();
        self.0
            .headers_mut()
            .insert(http::header::CONTENT_TYPE, http::HeaderValue::from_static(TEXT_PLAIN));
        self.set_status(http::StatusCode::INTERNAL_SERVER_ERROR);
        self.write("Internal Server Error");
    }

    forward! {
        /// Returns the [`http::StatusCode`].
        ///
        /// # Examples
        ///
        /// ```rust
        /// # use thicket::*;
        /// let response = Response::default();
        /// assert_eq!(response.status(), http::StatusCode::OK);
        /// ```
        pub fn status(&self) -> http::StatusCode;
        /// Returns a reference to the associated extensions.
        pub fn extensions(&self) -> &http::Extensions;
        /// Returns a mutable reference to the associated extensions.
        pub fn extensions_mut(&mut self) -> &mut http::Extensions;
        /// Returns a reference to the associated header field map.
        ///
        /// # Examples
        ///
        /// ```rust
        /// # use thicket::*;
        /// let response = Response::default();
        /// assert!(response.headers().is_empty());
        /// ```
        pub fn headers(&self) -> &http::HeaderMap<http::HeaderValue>;
        /// Returns a mutable reference to the associated header field map.
        pub fn headers_mut(&mut self) -> &mut http::HeaderMap<http::HeaderValue>;
    }
}

impl From<Response> for http::Response<hyper::Body> {
    fn from(this: Response) -> Self {
        this.0.map(|body| hyper::Body::from(body.freeze()))
    }
}

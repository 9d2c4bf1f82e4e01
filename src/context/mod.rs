#[cfg(feature = "cookie")]
mod cookies;
mod keys;
#[cfg(feature = "multipart")]
mod multipart;
mod params;
mod pipeline;

pub use self::keys::Keys;
#[cfg(feature = "multipart")]
pub use self::multipart::{FormFile, MultipartForm};
pub use self::params::Params;
use crate::data::DataStream;
use crate::handler::HandlerChain;
use crate::request::Query;
use crate::router::{Options, Resolved};
use crate::{Request, Response, ThicketError};
use std::any::Any;
use std::sync::Arc;

/// The state of a single request as it moves through its handler chain.
///
/// A context is created by the router for every request that resolved to a
/// route, and dropped once the chain has finished.  It owns the request, the
/// response being built, the path parameters and query string, and a
/// key/value store for passing data between handlers.  Handlers receive it
/// mutably, one after another, in chain order.
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
/// fn show(context: &mut Context) {
///     let keyword = context.query("q").unwrap_or_default().to_owned();
///     context.text(http::StatusCode::OK, keyword);
/// }
///
/// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
/// let mut http = thicket::http();
/// http.at("/p/:id").with(auth).get(show)?;
///
/// let response = http.handle(Request::get("/p/ds")?).await?;
/// assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
/// assert_eq!(response.body(), b"param should be Hello");
///
/// let response = http.handle(Request::get("/p/Hello?q=world")?).await?;
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.body(), b"world");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Context {
    request: Request,
    response: Response,
    params: Params,
    query: Query,
    route: Option<Arc<str>>,
    handlers: HandlerChain,
    index: Option<usize>,
    aborted: bool,
    keys: Option<Keys>,
    #[cfg(feature = "multipart")]
    form: Option<MultipartForm>,
    options: Options,
}

impl Context {
    pub(crate) fn new(request: Request, resolved: Resolved, options: Options) -> Self {
        let query = request.uri().query().map(Query::parse).unwrap_or_default();
        Context {
            request,
            response: Response::default(),
            params: resolved.params,
            query,
            route: resolved.route,
            handlers: resolved.handlers,
            index: None,
            aborted: false,
            keys: None,
            #[cfg(feature = "multipart")]
            form: None,
            options,
        }
    }

    /// The request being handled.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The request being handled, mutably.  Useful for middleware that
    /// annotates the request (e.g. with extensions) for later handlers.
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// The response written so far.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// The response written so far, mutably.
    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Consumes the context, returning the response.
    pub(crate) fn into_response(self) -> Response {
        self.response
    }

    /// The registered path of the matched route (e.g. `/user/:id`).  This is
    /// `None` when the chain is the router's fallback.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// The value bound to the given path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Every path parameter bound for this request.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The first value of the given query parameter.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key)
    }

    /// The decoded query string of the request.
    pub fn query_all(&self) -> &Query {
        &self.query
    }

    /// Deserializes the query string of the request into the given type.
    ///
    /// # Errors
    /// Fails if the query string does not fit the type.
    pub fn query_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_qs::Error> {
        self.query.deserialize()
    }

    /// Retrieves the first value of the given request header.
    pub fn header<H: http::header::AsHeaderName>(&self, key: H) -> Option<&str> {
        self.request.header(key)
    }

    /// Sets a header on the response.
    ///
    /// # Errors
    /// If the given value cannot be converted into a header value, this will
    /// return an error.
    pub fn set_header<H, V>(&mut self, key: H, value: V) -> Result<(), http::Error>
    where
        H: http::header::IntoHeaderName,
        V: TryInto<http::HeaderValue>,
        http::Error: From<<V as TryInto<http::HeaderValue>>::Error>,
    {
        self.response.set_header(key, value)
    }

    /// Sets the status of the response.
    pub fn status(&mut self, status: http::StatusCode) {
        self.response.set_status(status);
    }

    /// Appends bytes to the response body.
    pub fn write<B: AsRef<[u8]>>(&mut self, bytes: B) {
        self.response.write(bytes);
    }

    /// Writes a plain text response with the given status.  The
    /// `Content-Type` is set to `text/plain; charset=utf-8` unless a handler
    /// already set one.
    pub fn text<V: AsRef<str>>(&mut self, status: http::StatusCode, body: V) {
        self.response.default_content_type("text/plain; charset=utf-8");
        self.response.set_status(status);
        self.response.write(body.as_ref());
    }

    /// Writes a JSON response with the given status.  The `Content-Type` is
    /// set to `application/json; charset=utf-8` unless a handler already set
    /// one.  HTML characters are written as they are; see
    /// [`Context::pure_json`] for a body that is safe to embed in a page.
    ///
    /// # Errors
    /// Fails if the value cannot be serialized; nothing is written then.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
    /// let mut http = thicket::http();
    /// http.at("/message/:param").get(|context: &mut Context| {
    ///     let message = context.param("param").map(str::to_owned);
    ///     context.json(
    ///         http::StatusCode::OK,
    ///         &serde_json::json!({ "message": message }),
    ///     )
    /// })?;
    /// let response = http.handle(Request::get("/message/hi")?).await?;
    /// assert_eq!(response.body(), br#"{"message":"hi"}"#);
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub fn json<V: serde::Serialize>(
        &mut self,
        status: http::StatusCode,
        body: &V,
    ) -> Result<(), serde_json::Error> {
        self.response.write_json(body)?;
        self.response.set_status(status);
        Ok(())
    }

    /// Like [`Context::json`], but `<`, `>` and `&` inside strings are
    /// written as `\u003c`, `\u003e` and `\u0026`.
    ///
    /// # Errors
    /// Fails if the value cannot be serialized; nothing is written then.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub fn pure_json<V: serde::Serialize>(
        &mut self,
        status: http::StatusCode,
        body: &V,
    ) -> Result<(), serde_json::Error> {
        self.response.write_json_escaped(body)?;
        self.response.set_status(status);
        Ok(())
    }

    /// Takes the request body as a stream, limited to the given number of
    /// bytes.  The body can only be taken once; later calls see an empty
    /// body.
    pub fn data(&mut self, limit: u64) -> DataStream {
        DataStream::new(self.request.take_body(), limit)
    }

    /// Reads the whole request body, up to the router's body limit.
    ///
    /// # Errors
    /// Fails if the body cannot be read, or exceeds the limit.
    pub async fn body_bytes(&mut self) -> Result<Vec<u8>, ThicketError> {
        self.data(self.options.body_limit).into_bytes().await
    }

    /// Reads the whole request body as text, up to the router's body limit.
    ///
    /// # Errors
    /// Fails if the body cannot be read, exceeds the limit, or is not UTF-8.
    pub async fn body_text(&mut self) -> Result<String, ThicketError> {
        self.data(self.options.body_limit).into_text().await
    }

    /// Reads the request body as JSON.  The request must have a
    /// `Content-Type` of `application/json`.
    ///
    /// # Errors
    /// Fails with [`ThicketError::UnsupportedMediaType`] if the content type
    /// is wrong; otherwise for the same reasons as [`Context::body_bytes`], or
    /// if the body does not deserialize into the type.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub async fn bind_json<T: serde::de::DeserializeOwned>(&mut self) -> Result<T, ThicketError> {
        let ctype = self.request.content_type();
        if ctype.as_ref().map(mime::Mime::essence_str) != Some("application/json") {
            return Err(ThicketError::UnsupportedMediaType(ctype));
        }
        self.data(self.options.body_limit).into_json().await
    }

    /// Returns state information provided by the
    /// [`crate::middleware::StateMiddleware`] middleware.
    pub fn state<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.request
            .extensions()
            .get::<crate::middleware::State<T>>()
            .map(|v| &v.0)
    }

    /// Stores a value in the request-scoped key/value store.  See [`Keys`].
    pub fn set<K, T>(&mut self, key: K, value: T)
    where
        K: Into<String>,
        T: Any + Send + Sync,
    {
        self.keys().set(key, value);
    }

    /// Retrieves a value from the request-scoped key/value store.  See
    /// [`Keys`].
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.keys.as_ref()?.get(key)
    }

    /// A handle to the request-scoped key/value store, allocating it if this
    /// is the first use.  The handle can be moved into background work.
    pub fn keys(&mut self) -> &Keys {
        self.keys.get_or_insert_with(Keys::default)
    }
}

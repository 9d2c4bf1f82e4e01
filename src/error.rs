#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
/// Errors generated specifically from this library, and not its interactions
/// with user code.
///
/// The first four variants are raised while building the route table, and
/// are programmer errors: the route table must be fixed, so there is no
/// point in retrying.  See [`ThicketError::is_configuration`].
pub enum ThicketError {
    #[error("invalid method {:?}; methods must consist of uppercase ASCII letters", .0)]
    /// Generated when registering a route with a method that isn't a plain
    /// uppercase token (e.g. `get` or `M-SEARCH`).
    InvalidMethod(String),
    #[error("invalid parameter {segment:?} in {method} {path}")]
    /// Generated when the same parameter name is used twice within one
    /// path.
    InvalidParameter {
        /// The method of the rejected route.
        method: String,
        /// The full path of the rejected route.
        path: String,
        /// The offending segment.
        segment: String,
    },
    #[error("conflict: segment {segment:?} in {method} {path} collides with an existing route")]
    /// Generated when a segment would make a position in the tree ambiguous
    /// between literal and parameter matching.
    RouteConflict {
        /// The method of the rejected route.
        method: String,
        /// The full path of the rejected route.
        path: String,
        /// The segment that collided.
        segment: String,
    },
    #[error("duplicate route detected: {method} {path}")]
    /// Generated when the exact method and path is registered twice.
    DuplicateRoute {
        /// The method of the rejected route.
        method: String,
        /// The full path of the rejected route.
        path: String,
    },
    #[error("could not parse the given string ({:?}) as an address", .0)]
    /// Generated when attempting to parse an address (during
    /// [`crate::Router::listen`]), but the address was invalid.
    InvalidAddress(String),
    #[error("could not serve server")]
    /// Generated when attempting to bind and listen using hyper, but it failed
    /// for some underlying reason.
    HyperServer(#[source] hyper::Error),
    /// Generated when attempting to read the body of a request and failing.
    #[error("could not read the body of a request")]
    ReadBody(#[source] std::io::Error),
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    /// Generated when attempting to deserialize the body of a request from
    /// JSON.
    #[error("could not deserialize the body of a request from JSON")]
    JsonDeserialization(#[source] serde_json::Error),
    /// Generated when attempting to deserialize the body of a request from
    /// text.
    #[error("could not deserialize the body of a request from utf-8")]
    TextDeserialization(#[source] std::string::FromUtf8Error),
    /// Generated when the content-type of the request does not match what
    /// the handler asked for.
    #[error("the content-type of the request was invalid")]
    UnsupportedMediaType(Option<mime::Mime>),
    /// Generated when the request body is larger than the configured limit.
    #[error("the request body of the request was too long, and was cut off")]
    PayloadTooLarge(#[source] anyhow::Error),
    #[cfg(feature = "multipart")]
    #[cfg_attr(nightly, doc(cfg(feature = "multipart")))]
    /// Generated when a `multipart/form-data` body is malformed.
    #[error("could not parse the multipart body of a request")]
    Multipart(#[source] multer::Error),
    #[cfg(feature = "multipart")]
    #[cfg_attr(nightly, doc(cfg(feature = "multipart")))]
    /// Generated when a multipart form has no file under the given field.
    #[error("no file was uploaded under {:?}", .0)]
    MissingFormFile(String),
    #[cfg(feature = "multipart")]
    #[cfg_attr(nightly, doc(cfg(feature = "multipart")))]
    /// Generated when an uploaded file cannot be written to disk.
    #[error("could not save an uploaded file")]
    SaveFile(#[source] std::io::Error),
}

impl ThicketError {
    /// Whether or not this error was raised while building the route table.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// let mut http = thicket::http();
    /// let error = http.register("get", "/", Vec::new()).unwrap_err();
    /// assert!(error.is_configuration());
    /// ```
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ThicketError::InvalidMethod(_)
                | ThicketError::InvalidParameter { .. }
                | ThicketError::RouteConflict { .. }
                | ThicketError::DuplicateRoute { .. }
        )
    }
}

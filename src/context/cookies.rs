use super::Context;
use cookie::{Cookie, CookieJar};
use percent_encoding::percent_decode_str;

impl Context {
    /// Returns the decoded value of the request cookie with the given name.
    /// Values are decoded as in a query string: `+` is a space, and `%XX`
    /// is a byte.  Bytes that are not UTF-8 are replaced.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
    /// let mut http = thicket::http();
    /// http.at("/me").get(|context: &mut Context| {
    ///     let user = context.cookie("user").unwrap_or_else(|| "guest".into());
    ///     context.text(http::StatusCode::OK, user);
    /// })?;
    /// let request = Request::get("/me")?
    ///     .with_header(http::header::COOKIE, "theme=dark; user=ana")?;
    /// let response = http.handle(request).await?;
    /// assert_eq!(response.body(), b"ana");
    /// # Ok(())
    /// # }
    /// ```
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.request_cookies()
            .find(|c| c.name() == name)
            .map(|c| c.value().to_owned())
    }

    /// Collects every request cookie into a jar.  Values are decoded as in
    /// [`Context::cookie`].
    pub fn cookies(&self) -> CookieJar {
        self.request_cookies()
            .fold(CookieJar::new(), |mut jar, cookie| {
                jar.add_original(cookie);
                jar
            })
    }

    fn request_cookies(&self) -> impl Iterator<Item = Cookie<'static>> + '_ {
        self.request
            .headers()
            .get_all(http::header::COOKIE)
            .into_iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|h| h.split(';'))
            .filter_map(|c| Cookie::parse(c.trim()).ok())
            .map(|c| Cookie::new(c.name().to_owned(), unescape(c.value())))
    }

    /// Appends a `Set-Cookie` header to the response.  The cookie's path
    /// defaults to `/` when it has none.  The value is encoded as in a query
    /// string, so a space is sent as `+`.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// # use cookie::Cookie;
    /// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
    /// let mut http = thicket::http();
    /// http.at("/login").post(|context: &mut Context| {
    ///     context.set_cookie(Cookie::new("user", "ana bell"));
    /// })?;
    /// let response = http.handle(Request::post("/login")?).await?;
    /// assert_eq!(
    ///     response.header(http::header::SET_COOKIE),
    ///     Some("user=ana+bell; Path=/")
    /// );
    /// # Ok(())
    /// # }
    /// ```
    pub fn set_cookie(&mut self, mut cookie: Cookie<'static>) {
        if cookie.path().is_none() {
            cookie.set_path("/");
        }

        let value = form_urlencoded::byte_serialize(cookie.value().as_bytes()).collect::<String>();
        cookie.set_value(value);
        let header = cookie.to_string();
        if let Err(error) = self.response.add_header(http::header::SET_COOKIE, header) {
            log::warn!("dropping cookie {:?}: {}", cookie.name(), error);
        }
    }
}

fn unescape(value: &str) -> String {
    let value = value.replace('+', " ");
    percent_decode_str(&value).decode_utf8_lossy().into_owned()
}

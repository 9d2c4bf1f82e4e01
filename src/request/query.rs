/// A decoded view over the query string of a request.
///
/// Keys may repeat; [`Query::get`] returns the first value for a key, and
/// [`Query::get_all`] returns every value in the order they appeared.
///
/// # Examples
/// ```rust
/// # use thicket::Query;
/// let query = Query::parse("q=car+blue&tag=a&tag=b");
/// assert_eq!(query.get("q"), Some("car blue"));
/// assert_eq!(query.get_all("tag").collect::<Vec<_>>(), vec!["a", "b"]);
/// assert_eq!(query.get("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    raw: String,
    pairs: Vec<(String, String)>,
}

impl Query {
    /// Parses a raw (still percent-encoded) query string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let pairs = form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect();
        Query {
            raw: raw.to_owned(),
            pairs,
        }
    }

    /// The first value for the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for the given key.
    pub fn get_all<'q>(&'q self, key: &'q str) -> impl Iterator<Item = &'q str> + 'q {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over every key/value pair.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the query string had no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Deserializes the query string into the given type.
    ///
    /// # Errors
    /// Fails if the query string does not fit the type.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::Query;
    /// #[derive(serde::Deserialize)]
    /// struct Search {
    ///     q: String,
    ///     page: Option<u32>,
    /// }
    ///
    /// let search: Search = Query::parse("q=rust&page=2").deserialize().unwrap();
    /// assert_eq!(search.q, "rust");
    /// assert_eq!(search.page, Some(2));
    /// ```
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_qs::Error> {
        serde_qs::from_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_percent_and_plus() {
        let query = Query::parse("name=Hello%20World&q=a+b");
        assert_eq!(query.get("name"), Some("Hello World"));
        assert_eq!(query.get("q"), Some("a b"));
    }

    #[test]
    fn empty_query() {
        let query = Query::parse("");
        assert!(query.is_empty());
        assert_eq!(query.iter().count(), 0);
    }

    #[test]
    fn first_value_wins() {
        let query = Query::parse("a=1&a=2");
        assert_eq!(query.get("a"), Some("1"));
    }
}

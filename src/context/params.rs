use std::sync::Arc;

/// The path parameters bound while resolving a route.
///
/// For a route registered as `/message/:a/:b`, resolving `/message/x/y`
/// binds `a` to `x` and `b` to `y`.  Bindings keep the order of the
/// parameters in the path, and names are unique within one route.  Values
/// are percent-decoded.  Nothing is
/// allocated for routes without parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(Arc<str>, String)>);

impl Params {
    pub(crate) fn push<V: Into<String>>(&mut self, name: Arc<str>, value: V) {
        self.0.push((name, value.into()));
    }

    /// The value bound to the given parameter name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the bindings in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (&**n, v.as_str()))
    }

    /// The number of bound parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameters were bound.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        let mut params = Params::default();
        params.push(Arc::from("a"), "x");
        params.push(Arc::from("b"), "y");
        assert_eq!(params.get("a"), Some("x"));
        assert_eq!(params.get("b"), Some("y"));
        assert_eq!(params.get("c"), None);
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("a", "x"), ("b", "y")]);
    }
}

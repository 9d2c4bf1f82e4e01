use crate::context::Params;
use crate::handler::HandlerChain;
use crate::ThicketError;
use percent_encoding::percent_decode_str;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

lazy_static::lazy_static! {
    static ref METHOD: regex::Regex = regex::Regex::new("^[A-Z]+$").unwrap();
}

/// A registered route, as listed by [`crate::Router::routes`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteInfo {
    /// The method the route was registered under, e.g. `GET`.
    pub method: String,
    /// The path pattern the route was registered with, e.g. `/user/:id`.
    pub path: String,
}

/// The outcome of a successful lookup: the chain to run, and the parameters
/// bound along the way.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub(crate) handlers: HandlerChain,
    pub(crate) params: Params,
    pub(crate) route: Option<Arc<str>>,
}

impl Resolved {
    /// The handler chain of the matched route, middleware included.
    pub fn handlers(&self) -> &HandlerChain {
        &self.handlers
    }

    /// The parameters bound while matching.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The registered path pattern that matched.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }
}

#[derive(Debug, Clone, Copy)]
enum Segment<'p> {
    Literal(&'p str),
    Parameter(&'p str),
}

/// A terminal route.  Parameter nodes are shared between routes, so the
/// names a route binds are kept here, in path order.
#[derive(Debug)]
struct Route {
    path: Arc<str>,
    names: Box<[Arc<str>]>,
    handlers: HandlerChain,
}

#[derive(Debug, Default)]
struct Node {
    route: Option<Route>,
    children: HashMap<Box<str>, Node>,
    param: Option<Box<Node>>,
}

impl Node {
    /// Walks the segments without touching the tree, reporting the first
    /// conflict.  Once the walk falls off the existing tree, every remaining
    /// segment would be a fresh node, so nothing below can conflict.
    fn check(&self, segments: &[Segment<'_>], method: &str, path: &str) -> Result<(), ThicketError> {
        let conflict = |segment: &str| ThicketError::RouteConflict {
            method: method.to_owned(),
            path: path.to_owned(),
            segment: segment.to_owned(),
        };

        let mut node = self;
        for segment in segments {
            let next = match *segment {
                Segment::Parameter(name) => {
                    if !node.children.is_empty() {
                        return Err(conflict(name));
                    }
                    node.param.as_deref()
                }
                Segment::Literal(text) => {
                    if node.param.is_some() {
                        return Err(conflict(text));
                    }
                    node.children.get(text)
                }
            };

            match next {
                Some(child) => node = child,
                None => return Ok(()),
            }
        }

        if node.route.is_some() {
            return Err(ThicketError::DuplicateRoute {
                method: method.to_owned(),
                path: path.to_owned(),
            });
        }

        Ok(())
    }

    // Only called after `check`; reuses what exists and creates the rest.
    fn descend(&mut self, segments: &[Segment<'_>]) -> &mut Node {
        let mut node = self;
        for segment in segments {
            node = match *segment {
                Segment::Parameter(_) => &mut **node.param.get_or_insert_with(Box::default),
                Segment::Literal(text) => node.children.entry(Box::from(text)).or_default(),
            };
        }
        node
    }

    fn count(&self) -> usize {
        1 + self.children.values().map(Node::count).sum::<usize>()
            + self.param.as_deref().map_or(0, Node::count)
    }
}

/// The routes of a router: one tree per method, and the list of everything
/// that was registered.
#[derive(Debug, Default)]
pub(crate) struct RouteTable {
    trees: HashMap<String, Node>,
    registry: Vec<RouteInfo>,
}

impl RouteTable {
    /// Adds a route.  A rejected route leaves the table as it was.
    pub(crate) fn insert(
        &mut self,
        method: &str,
        path: &str,
        handlers: HandlerChain,
    ) -> Result<(), ThicketError> {
        if !METHOD.is_match(method) {
            return Err(ThicketError::InvalidMethod(method.to_owned()));
        }

        let segments = parse(method, path)?;
        if let Some(tree) = self.trees.get(method) {
            tree.check(&segments, method, path)?;
        }

        let names = segments
            .iter()
            .filter_map(|segment| match *segment {
                Segment::Parameter(name) => Some(Arc::from(name)),
                Segment::Literal(_) => None,
            })
            .collect();
        let node = self
            .trees
            .entry(method.to_owned())
            .or_default()
            .descend(&segments);
        log::debug!("route: {} {} ({} handlers)", method, path, handlers.len());
        node.route = Some(Route {
            path: Arc::from(path),
            names,
            handlers,
        });
        self.registry.push(RouteInfo {
            method: method.to_owned(),
            path: path.to_owned(),
        });
        Ok(())
    }

    /// Looks up the route for the given method and path.  Literal segments
    /// are preferred over parameters at every level, and a literal match is
    /// never revisited, even if the path then fails to match below it.
    ///
    /// Each segment is percent-decoded before it is matched, so `%20` in a
    /// request path matches a space in a literal and binds a space in a
    /// parameter.  A segment that does not decode to UTF-8 matches nothing.
    pub(crate) fn resolve(&self, method: &str, path: &str) -> Option<Resolved> {
        let mut node = self.trees.get(method)?;
        let mut values = Vec::new();

        for segment in segments(path) {
            let segment = percent_decode_str(segment).decode_utf8().ok()?;
            node = match node.children.get(&*segment) {
                Some(child) => child,
                None => {
                    let child = node.param.as_deref()?;
                    values.push(segment.into_owned());
                    child
                }
            };
        }

        let route = node.route.as_ref()?;
        let mut params = Params::default();
        for (name, value) in route.names.iter().zip(values) {
            params.push(name.clone(), value);
        }

        Some(Resolved {
            handlers: route.handlers.clone(),
            params,
            route: Some(route.path.clone()),
        })
    }

    /// Every registered route, longest path first, then alphabetically.
    pub(crate) fn routes(&self) -> Vec<RouteInfo> {
        let mut routes = self.registry.clone();
        routes.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.path.cmp(&b.path))
        });
        routes
    }

    #[cfg(test)]
    fn nodes(&self) -> usize {
        self.trees.values().map(Node::count).sum()
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn parse<'p>(method: &str, path: &'p str) -> Result<Vec<Segment<'p>>, ThicketError> {
    let mut seen = HashSet::new();
    segments(path)
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !seen.insert(name) => {
                Err(ThicketError::InvalidParameter {
                    method: method.to_owned(),
                    path: path.to_owned(),
                    segment: segment.to_owned(),
                })
            }
            Some(name) => Ok(Segment::Parameter(name)),
            None => Ok(Segment::Literal(segment)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::boxed;
    use crate::Context;

    fn chain() -> HandlerChain {
        Arc::from(vec![boxed(|_: &mut Context| {})])
    }

    fn table(routes: &[(&str, &str)]) -> RouteTable {
        let mut table = RouteTable::default();
        for (method, path) in routes {
            table.insert(method, path, chain()).unwrap();
        }
        table
    }

    fn bound(resolved: &Resolved) -> Vec<(&str, &str)> {
        resolved.params().iter().collect()
    }

    #[test]
    fn resolves_literals_and_parameters() {
        let table = table(&[
            ("GET", "/"),
            ("GET", "/ping"),
            ("GET", "/p/:id"),
            ("GET", "/message/:a/:b"),
            ("POST", "/user/:name/info"),
        ]);

        let root = table.resolve("GET", "/").unwrap();
        assert_eq!(root.route(), Some("/"));
        assert!(root.params().is_empty());

        let ping = table.resolve("GET", "/ping").unwrap();
        assert_eq!(ping.route(), Some("/ping"));

        let p = table.resolve("GET", "/p/ds").unwrap();
        assert_eq!(p.route(), Some("/p/:id"));
        assert_eq!(bound(&p), vec![("id", "ds")]);

        let message = table.resolve("GET", "/message/x/y").unwrap();
        assert_eq!(bound(&message), vec![("a", "x"), ("b", "y")]);

        let info = table.resolve("POST", "/user/ana/info").unwrap();
        assert_eq!(info.route(), Some("/user/:name/info"));
        assert_eq!(bound(&info), vec![("name", "ana")]);
    }

    #[test]
    fn segmentation_ignores_extra_slashes() {
        let table = table(&[("GET", "/a/b/")]);
        assert!(table.resolve("GET", "/a/b").is_some());
        assert!(table.resolve("GET", "a/b").is_some());
        assert!(table.resolve("GET", "//a//b//").is_some());

        let table = self::table(&[("GET", "")]);
        assert_eq!(table.resolve("GET", "/").unwrap().route(), Some(""));
        assert!(table.resolve("GET", "///").is_some());
    }

    #[test]
    fn misses_return_none() {
        let table = table(&[("GET", "/p/:id"), ("GET", "/a/b")]);
        assert!(table.resolve("GET", "/p").is_none());
        assert!(table.resolve("GET", "/p/1/2").is_none());
        assert!(table.resolve("GET", "/a").is_none());
        assert!(table.resolve("GET", "/nope").is_none());
        assert!(table.resolve("POST", "/a/b").is_none());
        assert!(table.resolve("DELETE", "/").is_none());
    }

    #[test]
    fn methods_are_separate() {
        let table = table(&[("GET", "/item/:id"), ("POST", "/item/new")]);
        assert_eq!(table.resolve("GET", "/item/new").unwrap().route(), Some("/item/:id"));
        assert_eq!(table.resolve("POST", "/item/new").unwrap().route(), Some("/item/new"));
    }

    #[test]
    fn segments_are_percent_decoded() {
        let table = table(&[("GET", "/file/:name"), ("GET", "/caf\u{e9}/menu")]);
        let resolved = table.resolve("GET", "/file/a%20b").unwrap();
        assert_eq!(resolved.params().get("name"), Some("a b"));

        // An encoded slash stays inside its segment.
        let resolved = table.resolve("GET", "/file/a%2Fb").unwrap();
        assert_eq!(resolved.params().get("name"), Some("a/b"));

        assert!(table.resolve("GET", "/caf%C3%A9/menu").is_some());
        assert!(table.resolve("GET", "/file/%FF").is_none());
    }

    #[test]
    fn rejects_invalid_methods() {
        let mut table = RouteTable::default();
        for method in ["get", "", "M-SEARCH", "GET ", "Post"] {
            let error = table.insert(method, "/", chain()).unwrap_err();
            assert!(matches!(error, ThicketError::InvalidMethod(_)), "{:?}", error);
        }
        assert!(table.insert("PURGE", "/", chain()).is_ok());
    }

    #[test]
    fn rejects_repeated_parameter_names() {
        let mut table = RouteTable::default();
        let error = table.insert("GET", "/:id/x/:id", chain()).unwrap_err();
        assert!(matches!(error, ThicketError::InvalidParameter { ref segment, .. } if segment == ":id"));
        assert_eq!(table.nodes(), 0);
    }

    #[test]
    fn unnamed_parameters_bind_the_empty_name() {
        let table = table(&[("GET", "/a/:")]);
        let resolved = table.resolve("GET", "/a/b").unwrap();
        assert_eq!(bound(&resolved), vec![("", "b")]);
    }

    #[test]
    fn rejects_parameter_next_to_literal() {
        let mut table = table(&[("GET", "/user/profile")]);
        let error = table.insert("GET", "/user/:id", chain()).unwrap_err();
        assert!(matches!(error, ThicketError::RouteConflict { ref segment, .. } if segment == "id"));

        let mut table = self::table(&[("GET", "/user/:id")]);
        let error = table.insert("GET", "/user/profile", chain()).unwrap_err();
        assert!(matches!(error, ThicketError::RouteConflict { ref segment, .. } if segment == "profile"));

        // Same position, another method: separate trees.
        assert!(table.insert("POST", "/user/profile", chain()).is_ok());
    }

    #[test]
    fn renamed_parameters_share_a_node() {
        let table = table(&[
            ("GET", "/user/:id"),
            ("GET", "/user/:name/posts"),
            ("GET", "/user/:who/posts/:post"),
        ]);
        assert_eq!(table.nodes(), 5);

        let user = table.resolve("GET", "/user/7").unwrap();
        assert_eq!(user.route(), Some("/user/:id"));
        assert_eq!(bound(&user), vec![("id", "7")]);

        let posts = table.resolve("GET", "/user/ana/posts").unwrap();
        assert_eq!(posts.route(), Some("/user/:name/posts"));
        assert_eq!(bound(&posts), vec![("name", "ana")]);

        let post = table.resolve("GET", "/user/ana/posts/3").unwrap();
        assert_eq!(bound(&post), vec![("who", "ana"), ("post", "3")]);
    }

    #[test]
    fn rejects_duplicates() {
        let mut table = table(&[("GET", "/a")]);
        let error = table.insert("GET", "/a/", chain()).unwrap_err();
        assert!(matches!(error, ThicketError::DuplicateRoute { .. }));
        assert!(error.is_configuration());
        assert_eq!(table.routes().len(), 1);
    }

    #[test]
    fn rejected_routes_leave_no_trace() {
        let mut table = table(&[("GET", "/a/:id")]);
        let before = table.nodes();
        assert!(table.insert("GET", "/a/:id/b/c/:d/x/:d", chain()).is_err());
        assert!(table.insert("GET", "/a/literal/b/c", chain()).is_err());
        assert_eq!(table.nodes(), before);
        assert!(table.resolve("GET", "/a/1/b/c").is_none());
        assert_eq!(table.routes().len(), 1);
    }

    #[test]
    fn no_backtracking_after_literal() {
        // `/a/:x/c` and `/a/b/d` cannot coexist in one tree, so a literal
        // match that dead-ends is a plain miss.
        let mut table = table(&[("GET", "/a/b/d")]);
        assert!(table.insert("GET", "/a/:x/c", chain()).is_err());
        assert!(table.resolve("GET", "/a/b/c").is_none());
    }

    #[test]
    fn intermediate_nodes_are_not_routes() {
        let table = table(&[("GET", "/a/b/c")]);
        assert!(table.resolve("GET", "/a/b").is_none());
        let mut table = table;
        assert!(table.insert("GET", "/a/b", chain()).is_ok());
        assert!(table.resolve("GET", "/a/b").is_some());
        assert!(table.resolve("GET", "/a/b/c").is_some());
    }

    #[test]
    fn routes_are_sorted() {
        let table = table(&[
            ("GET", "/"),
            ("GET", "/ping"),
            ("POST", "/b/:id"),
            ("GET", "/a/:id"),
            ("GET", "/message/:a/:b"),
        ]);
        let paths = table
            .routes()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec![
                "GET /message/:a/:b",
                "GET /a/:id",
                "POST /b/:id",
                "GET /ping",
                "GET /",
            ]
        );
    }

    #[test]
    fn resolves_from_many_threads() {
        let table = Arc::new(table(&[("GET", "/user/:id"), ("GET", "/health")]));
        let workers = (0..8)
            .map(|i| {
                let table = table.clone();
                std::thread::spawn(move || {
                    for n in 0..100 {
                        let path = format!("/user/{}", i * 100 + n);
                        let resolved = table.resolve("GET", &path).unwrap();
                        assert_eq!(
                            resolved.params().get("id"),
                            Some((i * 100 + n).to_string().as_str())
                        );
                        assert!(table.resolve("GET", "/health").is_some());
                    }
                })
            })
            .collect::<Vec<_>>();
        for worker in workers {
            worker.join().unwrap();
        }
    }
}

use std::pin::Pin;

use crate::{Context, Handler};

#[derive(Default, Debug, Clone)]
/// A middleware for tracing HTTP requests.
///
/// This logs (using `log`, at `info`) each request as it enters the chain,
/// along with the route it matched.  The router itself logs completion and
/// timing at `debug`.
pub struct TraceMiddleware {
    _v: (),
}

impl TraceMiddleware {
    #[must_use]
    /// Creates a new trace middleware.  This is provided as an alternative
    /// to `Default`.
    pub fn new() -> Self {
        TraceMiddleware::default()
    }
}

#[async_trait]
impl Handler for TraceMiddleware {
    async fn apply(self: Pin<&Self>, context: &mut Context) -> Result<(), anyhow::Error> {
        log::info!(
            "--> {} {} ({})",
            context.request().method(),
            context.request().uri().path(),
            context.route().unwrap_or("fallback")
        );
        Ok(())
    }

    fn describe(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TraceMiddleware")
    }
}

use super::Context;
use crate::handler::BoxHandler;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

impl Context {
    /// Stops the chain.  The handler calling this still runs to the end of
    /// its body, but no handler after it will run.  Whatever has been written
    /// to the response so far is what the client receives.
    ///
    /// # Examples
    /// ```rust
    /// # use thicket::*;
    /// fn guard(context: &mut Context) {
    ///     if context.header(http::header::AUTHORIZATION).is_none() {
    ///         context.text(http::StatusCode::UNAUTHORIZED, "who are you?");
    ///         context.abort();
    ///     }
    /// }
    ///
    /// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
    /// let mut http = thicket::http();
    /// http.with(guard);
    /// http.at("/secret").get(|context: &mut Context| {
    ///     context.text(http::StatusCode::OK, "42");
    /// })?;
    /// let response = http.handle(Request::get("/secret")?).await?;
    /// assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
    /// # Ok(())
    /// # }
    /// ```
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    /// Whether the chain was aborted, either by a handler or by a failure.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Runs the chain.  Running it again once it completed does nothing.
    pub(crate) async fn dispatch(&mut self) -> Result<(), anyhow::Error> {
        self.advance().await
    }

    async fn advance(&mut self) -> Result<(), anyhow::Error> {
        while !self.aborted {
            let index = self
                .index
                .map_or(0, |i| i + 1)
                .min(self.handlers.len());
            self.index = Some(index);
            let handler = match self.handlers.get(index) {
                Some(handler) => handler.clone(),
                None => break,
            };
            self.invoke(handler).await?;
        }

        Ok(())
    }

    async fn invoke(&mut self, handler: BoxHandler) -> Result<(), anyhow::Error> {
        if !self.options.recover {
            let result = handler.as_ref().apply(self).await;
            if result.is_err() {
                self.abort();
            }
            return result;
        }

        let outcome = AssertUnwindSafe(handler.as_ref().apply(self))
            .catch_unwind()
            .await;
        let failure = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(error)) => format!("{:#}", error),
            Err(payload) => format!("panic: {}", panic_message(&*payload)),
        };

        log::error!(
            "{} {} ({}) failed in {:?}: {}",
            self.request.method(),
            self.request.uri().path(),
            self.route().unwrap_or("fallback"),
            handler,
            failure
        );
        self.abort();
        self.response.reset_to_500();
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "Box<dyn Any>"
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Params;
    use crate::handler::{boxed, BoxHandler};
    use crate::router::{Options, Resolved};
    use crate::{Context, Request};
    use std::sync::Arc;

    fn context_with(handlers: Vec<BoxHandler>, recover: bool) -> Context {
        let resolved = Resolved {
            handlers: handlers.into(),
            params: Params::default(),
            route: Some(Arc::from("/test")),
        };
        let options = Options {
            recover,
            ..Options::default()
        };
        Context::new(Request::get("/test").unwrap(), resolved, options)
    }

    fn writes(text: &'static str) -> BoxHandler {
        boxed(move |context: &mut Context| context.write(text))
    }

    #[tokio::test]
    async fn runs_every_handler_once_in_order() {
        let mut context = context_with(vec![writes("a"), writes("b"), writes("c")], false);
        context.dispatch().await.unwrap();
        assert_eq!(context.response().body(), b"abc");
        assert!(!context.is_aborted());
        assert_eq!(context.index, Some(3));
    }

    #[tokio::test]
    async fn dispatching_twice_does_nothing() {
        let mut context = context_with(vec![writes("a"), writes("b")], false);
        context.dispatch().await.unwrap();
        context.dispatch().await.unwrap();
        assert_eq!(context.response().body(), b"ab");
        assert_eq!(context.index, Some(2));
    }

    #[tokio::test]
    async fn empty_chain_completes() {
        let mut context = context_with(Vec::new(), false);
        context.dispatch().await.unwrap();
        assert!(context.response().body().is_empty());
        assert_eq!(context.response().status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn abort_stops_later_handlers() {
        let guard = boxed(|context: &mut Context| {
            context.write("a");
            context.abort();
            context.write("!");
        });
        let mut context = context_with(vec![guard, writes("b"), writes("c")], false);
        context.dispatch().await.unwrap();
        assert_eq!(context.response().body(), b"a!");
        assert!(context.is_aborted());
        assert_eq!(context.index, Some(0));
    }

    #[tokio::test]
    async fn abort_in_last_handler_is_harmless() {
        let last = boxed(|context: &mut Context| context.abort());
        let mut context = context_with(vec![writes("a"), last], false);
        context.dispatch().await.unwrap();
        assert_eq!(context.response().body(), b"a");
        assert!(context.is_aborted());
    }

    #[tokio::test]
    async fn errors_propagate_without_recovery() {
        let failing = boxed(|_: &mut Context| -> Result<(), anyhow::Error> {
            Err(anyhow::anyhow!("database unreachable"))
        });
        let mut context = context_with(vec![writes("a"), failing, writes("c")], false);
        let error = context.dispatch().await.unwrap_err();
        assert_eq!(error.to_string(), "database unreachable");
        assert!(context.is_aborted());
        assert_eq!(context.response().body(), b"a");
    }

    #[tokio::test]
    async fn recovery_turns_errors_into_500() {
        let failing = boxed(|context: &mut Context| -> Result<(), anyhow::Error> {
            context.write("partial");
            Err(anyhow::anyhow!("database unreachable"))
        });
        let mut context = context_with(vec![failing, writes("c")], true);
        context.dispatch().await.unwrap();
        assert!(context.is_aborted());
        let response = context.into_response();
        assert_eq!(response.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), b"Internal Server Error");
    }

    #[tokio::test]
    async fn recovery_catches_panics() {
        let panicking = boxed(|context: &mut Context| -> () {
            context.write("partial");
            panic!("index out of bounds");
        });
        let mut context = context_with(vec![writes("a"), panicking, writes("c")], true);
        context.dispatch().await.unwrap();
        assert!(context.is_aborted());
        let response = context.into_response();
        assert_eq!(response.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), b"Internal Server Error");
        assert_eq!(
            response.header(http::header::CONTENT_TYPE),
            Some("text/plain; charset=utf-8")
        );
    }

    #[tokio::test]
    async fn keys_are_shared_along_the_chain() {
        let login = boxed(|context: &mut Context| context.set("auth.user", String::from("ana")));
        let greet = boxed(|context: &mut Context| {
            let user = context.get::<String>("auth.user");
            let user = user.as_deref().map_or("nobody", String::as_str);
            let text = format!("hello, {}", user);
            context.write(text);
        });
        let mut context = context_with(vec![login, greet], false);
        context.dispatch().await.unwrap();
        assert_eq!(context.response().body(), b"hello, ana");
    }

    #[tokio::test]
    async fn keys_outlive_the_handler() {
        let spawn = boxed(crate::handlers::future(|context| {
            let keys = context.keys().clone();
            Box::pin(async move {
                tokio::spawn(async move { keys.set("job", 1u8) }).await?;
                Ok::<_, anyhow::Error>(())
            })
        }));
        let check = boxed(|context: &mut Context| {
            let found = context.get::<u8>("job").is_some();
            context.write(if found { "yes" } else { "no" });
        });
        let mut context = context_with(vec![spawn, check], false);
        context.dispatch().await.unwrap();
        assert_eq!(context.response().body(), b"yes");
    }

    #[test]
    fn panic_messages() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(super::panic_message(&*payload), "static");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(super::panic_message(&*payload), "owned");
        let payload: Box<dyn std::any::Any + Send> = Box::new(3u8);
        assert_eq!(super::panic_message(&*payload), "Box<dyn Any>");
    }
}

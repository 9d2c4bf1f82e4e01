use super::Router;
use crate::request::PeerAddress;
use crate::{Response, ThicketError};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// How long [`Router::listen_graceful`] waits for in-flight requests once a
/// shutdown signal arrives.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

impl Router {
    /// Creates a listen server on the specified address.
    ///
    /// Unless the router is [`Router::quiet`], the route table is logged at
    /// `info` first.  The server then runs until the termination signal (see
    /// [`Router::termination_signal`]) fires, or forever.
    ///
    /// # Errors
    /// This can fail if the socket address is invalid, or if the socket is
    /// already in use.
    ///
    /// # Examples
    /// ```rust,no_run
    /// # use thicket::*;
    /// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
    /// let mut http = thicket::http();
    /// http.at("/").get(|context: &mut Context| {
    ///     context.text(http::StatusCode::OK, "hello, world!");
    /// })?;
    /// http.listen("0.0.0.0:8080").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn listen(mut self, address: &str) -> Result<(), ThicketError> {
        let address: SocketAddr = address
            .parse()
            .map_err(|_| ThicketError::InvalidAddress(address.to_owned()))?;

        if !self.quiet {
            for route in self.routes() {
                log::info!("{:<6} {}", route.method, route.path);
            }
            log::info!("listen({})", address);
        }

        let termination = self.terminate.take();
        let termination = async {
            match termination {
                Some(mut tx) => loop {
                    if *tx.borrow() {
                        break;
                    }
                    match tx.changed().await {
                        Ok(_) => continue,
                        Err(_) => futures::future::pending().await,
                    }
                },
                None => futures::future::pending().await,
            }
        };

        let this = Arc::pin(self);

        hyper::server::Server::try_bind(&address)
            .map_err(ThicketError::HyperServer)?
            .serve(hyper::service::make_service_fn(
                |v: &hyper::server::conn::AddrStream| {
                    let router = this.clone();
                    let service = RouterService(router, v.remote_addr());
                    async move { Ok::<_, std::convert::Infallible>(service) }
                },
            ))
            .with_graceful_shutdown(termination)
            .await
            .map_err(ThicketError::HyperServer)?;

        Ok(())
    }

    /// Like [`Router::listen`], but shuts down on SIGINT or SIGTERM (only
    /// Ctrl-C outside of Unix).  In-flight requests get five seconds to
    /// finish; after that the server stops regardless.
    ///
    /// # Errors
    /// See [`Router::listen`].
    ///
    /// # Examples
    /// ```rust,no_run
    /// # #[tokio::main] async fn main() -> Result<(), anyhow::Error> {
    /// let http = thicket::http();
    /// http.listen_graceful("0.0.0.0:8080").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn listen_graceful(self, address: &str) -> Result<(), ThicketError> {
        self.listen_until(address, shutdown_signal(), SHUTDOWN_DEADLINE)
            .await
    }

    async fn listen_until<F>(
        mut self,
        address: &str,
        signal: F,
        deadline: Duration,
    ) -> Result<(), ThicketError>
    where
        F: Future<Output = ()>,
    {
        let trigger = self.termination_signal();
        let server = self.listen(address);
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => return result,
            () = signal => {}
        }

        log::info!("shutting down");
        // The receiver lives inside `server`, which is still alive.
        let _ = trigger.send(true);
        match tokio::time::timeout(deadline, server).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("shutdown deadline of {:?} passed, dropping connections", deadline);
                Ok(())
            }
        }
    }
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            log::error!("could not listen for ctrl-c: {}", error);
            futures::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                log::error!("could not listen for SIGTERM: {}", error);
                futures::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = futures::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}

#[derive(Clone)]
struct RouterService(Pin<Arc<Router>>, SocketAddr);

type RouterFuture<R, E> = Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'static>>;

impl tower::Service<hyper::Request<hyper::Body>> for RouterService {
    type Response = hyper::Response<hyper::Body>;
    type Error = std::convert::Infallible;
    type Future = RouterFuture<Self::Response, Self::Error>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut request: hyper::Request<hyper::Body>) -> Self::Future {
        let this = (self.0).clone();
        request.extensions_mut().insert(PeerAddress(self.1));
        Box::pin(async move {
            let response: hyper::Response<hyper::Body> =
                respond(&this, request.into()).await.into();
            Ok::<_, std::convert::Infallible>(response)
        })
    }
}

async fn respond(router: &Router, request: crate::Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    match router.handle(request).await {
        Ok(response) => response,
        Err(error) => {
            log::error!("{} {}: {:#}", method, path, error);
            Response::empty_500()
        }
    }
}

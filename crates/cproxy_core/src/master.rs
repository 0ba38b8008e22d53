use std::{convert::Infallible, future::Future, net::SocketAddr, sync::Arc};

use cproxy_config::ProxyConfig;
use cproxy_origin::{Forwarder, OriginForwarder};
use hyper::{body::Incoming, server::conn::http1, service::service_fn, Request};
use hyper_util::rt::TokioIo;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::Semaphore,
};
use tracing::{debug, error, info, instrument, warn};

use crate::router::Router;

pub struct Master<F> {
    cfg: Arc<ProxyConfig>,
    router: Arc<Router<F>>,
}

impl Master<OriginForwarder> {
    pub fn new(cfg: ProxyConfig) -> Self {
        let forwarder = OriginForwarder::from_config(&cfg);
        Self::with_forwarder(cfg, forwarder)
    }
}

impl<F: Forwarder> Master<F> {
    pub fn with_forwarder(cfg: ProxyConfig, forwarder: F) -> Self {
        let router = Arc::new(Router::new(&cfg, forwarder));
        Self {
            cfg: Arc::new(cfg),
            router,
        }
    }

    /// Binds the configured address and serves until Ctrl+C.
    #[instrument(skip(self), fields(
        origin = %self.cfg.origin(),
        ttl_secs = self.cfg.ttl_secs,
        max_connections = self.cfg.max_connections,
    ))]
    pub async fn run(self) -> anyhow::Result<()> {
        info!(target: "cproxy::master", "Starting caching proxy");

        let listen_addr = self.cfg.listen_addr();
        let listener = match TcpListener::bind(&listen_addr).await {
            Ok(l) => {
                info!(target: "cproxy::master", listen = %listen_addr, "Bind() successful");
                l
            }
            Err(e) => {
                error!(
                    target: "cproxy::master",
                    listen = %listen_addr,
                    error = ?e,
                    "Failed to bind listener"
                );
                return Err(e.into());
            }
        };

        self.serve(listener, shutdown_signal()).await
    }

    /// Accept loop over an already bound listener; returns once `shutdown`
    /// resolves. Connections already accepted keep running in their tasks.
    pub async fn serve<S>(self, listener: TcpListener, shutdown: S) -> anyhow::Result<()>
    where
        S: Future<Output = ()>,
    {
        let local_addr = listener.local_addr()?;

        // Global limit for concurrent client connections
        let max_conns = self.cfg.max_connections.min(Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(max_conns));

        info!(
            target: "cproxy::master",
            listen = %local_addr,
            origin = %self.cfg.origin(),
            max_conns,
            "Waiting for incoming connections (Ctrl+C to stop)..."
        );

        tokio::pin!(shutdown);

        loop {
            // Reserve a slot before accepting so a full cap still sees Ctrl+C
            let permit = tokio::select! {
                _ = &mut shutdown => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(e) => {
                        error!(
                            target: "cproxy::master",
                            error = ?e,
                            "Failed to acquire connection permit"
                        );
                        return Err(e.into());
                    }
                },
            };

            let (stream, client_addr) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!(
                            target: "cproxy::master",
                            listen = %local_addr,
                            error = ?e,
                            "Failed to accept connection"
                        );
                        return Err(e.into());
                    }
                },
            };

            debug!(
                target: "cproxy::master",
                %client_addr,
                available_permits = semaphore.available_permits(),
                "New connection accepted"
            );

            let router = self.router.clone();
            tokio::spawn(async move {
                serve_connection(stream, client_addr, router).await;
                drop(permit);
            });
        }

        info!(target: "cproxy::master", listen = %local_addr, "Shutdown requested; no longer accepting");
        Ok(())
    }
}

/// One task per client connection. Write failures stay inside this task.
#[instrument(skip(stream, router), fields(client_addr = %client_addr))]
async fn serve_connection<F: Forwarder>(
    stream: TcpStream,
    client_addr: SocketAddr,
    router: Arc<Router<F>>,
) {
    let service = service_fn(move |req: Request<Incoming>| {
        let router = router.clone();
        async move { Ok::<_, Infallible>(router.handle(req).await) }
    });

    if let Err(e) = http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await
    {
        error!(
            target: "cproxy::worker",
            %client_addr,
            error = ?e,
            "Failed writing response to client"
        );
    } else {
        debug!(target: "cproxy::worker", %client_addr, "Connection closed");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(
            target: "cproxy::master",
            error = ?e,
            "Unable to listen for Ctrl+C; running until killed"
        );
        std::future::pending::<()>().await;
    }
}

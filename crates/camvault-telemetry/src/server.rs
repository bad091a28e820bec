//! `/metrics` endpoint for Prometheus scraping
//!
//! Plain HTTP/1.1, one spawned task per connection. Only `GET /metrics` is
//! answered with data; every other path gets a 404.

use std::{net::SocketAddr, sync::Arc};

use http_body_util::Full;
use hyper::{
    body::Bytes,
    header::{HeaderValue, CONTENT_TYPE},
    server::conn::http1,
    service::service_fn,
    Method, Request, Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::metrics::MetricsRegistry;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Serves a [`MetricsRegistry`] until shut down
pub struct MetricsServer {
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
}

impl MetricsServer {
    /// `endpoint` is a socket address such as `127.0.0.1:9464`
    pub fn new(metrics: Arc<MetricsRegistry>, endpoint: &str) -> anyhow::Result<Self> {
        Ok(Self {
            metrics,
            addr: endpoint.parse()?,
        })
    }

    /// Binds the configured address and serves until `shutdown` is canceled
    pub async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` is canceled
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> anyhow::Result<()> {
        info!(addr = %listener.local_addr()?, "Metrics endpoint listening");

        loop {
            let stream = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "Metrics scrape connection");
                        stream
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to accept metrics connection");
                        continue;
                    }
                },
            };
            tokio::spawn(serve_connection(stream, Arc::clone(&self.metrics)));
        }

        info!("Metrics endpoint stopped");
        Ok(())
    }
}

async fn serve_connection(stream: TcpStream, metrics: Arc<MetricsRegistry>) {
    let service = service_fn(move |req| {
        let response = respond(&req, &metrics);
        async move { Ok::<_, hyper::Error>(response) }
    });

    if let Err(e) = http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await
    {
        debug!(error = %e, "Metrics connection closed with error");
    }
}

fn respond<B>(req: &Request<B>, metrics: &MetricsRegistry) -> Response<Full<Bytes>> {
    let (status, body) = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => match metrics.encode() {
            Ok(text) => (StatusCode::OK, text),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {e}"),
            ),
        },
        _ => (StatusCode::NOT_FOUND, "Not Found".to_string()),
    };

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    if status == StatusCode::OK {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_FORMAT));
    }
    response
}

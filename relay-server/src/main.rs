use command_relay::{Config, Relay};
use http_body_util::{combinators::BoxBody, BodyExt};
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod handlers;

const DEFAULT_LOG_FILTER: &str = "error,relay_server=info,command_relay=info";

/// Serves a single request. Every request is a command for the relay, whatever the path,
/// so the same binary works behind a serverless custom handler route or standalone.
async fn relay_handler(
    relay: Arc<Relay>,
    req: Request<hyper::body::Incoming>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, hyper::Error> {
    let span = info_span!("request", id = %Uuid::new_v4());

    async move {
        debug!("{} {:?}", req.method(), req.uri());

        let method = req.method().clone();
        let body = req.into_body().collect().await?.to_bytes();

        let envelope = relay.handle(&method, &body).await;
        info!("Response: {}", envelope.status_code);

        Ok(handlers::envelope_response(&envelope))
    }
    .instrument(span)
    .await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    // the config and the relay are built once and shared by all connections
    let config = Config::from_env()?;
    let relay = Arc::new(Relay::from_config(&config)?);

    // bind to a TCP port and start a loop to continuously accept incoming connections
    let listener = TcpListener::bind(config.listener).await?;
    info!("Listening on http://{}", config.listener);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let relay = relay.clone();

        // Spawn a tokio task to serve multiple connections concurrently
        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, service_fn(move |req| relay_handler(relay.clone(), req)))
                .await
            {
                debug!("TCP error: {:?}", err);
            }
        });
    }
}

/// Initializes the tracing from RUST_LOG env var if present or sets minimal logging:
/// - INFO for the server and the relay
/// - ERROR for everything else
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .init();
}

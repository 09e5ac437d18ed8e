use command_relay::{Config, Relay};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{debug, info, info_span, Instrument};

mod gateway;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // CloudWatch adds the ingestion time and does not render colors
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_ansi(false)
        .without_time()
        .compact()
        .init();

    // built once per container and reused by all invocations it serves
    let config = Config::from_env()?;
    let relay = Relay::from_config(&config)?;
    let relay = &relay;

    if let Err(e) = lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| my_handler(relay, event))).await {
        debug!("Runtime error: {:?}", e);
        return Err(e);
    }

    Ok(())
}

async fn my_handler(relay: &Relay, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let (event, ctx) = event.into_parts();
    let span = info_span!("request", id = %ctx.request_id);

    async move {
        let envelope = gateway::invoke(relay, event).await;
        info!("Response: {}", envelope.status_code);

        Ok(gateway::proxy_response(&envelope))
    }
    .instrument(span)
    .await
}

//! Entry point (C10): wires the Config, Store, and one of the runnable
//! processes (aggregator, persister, producer, or the Read API) together
//! behind a subcommand, in the spirit of the teacher's standalone
//! `bin/*.rs` services.

use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use surge_pricing_backend::config::Config;
use surge_pricing_backend::persist::EventStore;
use surge_pricing_backend::producer::{self, Producer};
use surge_pricing_backend::store::Store;
use surge_pricing_backend::stream::{AggregateKind, PersistKind, StreamAggregator, StreamPersister, StreamProcessor, StreamProcessorConfig};
use surge_pricing_backend::AppState;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EventKind {
    DriverPosition,
    Order,
}

#[derive(Parser, Debug)]
#[command(name = "surge-pricing")]
#[command(about = "Surge pricing stream-aggregation backend")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Consumer name for this process, within its consumer group.
    #[arg(long, global = true, default_value = "consumer-1", env = "CONSUMER_NAME")]
    consumer_name: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs the stream aggregator for one event kind.
    Aggregate {
        #[arg(value_enum)]
        kind: EventKind,
    },
    /// Runs the durable-store persister for one event kind.
    Persist {
        #[arg(value_enum)]
        kind: EventKind,
    },
    /// Runs the synthetic event producer for one event kind.
    Produce {
        #[arg(value_enum)]
        kind: EventKind,
    },
    /// Runs the Read API HTTP server.
    Api,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = Config::from_env();

    match args.command {
        Command::Aggregate { kind } => run_aggregate(config, args.consumer_name, kind).await,
        Command::Persist { kind } => run_persist(config, args.consumer_name, kind).await,
        Command::Produce { kind } => run_produce(config, kind).await,
        Command::Api => run_api(config).await,
    }
}

fn processor_config(config: &Config, stream_name: String, consumer_name: String, group: &str) -> StreamProcessorConfig {
    StreamProcessorConfig {
        stream_name,
        consumer_group: group.to_string(),
        consumer_name,
        batch_size: config.batch_size,
        reclaim_interval: config.reclaim_interval,
        read_timeout: config.read_timeout,
        idle_sleep: config.idle_sleep,
        min_idle_for_reclaim: config.min_idle_for_reclaim,
    }
}

async fn run_aggregate(config: Config, consumer_name: String, kind: EventKind) -> anyhow::Result<()> {
    let store = Store::connect(&config.redis_url()).await?;
    let (stream_name, aggregate_kind, group) = match kind {
        EventKind::DriverPosition => (
            config.driver_stream.clone(),
            AggregateKind::DriverPosition,
            "driver_position_consumer_group",
        ),
        EventKind::Order => (config.order_stream.clone(), AggregateKind::Order, "order_consumer_group"),
    };
    info!(stream = %stream_name, "starting aggregator");

    let proc_config = processor_config(&config, stream_name, consumer_name, group);
    let handler = StreamAggregator::new(aggregate_kind, config.resolutions.clone());
    let processor = StreamProcessor::new(store, proc_config, handler);
    processor.run().await
}

async fn run_persist(config: Config, consumer_name: String, kind: EventKind) -> anyhow::Result<()> {
    let store = Store::connect(&config.redis_url()).await?;
    let events = EventStore::open(&config.persist_db_path)?;
    let (stream_name, persist_kind, group) = match kind {
        EventKind::DriverPosition => (
            config.driver_stream.clone(),
            PersistKind::DriverPosition,
            "driver_position_persist_consumer_group",
        ),
        EventKind::Order => (
            config.order_stream.clone(),
            PersistKind::Order,
            "order_persist_consumer_group",
        ),
    };
    info!(stream = %stream_name, db = %config.persist_db_path, "starting persister");

    let proc_config = processor_config(&config, stream_name, consumer_name, group);
    let handler = StreamPersister::new(persist_kind, events);
    let processor = StreamProcessor::new(store, proc_config, handler);
    processor.run().await
}

async fn run_produce(config: Config, kind: EventKind) -> anyhow::Result<()> {
    let store = Store::connect(&config.redis_url()).await?;
    match kind {
        EventKind::DriverPosition => {
            let producer = Producer::new(
                store,
                config.driver_stream.clone(),
                config.produce_interval,
                producer::generate_driver_position,
            );
            producer.run().await
        }
        EventKind::Order => {
            let producer = Producer::new(
                store,
                config.order_stream.clone(),
                config.produce_interval,
                producer::generate_order,
            );
            producer.run().await
        }
    }
}

async fn run_api(config: Config) -> anyhow::Result<()> {
    let store = Store::connect(&config.redis_url()).await?;
    let bind_addr = config.api_bind_addr.clone();
    let state = Arc::new(AppState { store, config });

    let app = surge_pricing_backend::api::router(state);
    info!(bind_addr = %bind_addr, "starting read api");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

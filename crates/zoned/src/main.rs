use clap::Parser;
use dns_store::{RedisStore, RedisStoreConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::SocketAddr;
use std::sync::Arc;

mod diagnostic;
mod lifecycle;
mod resolver;
mod server;

use diagnostic::{DiagnosticFormat, LoggingConfig};
use lifecycle::LifeCycle;
use resolver::QueryResolver;
use server::UdpServer;

/// Authoritative DNS server answering out of a Redis-backed zone store.
#[derive(Debug, Parser)]
#[command(about, version)]
struct Opt {
    /// Port that we should listen on for UDP DNS queries.
    #[arg(long, default_value_t = 53)]
    port: u16,

    /// Address of the redis server, in the form
    /// `redis://[:password@]host[:port][/db-number][?option=value]`.
    #[arg(long, env = "REDIS_URL")]
    redis: String,

    /// Name presented as the zone authority in synthesised SOA answers for
    /// names that do not exist.
    #[arg(long, default_value = "ns.local")]
    authority: String,

    /// How diagnostic logs render. full, compact and pretty are intended
    /// for human consumption; json outputs machine readable records.
    #[arg(long, default_value = "full")]
    diag_format: DiagnosticFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opt::parse();

    LoggingConfig {
        filter_env_var: "ZONED_LOG",
        default_filter: "zoned=info,dns_store=info",
        diag_format: opts.diag_format,
    }
    .init()?;

    if opts.port == 0 {
        anyhow::bail!("0 is not a valid port number");
    }

    let store = Arc::new(RedisStore::open(RedisStoreConfig::new(&opts.redis))?);
    let resolver = Arc::new(QueryResolver::new(
        store,
        &opts.authority,
        StdRng::from_entropy(),
    ));

    let mut life_cycle = LifeCycle::new();
    let server = UdpServer::bind(SocketAddr::from(([0, 0, 0, 0], opts.port)), resolver).await?;
    let mut server_task = tokio::spawn(async move { server.run().await });

    tokio::select! {
        result = &mut server_task => {
            match result {
                Ok(Ok(())) => tracing::error!("listener stopped unexpectedly"),
                Ok(Err(err)) => tracing::error!("listener failed: {err:#}"),
                Err(err) => tracing::error!("listener task aborted: {err}"),
            }
        }
        _ = life_cycle.wait_for_shutdown() => {
            tracing::info!("shutdown complete");
        }
    }

    Ok(())
}

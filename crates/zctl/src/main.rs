use clap::Parser;
use dns_admin::{AdminError, Engine};
use dns_store::{RedisStore, RedisStoreConfig};
use std::sync::Arc;

mod add;
mod list;
mod remove;
mod set;

/// Manage the records served by the DNS server.
///
/// Records live in the same redis keyspace the server answers from;
/// changes take effect on the next query.
#[derive(Debug, Parser)]
#[command(about, version)]
struct Opt {
    /// Redis server that we should connect to. Its format is
    /// `redis://[:password@]host[:port][/db-number]`.
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    redis: String,

    #[command(subcommand)]
    cmd: SubCommand,
}

#[derive(Debug, Parser)]
enum SubCommand {
    List(list::ListCommand),
    Add(add::AddCommand),
    Set(set::SetCommand),
    Remove(remove::RemoveCommand),
}

impl SubCommand {
    async fn run(&self, engine: &Engine) -> anyhow::Result<()> {
        match self {
            Self::List(cmd) => cmd.run(engine).await,
            Self::Add(cmd) => cmd.run(engine).await,
            Self::Set(cmd) => cmd.run(engine).await,
            Self::Remove(cmd) => cmd.run(engine).await,
        }
    }
}

/// Split a comma-separated flag value, treating a missing flag as empty.
pub(crate) fn comma_list(value: &Option<String>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(value) if value.is_empty() => Vec::new(),
        Some(value) => value.split(',').map(|s| s.to_string()).collect(),
    }
}

async fn run(opts: Opt) -> anyhow::Result<()> {
    let store = Arc::new(RedisStore::open(RedisStoreConfig::new(&opts.redis))?);
    let engine = Engine::new(store);
    opts.cmd.run(&engine).await
}

#[tokio::main]
async fn main() {
    let opts = Opt::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("ZCTL_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = match run(opts).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {err:#}");
            match err.downcast_ref::<AdminError>() {
                Some(admin) if admin.is_usage_error() => 2,
                _ => 1,
            }
        }
    };
    std::process::exit(code);
}

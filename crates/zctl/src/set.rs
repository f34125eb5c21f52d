use crate::comma_list;
use clap::Parser;
use dns_admin::{parse_tristate, AddressPatch, Engine};
use dns_record::RecordKind;
use std::str::FromStr;

/// Replace the contents of a typed section with exactly the given values.
#[derive(Debug, Parser)]
pub struct SetCommand {
    /// Domain the record belongs to.
    #[arg(long)]
    domain: String,

    /// Name of the record; `@` means the domain itself and `*` the
    /// wildcard record.
    #[arg(long, default_value = "@")]
    name: String,

    /// Kind of the values being set.
    #[arg(long, value_parser = RecordKind::from_str)]
    kind: RecordKind,

    /// Comma-separated values; omit to change only the multi flag.
    #[arg(long)]
    value: Option<String>,

    /// Should queries return every active address (`true`), or exactly one
    /// picked by weighted selection (`false`)? Not accepted for SRV.
    #[arg(long, value_parser = parse_tristate)]
    multi: Option<bool>,

    /// TTL of the addresses, in seconds.
    #[arg(long)]
    ttl: Option<u32>,

    /// Weight of the addresses, used in load balancing mode.
    #[arg(long)]
    weight: Option<u16>,

    /// For kinds that support it, the priority of the addresses.
    #[arg(long)]
    priority: Option<u16>,

    /// Is this address enabled?
    #[arg(long, value_parser = parse_tristate)]
    enabled: Option<bool>,

    /// Is this address healthy?
    #[arg(long, value_parser = parse_tristate)]
    healthy: Option<bool>,
}

impl SetCommand {
    pub async fn run(&self, engine: &Engine) -> anyhow::Result<()> {
        let patch = AddressPatch {
            ttl: self.ttl,
            enabled: self.enabled,
            healthy: self.healthy,
            weight: self.weight,
            priority: self.priority,
        };

        // multi=false means a load-balanced record: one answer per query
        let weighted = self.multi.map(|multi| !multi);
        let values = comma_list(&self.value);

        engine
            .set(&self.domain, &self.name, self.kind, &values, &patch, weighted)
            .await?;

        println!("Updated `{}`", dns_store::record_key(&self.domain, &self.name));
        Ok(())
    }
}

use clap::Parser;
use dns_admin::{parse_tristate, AddressPatch, Engine};
use dns_record::RecordKind;
use std::str::FromStr;

/// Add one or more addresses to a record, or update the attributes of the
/// matching addresses in place.
#[derive(Debug, Parser)]
pub struct AddCommand {
    /// Domain the record belongs to.
    #[arg(long)]
    domain: String,

    /// Name of the record; `@` means the domain itself and `*` the
    /// wildcard record.
    #[arg(long, default_value = "@")]
    name: String,

    /// Kind of the values being added.
    #[arg(long, value_parser = RecordKind::from_str)]
    kind: RecordKind,

    /// Comma-separated values: IPs for A/AAAA, names for CNAME/NS/MX,
    /// text for TXT, `target:port` for SRV.
    #[arg(long)]
    value: String,

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

impl AddCommand {
    pub async fn run(&self, engine: &Engine) -> anyhow::Result<()> {
        let patch = AddressPatch {
            ttl: self.ttl,
            enabled: self.enabled,
            healthy: self.healthy,
            weight: self.weight,
            priority: self.priority,
        };

        let mut changed = false;
        for value in self.value.split(',') {
            changed |= engine
                .add(&self.domain, &self.name, self.kind, value, &patch)
                .await?;
        }

        if changed {
            println!("Updated `{}`", dns_store::record_key(&self.domain, &self.name));
        } else {
            println!("Nothing to update");
        }
        Ok(())
    }
}

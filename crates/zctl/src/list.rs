use crate::comma_list;
use clap::Parser;
use dns_admin::{parse_tristate, AddressSelector, Engine, KindSelector, ListFilter};
use dns_record::AnyAddress;

/// List records and addresses matching the given criteria.
#[derive(Debug, Parser)]
pub struct ListCommand {
    /// Domain or comma-separated list of domains; glob patterns are
    /// accepted. Omit to list every domain.
    #[arg(long)]
    domain: Option<String>,

    /// Name(s) of the record(s); glob patterns are accepted.
    #[arg(long)]
    name: Option<String>,

    /// Kind(s) of values to show; `*` means every kind.
    #[arg(long)]
    kind: Option<String>,

    /// Only show addresses with these values (comma-separated).
    #[arg(long)]
    value: Option<String>,

    /// Only show addresses with this TTL.
    #[arg(long)]
    ttl: Option<u32>,

    /// Only show addresses with this weight.
    #[arg(long)]
    weight: Option<u16>,

    /// Only show addresses with this priority.
    #[arg(long)]
    priority: Option<u16>,

    /// Only show addresses in this enabled state.
    #[arg(long, value_parser = parse_tristate)]
    enabled: Option<bool>,

    /// Only show addresses in this health state.
    #[arg(long, value_parser = parse_tristate)]
    healthy: Option<bool>,
}

impl ListCommand {
    pub async fn run(&self, engine: &Engine) -> anyhow::Result<()> {
        let kinds = match &self.kind {
            None => KindSelector::Any,
            Some(kind) => KindSelector::parse(kind)?,
        };
        let filter = ListFilter {
            domains: comma_list(&self.domain),
            names: comma_list(&self.name),
            selector: AddressSelector {
                kinds,
                values: comma_list(&self.value),
                ttl: self.ttl,
                enabled: self.enabled,
                healthy: self.healthy,
                weight: self.weight,
                priority: self.priority,
            },
        };

        let entries = engine.list(&filter).await?;

        let mut last_key: Option<&str> = None;
        for entry in &entries {
            if last_key != Some(entry.key.as_str()) {
                last_key = Some(entry.key.as_str());
                println!("{}({}):", entry.key, entry.domain);
            }
            println!("  - {}", format_address(&entry.address));
        }
        Ok(())
    }
}

fn format_address(address: &AnyAddress) -> String {
    let attrs = address.attrs();
    let mut line = format!("{} {}", address.kind(), address.value());
    if let Some(priority) = address.priority() {
        line.push_str(&format!(" priority={priority}"));
    }
    line.push_str(&format!(
        " ttl={} weight={} enabled={} healthy={}",
        attrs.ttl,
        attrs.weight,
        yes_no(attrs.enabled),
        yes_no(attrs.healthy)
    ));
    line
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

use crate::comma_list;
use clap::Parser;
use dns_admin::{parse_tristate, AddressSelector, AdminError, Engine, KindSelector};

/// Remove addresses or whole records.
///
/// With only a domain, the whole zone is removed. With a name but no other
/// filters, the one record for that name is removed. With a kind, values
/// or attribute filters, only the matching addresses are removed and the
/// record is deleted once nothing remains in it.
#[derive(Debug, Parser)]
pub struct RemoveCommand {
    /// Domain the records belong to.
    #[arg(long)]
    domain: String,

    /// Name of the record; omit to remove the whole zone.
    #[arg(long)]
    name: Option<String>,

    /// Kinds to remove, comma-separated; `*` means every kind.
    #[arg(long)]
    kind: Option<String>,

    /// Only remove addresses with these values (comma-separated).
    #[arg(long)]
    value: Option<String>,

    /// Only remove addresses with this TTL.
    #[arg(long)]
    ttl: Option<u32>,

    /// Only remove addresses with this weight.
    #[arg(long)]
    weight: Option<u16>,

    /// Only remove addresses with this priority.
    #[arg(long)]
    priority: Option<u16>,

    /// Only remove addresses in this enabled state.
    #[arg(long, value_parser = parse_tristate)]
    enabled: Option<bool>,

    /// Only remove addresses in this health state.
    #[arg(long, value_parser = parse_tristate)]
    healthy: Option<bool>,
}

impl RemoveCommand {
    fn selector(&self) -> Result<AddressSelector, AdminError> {
        let kinds = match &self.kind {
            None => KindSelector::Any,
            Some(kind) => KindSelector::parse(kind)?,
        };
        Ok(AddressSelector {
            kinds,
            values: comma_list(&self.value),
            ttl: self.ttl,
            enabled: self.enabled,
            healthy: self.healthy,
            weight: self.weight,
            priority: self.priority,
        })
    }

    pub async fn run(&self, engine: &Engine) -> anyhow::Result<()> {
        let selector = self.selector()?;

        // an empty name means the whole zone, the same as omitting it
        let name = self.name.as_deref().filter(|name| !name.is_empty());
        let removed = match name {
            None => {
                if !selector.is_unconstrained() {
                    return Err(AdminError::invalid(
                        "kind and attribute filters need a --name; they cannot apply to a whole zone",
                    )
                    .into());
                }
                engine.remove_zone(&self.domain).await?
            }
            Some(name) if selector.is_unconstrained() => engine
                .remove_record(&self.domain, name)
                .await?
                .into_iter()
                .collect(),
            Some(name) => {
                engine
                    .remove_addresses(&self.domain, name, &selector)
                    .await?
            }
        };

        if removed.is_empty() {
            println!("No records found");
        } else {
            println!("{} records deleted/updated:", removed.len());
            for item in &removed {
                println!("    {item}");
            }
        }
        Ok(())
    }
}

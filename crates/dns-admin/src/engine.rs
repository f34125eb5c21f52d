use crate::filter::{AddressSelector, ListFilter};
use crate::validate::{parse_srv_value, validate_domain, validate_label, validate_target_name};
use crate::AdminError;
use dns_record::{
    remove_matching, remove_matching_srv, Address, AddressAttrs, AnyAddress, Document, IpAddress,
    MxAddress, NameAddress, RecordKind, RecordSet, SrvAddress, SrvSet,
};
use dns_store::pattern::{compile_globs, is_glob};
use dns_store::{display_key, record_key, zone_members_pattern, RecordStore};
use std::net::IpAddr;
use std::sync::Arc;

/// Attribute values supplied by the caller. Only supplied fields are
/// applied when an existing address is updated; unsupplied fields fall back
/// to the documented defaults when a new address is created.
#[derive(Debug, Clone, Default)]
pub struct AddressPatch {
    pub ttl: Option<u32>,
    pub enabled: Option<bool>,
    pub healthy: Option<bool>,
    pub weight: Option<u16>,
    pub priority: Option<u16>,
}

impl AddressPatch {
    fn build_attrs(&self) -> AddressAttrs {
        let mut attrs = AddressAttrs::default();
        if let Some(ttl) = self.ttl {
            attrs.ttl = ttl;
        }
        if let Some(enabled) = self.enabled {
            attrs.enabled = enabled;
        }
        if let Some(healthy) = self.healthy {
            attrs.healthy = healthy;
        }
        if let Some(weight) = self.weight {
            attrs.weight = weight;
        }
        attrs
    }

    /// Returns whether anything actually changed.
    fn apply_attrs(&self, attrs: &mut AddressAttrs) -> bool {
        let mut changed = false;
        if let Some(ttl) = self.ttl {
            changed |= attrs.ttl != ttl;
            attrs.ttl = ttl;
        }
        if let Some(enabled) = self.enabled {
            changed |= attrs.enabled != enabled;
            attrs.enabled = enabled;
        }
        if let Some(healthy) = self.healthy {
            changed |= attrs.healthy != healthy;
            attrs.healthy = healthy;
        }
        if let Some(weight) = self.weight {
            changed |= attrs.weight != weight;
            attrs.weight = weight;
        }
        changed
    }
}

/// One row of `list` output: the human-facing key plus a kind-tagged
/// address.
#[derive(Debug, Clone)]
pub struct ListEntry {
    pub key: String,
    pub domain: String,
    pub address: AnyAddress,
}

/// The record mutation engine. All writers (CLI, controller) go through
/// here so the read-modify-write and collapse rules are applied uniformly.
pub struct Engine {
    store: Arc<dyn RecordStore>,
}

impl Engine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Strict read for read-modify-write: malformed documents refuse the
    /// update, and a document claiming another domain is never touched.
    async fn read_for_update(
        &self,
        domain: &str,
        label: &str,
    ) -> Result<(String, Option<Document>), AdminError> {
        let key = record_key(domain, label);
        match self.store.get(&key).await? {
            None => Ok((key, None)),
            Some(doc) => {
                if doc.domain != domain {
                    Err(AdminError::DomainMismatch {
                        key,
                        expected: domain.to_string(),
                        found: doc.domain,
                    })
                } else {
                    Ok((key, Some(doc)))
                }
            }
        }
    }

    /// Add one address, or update the matching one in place. Returns
    /// whether the document changed (an identical re-add is a no-op and
    /// does not write).
    pub async fn add(
        &self,
        domain: &str,
        label: &str,
        kind: RecordKind,
        value: &str,
        patch: &AddressPatch,
    ) -> Result<bool, AdminError> {
        let domain = domain.to_ascii_lowercase();
        let label = label.to_ascii_lowercase();
        validate_domain(&domain, false)?;
        validate_label(&label)?;

        let (key, doc) = self.read_for_update(&domain, &label).await?;
        let mut doc = doc.unwrap_or_else(|| Document::new(&domain));

        let changed = match kind {
            RecordKind::A => {
                let addr = IpAddress {
                    attrs: patch.build_attrs(),
                    ip: parse_ipv4(value)?,
                };
                upsert(&mut doc.a, addr, patch)
            }
            RecordKind::Aaaa => {
                let addr = IpAddress {
                    attrs: patch.build_attrs(),
                    ip: parse_ipv6(value)?,
                };
                upsert(&mut doc.aaaa, addr, patch)
            }
            RecordKind::Cname => {
                validate_target_name(value)?;
                upsert(&mut doc.cname, name_address(value, patch), patch)
            }
            RecordKind::Ns => {
                validate_target_name(value)?;
                upsert(&mut doc.ns, name_address(value, patch), patch)
            }
            RecordKind::Txt => {
                if value.is_empty() {
                    return Err(AdminError::invalid("missing value"));
                }
                upsert(&mut doc.txt, name_address(value, patch), patch)
            }
            RecordKind::Mx => {
                validate_target_name(value)?;
                let addr = MxAddress {
                    attrs: patch.build_attrs(),
                    server: value.to_string(),
                    priority: patch.priority.unwrap_or(1),
                };
                upsert_mx(&mut doc.mx, addr, patch)
            }
            RecordKind::Srv => {
                let (target, port) = parse_srv_value(value)?;
                let addr = SrvAddress {
                    attrs: patch.build_attrs(),
                    target,
                    port,
                    priority: patch.priority.unwrap_or(1),
                };
                upsert_srv(&mut doc.srv, addr, patch)
            }
        };

        if changed {
            self.store.put(&key, &doc).await?;
        }
        Ok(changed)
    }

    /// Replace a typed section with exactly the given values. A supplied
    /// `weighted` overrides the section flag; with no values it flips the
    /// flag alone.
    pub async fn set(
        &self,
        domain: &str,
        label: &str,
        kind: RecordKind,
        values: &[String],
        patch: &AddressPatch,
        weighted: Option<bool>,
    ) -> Result<(), AdminError> {
        let domain = domain.to_ascii_lowercase();
        let label = label.to_ascii_lowercase();
        validate_domain(&domain, false)?;
        validate_label(&label)?;

        if kind == RecordKind::Srv && weighted.is_some() {
            return Err(AdminError::invalid(
                "SRV records do not accept a multi flag; clients select by priority and weight",
            ));
        }
        if values.is_empty() && weighted.is_none() {
            return Err(AdminError::invalid(
                "nothing to set: provide values or a multi flag",
            ));
        }

        let (key, doc) = self.read_for_update(&domain, &label).await?;
        let mut doc = doc.unwrap_or_else(|| Document::new(&domain));

        match kind {
            RecordKind::A => {
                let addrs = values
                    .iter()
                    .map(|v| {
                        Ok(IpAddress {
                            attrs: patch.build_attrs(),
                            ip: parse_ipv4(v)?,
                        })
                    })
                    .collect::<Result<Vec<_>, AdminError>>()?;
                replace_section(&mut doc.a, addrs, weighted);
            }
            RecordKind::Aaaa => {
                let addrs = values
                    .iter()
                    .map(|v| {
                        Ok(IpAddress {
                            attrs: patch.build_attrs(),
                            ip: parse_ipv6(v)?,
                        })
                    })
                    .collect::<Result<Vec<_>, AdminError>>()?;
                replace_section(&mut doc.aaaa, addrs, weighted);
            }
            RecordKind::Cname => {
                let addrs = name_addresses(values, patch, true)?;
                replace_section(&mut doc.cname, addrs, weighted);
            }
            RecordKind::Ns => {
                let addrs = name_addresses(values, patch, true)?;
                replace_section(&mut doc.ns, addrs, weighted);
            }
            RecordKind::Txt => {
                let addrs = name_addresses(values, patch, false)?;
                replace_section(&mut doc.txt, addrs, weighted);
            }
            RecordKind::Mx => {
                let addrs = values
                    .iter()
                    .map(|v| {
                        validate_target_name(v)?;
                        Ok(MxAddress {
                            attrs: patch.build_attrs(),
                            server: v.to_string(),
                            priority: patch.priority.unwrap_or(1),
                        })
                    })
                    .collect::<Result<Vec<_>, AdminError>>()?;
                replace_section(&mut doc.mx, addrs, weighted);
            }
            RecordKind::Srv => {
                let addrs = values
                    .iter()
                    .map(|v| {
                        let (target, port) = parse_srv_value(v)?;
                        Ok(SrvAddress {
                            attrs: patch.build_attrs(),
                            target,
                            port,
                            priority: patch.priority.unwrap_or(1),
                        })
                    })
                    .collect::<Result<Vec<_>, AdminError>>()?;
                let set = doc.srv.get_or_insert_with(SrvSet::default);
                if !addrs.is_empty() {
                    set.replace(addrs);
                }
            }
        }

        self.store.put(&key, &doc).await?;
        Ok(())
    }

    /// Delete every document belonging to a zone, including the bare zone
    /// key. Documents under matching keys that claim another domain are
    /// left alone. Returns the deleted keys.
    pub async fn remove_zone(&self, domain: &str) -> Result<Vec<String>, AdminError> {
        let domain = domain.to_ascii_lowercase();
        validate_domain(&domain, false)?;

        let mut deleted = Vec::new();

        if let Some(doc) = self.store.get(&domain).await? {
            if doc.domain == domain && self.store.delete(&domain).await? {
                deleted.push(domain.clone());
            }
        }

        let keys = self.store.keys(&zone_members_pattern(&domain)).await?;
        let docs = self.store.get_many(&keys).await?;
        for (key, doc) in keys.iter().zip(docs) {
            let Some(doc) = doc else { continue };
            if doc.domain != domain {
                continue;
            }
            if self.store.delete(key).await? {
                deleted.push(display_key(key));
            }
        }

        Ok(deleted)
    }

    /// Delete the one document for (domain, label). Returns the deleted key
    /// if anything was there.
    pub async fn remove_record(
        &self,
        domain: &str,
        label: &str,
    ) -> Result<Option<String>, AdminError> {
        let domain = domain.to_ascii_lowercase();
        let label = label.to_ascii_lowercase();
        validate_domain(&domain, false)?;
        validate_label(&label)?;

        let (key, doc) = self.read_for_update(&domain, &label).await?;
        if doc.is_none() {
            return Ok(None);
        }
        if self.store.delete(&key).await? {
            Ok(Some(display_key(&key)))
        } else {
            Ok(None)
        }
    }

    /// Remove the addresses matching the selector within one document,
    /// collapsing sections per the removal rules, and deleting the document
    /// once no section remains. Returns descriptors of everything removed.
    pub async fn remove_addresses(
        &self,
        domain: &str,
        label: &str,
        selector: &AddressSelector,
    ) -> Result<Vec<String>, AdminError> {
        let domain = domain.to_ascii_lowercase();
        let label = label.to_ascii_lowercase();
        validate_domain(&domain, false)?;
        validate_label(&label)?;

        let (key, doc) = self.read_for_update(&domain, &label).await?;
        let Some(mut doc) = doc else {
            return Ok(Vec::new());
        };
        let display_label = display_key(&key);

        let mut removed = Vec::new();
        if selector.kinds.contains(RecordKind::A) {
            for addr in remove_matching(&mut doc.a, |a| {
                selector.matches_parts(RecordKind::A, a.attrs(), &a.natural_key(), None)
            }) {
                removed.push(format!("{display_label}::A::{}", addr.natural_key()));
            }
        }
        if selector.kinds.contains(RecordKind::Aaaa) {
            for addr in remove_matching(&mut doc.aaaa, |a| {
                selector.matches_parts(RecordKind::Aaaa, a.attrs(), &a.natural_key(), None)
            }) {
                removed.push(format!("{display_label}::AAAA::{}", addr.natural_key()));
            }
        }
        if selector.kinds.contains(RecordKind::Cname) {
            for addr in remove_matching(&mut doc.cname, |a| {
                selector.matches_parts(RecordKind::Cname, a.attrs(), &a.natural_key(), None)
            }) {
                removed.push(format!("{display_label}::CNAME::{}", addr.natural_key()));
            }
        }
        if selector.kinds.contains(RecordKind::Ns) {
            for addr in remove_matching(&mut doc.ns, |a| {
                selector.matches_parts(RecordKind::Ns, a.attrs(), &a.natural_key(), None)
            }) {
                removed.push(format!("{display_label}::NS::{}", addr.natural_key()));
            }
        }
        if selector.kinds.contains(RecordKind::Txt) {
            for addr in remove_matching(&mut doc.txt, |a| {
                selector.matches_parts(RecordKind::Txt, a.attrs(), &a.natural_key(), None)
            }) {
                removed.push(format!("{display_label}::TXT::{}", addr.natural_key()));
            }
        }
        if selector.kinds.contains(RecordKind::Mx) {
            for addr in remove_matching(&mut doc.mx, |a| {
                selector.matches_parts(RecordKind::Mx, a.attrs(), &a.natural_key(), a.priority())
            }) {
                removed.push(format!("{display_label}::MX::{}", addr.natural_key()));
            }
        }
        if selector.kinds.contains(RecordKind::Srv) {
            for addr in remove_matching_srv(&mut doc.srv, |a| {
                selector.matches_parts(RecordKind::Srv, a.attrs(), &a.natural_key(), a.priority())
            }) {
                removed.push(format!("{display_label}::SRV::{}", addr.natural_key()));
            }
        }

        if removed.is_empty() {
            return Ok(removed);
        }

        if doc.is_empty() {
            if self.store.delete(&key).await? {
                tracing::info!("removed emptied record '{display_label}'");
                removed.push(display_label);
            }
        } else {
            self.store.put(&key, &doc).await?;
        }
        Ok(removed)
    }

    /// Enumerate addresses across documents by glob patterns over domain
    /// and label, further narrowed by the per-address selector.
    pub async fn list(&self, filter: &ListFilter) -> Result<Vec<ListEntry>, AdminError> {
        let domains: Vec<String> = if filter.domains.is_empty() {
            vec!["*".to_string()]
        } else {
            filter
                .domains
                .iter()
                .map(|d| d.to_ascii_lowercase())
                .collect()
        };
        let names: Vec<String> = if filter.names.is_empty() {
            vec!["*".to_string()]
        } else {
            filter.names.iter().map(|n| n.to_ascii_lowercase()).collect()
        };
        for domain in &domains {
            if !is_glob(domain) {
                validate_domain(domain, false)?;
            }
        }

        let simple =
            domains.len() == 1 && names.len() == 1 && !is_glob(&domains[0]) && !is_glob(&names[0]);

        let (keys, domain_matcher) = if simple {
            (vec![record_key(&domains[0], &names[0])], None)
        } else {
            let mut key_globs = Vec::new();
            for domain in &domains {
                for name in &names {
                    if name.is_empty() || name == "@" {
                        key_globs.push(domain.clone());
                    } else {
                        key_globs.push(format!("{name}.{domain}"));
                    }
                }
            }
            let key_matcher = compile_globs(&key_globs)
                .map_err(|err| AdminError::invalid(format!("bad name pattern: {err}")))?;
            let domain_matcher = compile_globs(&domains)
                .map_err(|err| AdminError::invalid(format!("bad domain pattern: {err}")))?;

            let keys = self
                .store
                .keys("*")
                .await?
                .into_iter()
                .filter(|key| key_matcher.is_match(key))
                .collect();
            (keys, Some(domain_matcher))
        };

        let docs = self.store.get_many(&keys).await?;
        let mut entries = Vec::new();
        for (key, doc) in keys.iter().zip(docs) {
            let Some(doc) = doc else {
                tracing::warn!("no readable document at key '{key}'");
                continue;
            };

            let domain_ok = match &domain_matcher {
                Some(matcher) => matcher.is_match(&doc.domain),
                None => doc.domain == domains[0],
            };
            if !domain_ok {
                tracing::warn!(
                    "record '{key}' matches the name filters but belongs to domain '{}'",
                    doc.domain
                );
                continue;
            }

            for address in doc.addresses() {
                if filter.selector.matches(&address) {
                    entries.push(ListEntry {
                        key: display_key(key),
                        domain: doc.domain.clone(),
                        address,
                    });
                }
            }
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

fn parse_ipv4(value: &str) -> Result<IpAddr, AdminError> {
    value
        .parse::<std::net::Ipv4Addr>()
        .map(IpAddr::V4)
        .map_err(|_| AdminError::invalid(format!("'{value}' is not a valid IPv4 address")))
}

fn parse_ipv6(value: &str) -> Result<IpAddr, AdminError> {
    value
        .parse::<std::net::Ipv6Addr>()
        .map(IpAddr::V6)
        .map_err(|_| AdminError::invalid(format!("'{value}' is not a valid IPv6 address")))
}

fn name_address(value: &str, patch: &AddressPatch) -> NameAddress {
    NameAddress {
        attrs: patch.build_attrs(),
        value: value.to_string(),
    }
}

fn name_addresses(
    values: &[String],
    patch: &AddressPatch,
    targets: bool,
) -> Result<Vec<NameAddress>, AdminError> {
    values
        .iter()
        .map(|v| {
            if targets {
                validate_target_name(v)?;
            } else if v.is_empty() {
                return Err(AdminError::invalid("missing value"));
            }
            Ok(name_address(v, patch))
        })
        .collect()
}

fn upsert<A: Address>(slot: &mut Option<RecordSet<A>>, addr: A, patch: &AddressPatch) -> bool {
    let set = slot.get_or_insert_with(|| RecordSet::new(false));
    match set.find_mut(&addr.natural_key()) {
        Some(existing) => patch.apply_attrs(existing.attrs_mut()),
        None => {
            set.push(addr);
            true
        }
    }
}

fn upsert_mx(slot: &mut Option<RecordSet<MxAddress>>, addr: MxAddress, patch: &AddressPatch) -> bool {
    let set = slot.get_or_insert_with(|| RecordSet::new(false));
    match set.find_mut(&addr.natural_key()) {
        Some(existing) => {
            let mut changed = patch.apply_attrs(&mut existing.attrs);
            if let Some(priority) = patch.priority {
                changed |= existing.priority != priority;
                existing.priority = priority;
            }
            changed
        }
        None => {
            set.push(addr);
            true
        }
    }
}

fn upsert_srv(slot: &mut Option<SrvSet>, addr: SrvAddress, patch: &AddressPatch) -> bool {
    let set = slot.get_or_insert_with(SrvSet::default);
    match set.find_mut(&addr.natural_key()) {
        Some(existing) => {
            let mut changed = patch.apply_attrs(&mut existing.attrs);
            if let Some(priority) = patch.priority {
                changed |= existing.priority != priority;
                existing.priority = priority;
            }
            changed
        }
        None => {
            set.push(addr);
            true
        }
    }
}

fn replace_section<A: Address>(
    slot: &mut Option<RecordSet<A>>,
    addrs: Vec<A>,
    weighted: Option<bool>,
) {
    let set = slot.get_or_insert_with(|| RecordSet::new(false));
    if let Some(weighted) = weighted {
        set.weighted = weighted;
    }
    if !addrs.is_empty() {
        set.replace(addrs);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::KindSelector;
    use dns_store::{MemoryStore, StoreError};

    fn engine() -> (Arc<MemoryStore>, Engine) {
        let store = Arc::new(MemoryStore::new());
        let engine = Engine::new(store.clone());
        (store, engine)
    }

    #[tokio::test]
    async fn add_creates_a_document_with_defaults() {
        let (store, engine) = engine();
        let changed = engine
            .add(
                "Example.COM",
                "Web",
                RecordKind::A,
                "10.0.0.1",
                &AddressPatch::default(),
            )
            .await
            .unwrap();
        assert!(changed);

        let doc = store.get("web.example.com").await.unwrap().unwrap();
        assert_eq!(doc.domain, "example.com");
        let a = doc.a.unwrap();
        assert!(!a.weighted);
        assert_eq!(a.addresses[0].attrs.ttl, 30);
        assert_eq!(a.addresses[0].attrs.weight, 1);
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let (store, engine) = engine();
        let patch = AddressPatch {
            ttl: Some(60),
            ..Default::default()
        };
        assert!(engine
            .add("example.com", "web", RecordKind::A, "10.0.0.1", &patch)
            .await
            .unwrap());
        let before = store.get("web.example.com").await.unwrap().unwrap();

        let changed = engine
            .add("example.com", "web", RecordKind::A, "10.0.0.1", &patch)
            .await
            .unwrap();
        assert!(!changed, "identical re-add must be a no-op");
        let after = store.get("web.example.com").await.unwrap().unwrap();
        k9::assert_equal!(before, after);
    }

    #[tokio::test]
    async fn add_updates_matching_address_in_place() {
        let (store, engine) = engine();
        engine
            .add(
                "example.com",
                "web",
                RecordKind::A,
                "10.0.0.1",
                &AddressPatch::default(),
            )
            .await
            .unwrap();
        engine
            .add(
                "example.com",
                "web",
                RecordKind::A,
                "10.0.0.1",
                &AddressPatch {
                    weight: Some(5),
                    healthy: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let doc = store.get("web.example.com").await.unwrap().unwrap();
        let a = doc.a.unwrap();
        assert_eq!(a.addresses.len(), 1, "same IP must not be appended");
        assert_eq!(a.addresses[0].attrs.weight, 5);
        assert!(!a.addresses[0].attrs.healthy);
    }

    #[tokio::test]
    async fn add_validates_values_per_kind() {
        let (_store, engine) = engine();
        let patch = AddressPatch::default();
        for (kind, value) in [
            (RecordKind::A, "::1"),
            (RecordKind::Aaaa, "10.0.0.1"),
            (RecordKind::Cname, "not a name"),
            (RecordKind::Srv, "missing-port.example.com"),
        ] {
            let err = engine
                .add("example.com", "web", kind, value, &patch)
                .await
                .unwrap_err();
            assert!(err.is_usage_error(), "{kind}: {err}");
        }
    }

    #[tokio::test]
    async fn set_replaces_and_flags() {
        let (store, engine) = engine();
        engine
            .add(
                "example.com",
                "web",
                RecordKind::A,
                "10.0.0.9",
                &AddressPatch::default(),
            )
            .await
            .unwrap();

        engine
            .set(
                "example.com",
                "web",
                RecordKind::A,
                &["10.0.0.1".to_string(), "10.0.0.2".to_string()],
                &AddressPatch::default(),
                Some(true),
            )
            .await
            .unwrap();

        let doc = store.get("web.example.com").await.unwrap().unwrap();
        let a = doc.a.unwrap();
        assert!(a.weighted);
        let keys: Vec<String> = a.addresses.iter().map(|x| x.natural_key()).collect();
        assert_eq!(keys, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn set_with_flag_alone_keeps_addresses() {
        let (store, engine) = engine();
        engine
            .add(
                "example.com",
                "web",
                RecordKind::A,
                "10.0.0.1",
                &AddressPatch::default(),
            )
            .await
            .unwrap();
        engine
            .set(
                "example.com",
                "web",
                RecordKind::A,
                &[],
                &AddressPatch::default(),
                Some(true),
            )
            .await
            .unwrap();

        let doc = store.get("web.example.com").await.unwrap().unwrap();
        let a = doc.a.unwrap();
        assert!(a.weighted);
        assert_eq!(a.addresses.len(), 1);
    }

    #[tokio::test]
    async fn set_srv_rejects_multi() {
        let (_store, engine) = engine();
        let err = engine
            .set(
                "example.com",
                "sip",
                RecordKind::Srv,
                &["sip.example.com:5060".to_string()],
                &AddressPatch::default(),
                Some(false),
            )
            .await
            .unwrap_err();
        assert!(err.is_usage_error());
    }

    #[tokio::test]
    async fn remove_last_address_deletes_the_document() {
        let (store, engine) = engine();
        engine
            .add(
                "example.com",
                "web",
                RecordKind::A,
                "10.0.0.1",
                &AddressPatch::default(),
            )
            .await
            .unwrap();

        let selector = AddressSelector {
            kinds: KindSelector::Kinds(vec![RecordKind::A]),
            ..Default::default()
        };
        let removed = engine
            .remove_addresses("example.com", "web", &selector)
            .await
            .unwrap();
        assert!(removed.contains(&"web.example.com::A::10.0.0.1".to_string()));

        // the key is gone, not an empty document
        assert!(store.get("web.example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_from_weighted_section_keeps_empty_section() {
        let (store, engine) = engine();
        engine
            .set(
                "example.com",
                "web",
                RecordKind::A,
                &["10.0.0.1".to_string()],
                &AddressPatch::default(),
                Some(true),
            )
            .await
            .unwrap();

        let selector = AddressSelector {
            kinds: KindSelector::Kinds(vec![RecordKind::A]),
            ..Default::default()
        };
        engine
            .remove_addresses("example.com", "web", &selector)
            .await
            .unwrap();

        let doc = store.get("web.example.com").await.unwrap().unwrap();
        let a = doc.a.expect("weighted section survives");
        assert!(a.weighted);
        assert!(a.addresses.is_empty());
    }

    #[tokio::test]
    async fn remove_with_value_selector_prunes_one_address() {
        let (store, engine) = engine();
        engine
            .set(
                "example.com",
                "web",
                RecordKind::A,
                &["10.0.0.1".to_string(), "10.0.0.2".to_string()],
                &AddressPatch::default(),
                None,
            )
            .await
            .unwrap();

        let selector = AddressSelector {
            kinds: KindSelector::Kinds(vec![RecordKind::A]),
            values: vec!["10.0.0.1".to_string()],
            ..Default::default()
        };
        let removed = engine
            .remove_addresses("example.com", "web", &selector)
            .await
            .unwrap();
        assert_eq!(removed, vec!["web.example.com::A::10.0.0.1".to_string()]);

        let doc = store.get("web.example.com").await.unwrap().unwrap();
        assert_eq!(doc.a.unwrap().addresses[0].natural_key(), "10.0.0.2");
    }

    #[tokio::test]
    async fn remove_record_and_zone() {
        let (store, engine) = engine();
        let patch = AddressPatch::default();
        engine
            .add("example.com", "@", RecordKind::Ns, "ns1.example.com", &patch)
            .await
            .unwrap();
        engine
            .add("example.com", "web", RecordKind::A, "10.0.0.1", &patch)
            .await
            .unwrap();
        engine
            .add("example.com", "*", RecordKind::A, "10.0.0.2", &patch)
            .await
            .unwrap();
        engine
            .add("other.org", "web", RecordKind::A, "10.1.0.1", &patch)
            .await
            .unwrap();

        let removed = engine
            .remove_record("example.com", "web")
            .await
            .unwrap();
        assert_eq!(removed, Some("web.example.com".to_string()));

        let mut deleted = engine.remove_zone("example.com").await.unwrap();
        deleted.sort();
        assert_eq!(deleted, vec!["*.example.com", "example.com"]);

        // foreign zone untouched
        assert!(store.get("web.other.org").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn zone_removal_spares_records_claiming_another_domain() {
        let (store, engine) = engine();
        engine
            .add(
                "example.com",
                "web",
                RecordKind::A,
                "10.0.0.1",
                &AddressPatch::default(),
            )
            .await
            .unwrap();
        // a key that looks like it belongs to example.com but does not
        let foreign = Document::new("sub.example.com");
        store.put("x.sub.example.com", &foreign).await.unwrap();

        engine.remove_zone("example.com").await.unwrap();
        assert!(store.get("x.sub.example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn add_refuses_foreign_and_malformed_documents() {
        let (store, engine) = engine();
        let foreign = Document::new("other.org");
        store.put("web.example.com", &foreign).await.unwrap();

        let err = engine
            .add(
                "example.com",
                "web",
                RecordKind::A,
                "10.0.0.1",
                &AddressPatch::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::DomainMismatch { .. }));

        store.set_raw("bad.example.com", b"{oops".to_vec());
        let err = engine
            .add(
                "example.com",
                "bad",
                RecordKind::A,
                "10.0.0.1",
                &AddressPatch::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Store(StoreError::Malformed { .. })));
    }

    #[tokio::test]
    async fn list_filters_by_glob_kind_and_value() {
        let (store, engine) = engine();
        let patch = AddressPatch::default();
        engine
            .add("example.com", "web", RecordKind::A, "10.0.0.1", &patch)
            .await
            .unwrap();
        engine
            .add("example.com", "web", RecordKind::Mx, "mail.example.com", &patch)
            .await
            .unwrap();
        engine
            .add("example.com", "*", RecordKind::A, "10.0.0.9", &patch)
            .await
            .unwrap();
        engine
            .add("other.org", "web", RecordKind::A, "10.1.0.1", &patch)
            .await
            .unwrap();
        store.set_serial(7); // lives in the same keyspace; must be skipped

        let everything = engine.list(&ListFilter::default()).await.unwrap();
        assert_eq!(everything.len(), 4);

        let filter = ListFilter {
            domains: vec!["example.com".to_string()],
            ..Default::default()
        };
        let entries = engine.list(&filter).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().any(|e| e.key == "*.example.com"));

        let filter = ListFilter {
            domains: vec!["example.com".to_string()],
            selector: AddressSelector {
                kinds: KindSelector::Kinds(vec![RecordKind::Mx]),
                ..Default::default()
            },
            ..Default::default()
        };
        let entries = engine.list(&filter).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].address.value(), "mail.example.com");

        let filter = ListFilter {
            names: vec!["web".to_string()],
            selector: AddressSelector {
                values: vec!["10.1.0.1".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let entries = engine.list(&filter).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].domain, "other.org");
    }

    #[tokio::test]
    async fn list_exact_pair_checks_the_document_domain() {
        let (store, engine) = engine();
        let foreign = Document::new("other.org");
        store.put("web.example.com", &foreign).await.unwrap();

        let filter = ListFilter {
            domains: vec!["example.com".to_string()],
            names: vec!["web".to_string()],
            ..Default::default()
        };
        let entries = engine.list(&filter).await.unwrap();
        assert!(entries.is_empty());
    }
}

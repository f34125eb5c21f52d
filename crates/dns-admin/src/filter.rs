use crate::AdminError;
use dns_record::{AddressAttrs, AnyAddress, RecordKind};

/// Which kinds an operation applies to. The administrative `*` sentinel is
/// its own variant rather than a pseudo-kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum KindSelector {
    #[default]
    Any,
    Kinds(Vec<RecordKind>),
}

impl KindSelector {
    /// Parse a comma-separated kind list. A `*` anywhere collapses the
    /// whole list to "any".
    pub fn parse(value: &str) -> Result<Self, AdminError> {
        if value.is_empty() {
            return Ok(KindSelector::Any);
        }
        let mut kinds = Vec::new();
        for item in value.split(',') {
            if item == "*" {
                return Ok(KindSelector::Any);
            }
            let kind: RecordKind = item.parse().map_err(AdminError::InvalidArgument)?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(KindSelector::Kinds(kinds))
    }

    pub fn contains(&self, kind: RecordKind) -> bool {
        match self {
            KindSelector::Any => true,
            KindSelector::Kinds(kinds) => kinds.contains(&kind),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, KindSelector::Any)
    }
}

/// Per-address predicates shared by `remove` and `list`: kind membership,
/// natural-key values, and attribute equality filters.
#[derive(Debug, Clone, Default)]
pub struct AddressSelector {
    pub kinds: KindSelector,
    /// Natural-key values to match; empty matches everything.
    pub values: Vec<String>,
    pub ttl: Option<u32>,
    pub enabled: Option<bool>,
    pub healthy: Option<bool>,
    pub weight: Option<u16>,
    pub priority: Option<u16>,
}

impl AddressSelector {
    /// True when no constraint beyond "any kind" is present. `remove` uses
    /// this to tell whole-record deletion apart from address-level
    /// removal.
    pub fn is_unconstrained(&self) -> bool {
        self.kinds.is_any()
            && self.values.is_empty()
            && self.ttl.is_none()
            && self.enabled.is_none()
            && self.healthy.is_none()
            && self.weight.is_none()
            && self.priority.is_none()
    }

    pub fn matches(&self, addr: &AnyAddress) -> bool {
        self.matches_parts(addr.kind(), addr.attrs(), &addr.value(), addr.priority())
    }

    pub fn matches_parts(
        &self,
        kind: RecordKind,
        attrs: &AddressAttrs,
        value: &str,
        priority: Option<u16>,
    ) -> bool {
        if !self.kinds.contains(kind) {
            return false;
        }
        if let Some(ttl) = self.ttl {
            if attrs.ttl != ttl {
                return false;
            }
        }
        if let Some(enabled) = self.enabled {
            if attrs.enabled != enabled {
                return false;
            }
        }
        if let Some(healthy) = self.healthy {
            if attrs.healthy != healthy {
                return false;
            }
        }
        if let Some(weight) = self.weight {
            if attrs.weight != weight {
                return false;
            }
        }
        if let Some(wanted) = self.priority {
            if priority != Some(wanted) {
                return false;
            }
        }
        if !self.values.is_empty() && !self.values.iter().any(|v| v == value) {
            return false;
        }
        true
    }
}

/// Enumeration filter for `list`: glob patterns over domain and label, plus
/// the per-address selector.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Domain globs; empty means any domain.
    pub domains: Vec<String>,
    /// Label globs; empty means any label.
    pub names: Vec<String>,
    pub selector: AddressSelector,
}

#[cfg(test)]
mod test {
    use super::*;
    use dns_record::{IpAddress, MxAddress};

    #[test]
    fn kind_selector_parsing() {
        assert_eq!(KindSelector::parse("").unwrap(), KindSelector::Any);
        assert_eq!(KindSelector::parse("*").unwrap(), KindSelector::Any);
        assert_eq!(KindSelector::parse("a,mx,*").unwrap(), KindSelector::Any);
        assert_eq!(
            KindSelector::parse("a,AAAA").unwrap(),
            KindSelector::Kinds(vec![RecordKind::A, RecordKind::Aaaa])
        );
        assert!(KindSelector::parse("a,bogus").is_err());
    }

    #[test]
    fn selector_matches_attributes() {
        let addr = AnyAddress::A(IpAddress::new("10.0.0.1".parse().unwrap()));

        let mut selector = AddressSelector::default();
        assert!(selector.matches(&addr));

        selector.ttl = Some(30);
        assert!(selector.matches(&addr));
        selector.ttl = Some(60);
        assert!(!selector.matches(&addr));
    }

    #[test]
    fn priority_filter_compares_against_the_filter_value() {
        let addr = AnyAddress::Mx(MxAddress::new("mail.example.com", 10));

        let mut selector = AddressSelector::default();
        selector.priority = Some(10);
        assert!(selector.matches(&addr));

        selector.priority = Some(20);
        assert!(!selector.matches(&addr));

        // kinds without a priority can never match a priority filter
        let plain = AnyAddress::A(IpAddress::new("10.0.0.1".parse().unwrap()));
        assert!(!selector.matches(&plain));
    }

    #[test]
    fn value_filter_uses_natural_keys() {
        let addr = AnyAddress::Mx(MxAddress::new("mail.example.com", 10));
        let mut selector = AddressSelector::default();
        selector.values = vec!["mail.example.com".to_string()];
        assert!(selector.matches(&addr));
        selector.values = vec!["other.example.com".to_string()];
        assert!(!selector.matches(&addr));
    }
}

use crate::kind::RecordKind;
use hickory_proto::rr::rdata::{A, AAAA, CNAME, MX, NS, SRV, TXT};
use hickory_proto::rr::{Name, RData};
use hickory_proto::ProtoError;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

pub const DEFAULT_TTL: u32 = 30;
pub const DEFAULT_WEIGHT: u16 = 1;

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

fn default_flag() -> bool {
    true
}

fn default_weight() -> u16 {
    DEFAULT_WEIGHT
}

/// Interpret a stored name value as a fully qualified, lower cased DNS name.
pub fn fully_qualify(name: &str) -> Result<Name, ProtoError> {
    let mut name = Name::from_str_relaxed(name)?.to_lowercase();
    name.set_fqdn(true);
    Ok(name)
}

/// Attributes common to every address kind.
///
/// Missing fields on the wire take the documented defaults, so a minimal
/// hand-written document is still valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressAttrs {
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default = "default_flag")]
    pub enabled: bool,
    #[serde(default = "default_flag")]
    pub healthy: bool,
    #[serde(default = "default_weight")]
    pub weight: u16,
}

impl Default for AddressAttrs {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            enabled: true,
            healthy: true,
            weight: DEFAULT_WEIGHT,
        }
    }
}

impl AddressAttrs {
    /// An address participates in answers only while both flags hold.
    pub fn is_active(&self) -> bool {
        self.enabled && self.healthy
    }
}

/// Shared view over the concrete address shapes.
pub trait Address: Clone {
    fn attrs(&self) -> &AddressAttrs;
    fn attrs_mut(&mut self) -> &mut AddressAttrs;

    /// The identity of this address within its section. Two addresses with
    /// the same natural key are the same logical entry; writers update
    /// rather than append.
    fn natural_key(&self) -> String;

    fn priority(&self) -> Option<u16> {
        None
    }
}

/// An A or AAAA entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress {
    #[serde(flatten)]
    pub attrs: AddressAttrs,
    pub ip: IpAddr,
}

impl Default for IpAddress {
    fn default() -> Self {
        Self {
            attrs: AddressAttrs::default(),
            ip: IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
        }
    }
}

impl IpAddress {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            attrs: AddressAttrs::default(),
            ip,
        }
    }

    /// Render as A rdata. IPv6 payloads cannot be expressed as an A record
    /// and yield nothing.
    pub fn to_a(&self) -> Option<RData> {
        match self.ip {
            IpAddr::V4(ip) => Some(RData::A(A(ip))),
            IpAddr::V6(_) => None,
        }
    }

    pub fn to_aaaa(&self) -> Option<RData> {
        match self.ip {
            IpAddr::V4(_) => None,
            IpAddr::V6(ip) => Some(RData::AAAA(AAAA(ip))),
        }
    }
}

impl Address for IpAddress {
    fn attrs(&self) -> &AddressAttrs {
        &self.attrs
    }

    fn attrs_mut(&mut self) -> &mut AddressAttrs {
        &mut self.attrs
    }

    fn natural_key(&self) -> String {
        self.ip.to_string()
    }
}

/// A CNAME, NS or TXT entry; the payload is the target name or text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAddress {
    #[serde(flatten)]
    pub attrs: AddressAttrs,
    pub value: String,
}

impl NameAddress {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            attrs: AddressAttrs::default(),
            value: value.into(),
        }
    }

    pub fn to_cname(&self) -> Option<RData> {
        fully_qualify(&self.value).ok().map(|n| RData::CNAME(CNAME(n)))
    }

    pub fn to_ns(&self) -> Option<RData> {
        fully_qualify(&self.value).ok().map(|n| RData::NS(NS(n)))
    }

    pub fn to_txt(&self) -> Option<RData> {
        Some(RData::TXT(TXT::new(vec![self.value.clone()])))
    }
}

impl Address for NameAddress {
    fn attrs(&self) -> &AddressAttrs {
        &self.attrs
    }

    fn attrs_mut(&mut self) -> &mut AddressAttrs {
        &mut self.attrs
    }

    fn natural_key(&self) -> String {
        self.value.clone()
    }
}

/// An MX entry: a mail host plus its preference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxAddress {
    #[serde(flatten)]
    pub attrs: AddressAttrs,
    pub server: String,
    pub priority: u16,
}

impl MxAddress {
    pub fn new(server: impl Into<String>, priority: u16) -> Self {
        Self {
            attrs: AddressAttrs::default(),
            server: server.into(),
            priority,
        }
    }

    pub fn to_mx(&self) -> Option<RData> {
        fully_qualify(&self.server)
            .ok()
            .map(|n| RData::MX(MX::new(self.priority, n)))
    }
}

impl Address for MxAddress {
    fn attrs(&self) -> &AddressAttrs {
        &self.attrs
    }

    fn attrs_mut(&mut self) -> &mut AddressAttrs {
        &mut self.attrs
    }

    fn natural_key(&self) -> String {
        self.server.clone()
    }

    fn priority(&self) -> Option<u16> {
        Some(self.priority)
    }
}

/// An SRV entry. The natural key is (target, port); priority and weight are
/// carried through to the wire record so clients can do their own selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrvAddress {
    #[serde(flatten)]
    pub attrs: AddressAttrs,
    pub target: String,
    pub port: u16,
    pub priority: u16,
}

impl SrvAddress {
    pub fn new(target: impl Into<String>, port: u16, priority: u16) -> Self {
        Self {
            attrs: AddressAttrs::default(),
            target: target.into(),
            port,
            priority,
        }
    }

    pub fn to_srv(&self) -> Option<RData> {
        fully_qualify(&self.target).ok().map(|n| {
            RData::SRV(SRV::new(self.priority, self.attrs.weight, self.port, n))
        })
    }
}

impl Address for SrvAddress {
    fn attrs(&self) -> &AddressAttrs {
        &self.attrs
    }

    fn attrs_mut(&mut self) -> &mut AddressAttrs {
        &mut self.attrs
    }

    fn natural_key(&self) -> String {
        format!("{}:{}", self.target, self.port)
    }

    fn priority(&self) -> Option<u16> {
        Some(self.priority)
    }
}

/// A kind-tagged address, used by the listing surface and by filters that
/// operate across sections.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyAddress {
    A(IpAddress),
    Aaaa(IpAddress),
    Cname(NameAddress),
    Ns(NameAddress),
    Txt(NameAddress),
    Mx(MxAddress),
    Srv(SrvAddress),
}

impl AnyAddress {
    pub fn kind(&self) -> RecordKind {
        match self {
            AnyAddress::A(_) => RecordKind::A,
            AnyAddress::Aaaa(_) => RecordKind::Aaaa,
            AnyAddress::Cname(_) => RecordKind::Cname,
            AnyAddress::Ns(_) => RecordKind::Ns,
            AnyAddress::Txt(_) => RecordKind::Txt,
            AnyAddress::Mx(_) => RecordKind::Mx,
            AnyAddress::Srv(_) => RecordKind::Srv,
        }
    }

    pub fn attrs(&self) -> &AddressAttrs {
        match self {
            AnyAddress::A(a) | AnyAddress::Aaaa(a) => &a.attrs,
            AnyAddress::Cname(a) | AnyAddress::Ns(a) | AnyAddress::Txt(a) => &a.attrs,
            AnyAddress::Mx(a) => &a.attrs,
            AnyAddress::Srv(a) => &a.attrs,
        }
    }

    /// The natural-key form of the payload (`target:port` for SRV).
    pub fn value(&self) -> String {
        match self {
            AnyAddress::A(a) | AnyAddress::Aaaa(a) => a.natural_key(),
            AnyAddress::Cname(a) | AnyAddress::Ns(a) | AnyAddress::Txt(a) => a.natural_key(),
            AnyAddress::Mx(a) => a.natural_key(),
            AnyAddress::Srv(a) => a.natural_key(),
        }
    }

    pub fn priority(&self) -> Option<u16> {
        match self {
            AnyAddress::Mx(a) => a.priority(),
            AnyAddress::Srv(a) => a.priority(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let addr: IpAddress = serde_json::from_str(r#"{"ip":"10.0.0.1"}"#).unwrap();
        assert_eq!(addr.attrs.ttl, 30);
        assert!(addr.attrs.enabled);
        assert!(addr.attrs.healthy);
        assert_eq!(addr.attrs.weight, 1);
    }

    #[test]
    fn a_rendering_rejects_v6_payload() {
        let addr = IpAddress::new("::1".parse().unwrap());
        assert!(addr.to_a().is_none());
        assert!(addr.to_aaaa().is_some());
    }

    #[test]
    fn srv_natural_key_includes_port() {
        let one = SrvAddress::new("svc.example.com", 8080, 1);
        let two = SrvAddress::new("svc.example.com", 8081, 1);
        assert_ne!(one.natural_key(), two.natural_key());
    }

    #[test]
    fn fully_qualify_lowers_and_terminates() {
        let name = fully_qualify("Real.Example.COM").unwrap();
        assert_eq!(name.to_utf8(), "real.example.com.");
    }
}

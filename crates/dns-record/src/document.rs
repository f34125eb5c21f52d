use crate::address::{AnyAddress, IpAddress, MxAddress, NameAddress};
use crate::kind::RecordKind;
use crate::section::{RecordSet, SrvSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed record document: {0}")]
    Codec(#[from] serde_json::Error),
}

/// The unit stored against one key: every typed section for a single
/// (domain, label) pair.
///
/// Absent sections are omitted from the encoded form, and the encoding is
/// canonical: decoding and re-encoding any document produced by the
/// mutation engine yields the identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The canonical zone domain this document belongs to. Must agree with
    /// the domain encoded in the storage key.
    pub domain: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<RecordSet<IpAddress>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aaaa: Option<RecordSet<IpAddress>>,
    #[serde(default, rename = "cnames", skip_serializing_if = "Option::is_none")]
    pub cname: Option<RecordSet<NameAddress>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<RecordSet<NameAddress>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txt: Option<RecordSet<NameAddress>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mx: Option<RecordSet<MxAddress>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srv: Option<SrvSet>,
}

impl Document {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            a: None,
            aaaa: None,
            cname: None,
            ns: None,
            txt: None,
            mx: None,
            srv: None,
        }
    }

    /// True when no section is present at all. A weighted section that was
    /// emptied by removal still counts as present: its answer policy
    /// survives, and so does the document.
    pub fn is_empty(&self) -> bool {
        self.a.is_none()
            && self.aaaa.is_none()
            && self.cname.is_none()
            && self.ns.is_none()
            && self.txt.is_none()
            && self.mx.is_none()
            && self.srv.is_none()
    }

    /// Flat kind-tagged view of every address, section by section in
    /// [`RecordKind::ALL`] order, stored order within each section.
    pub fn addresses(&self) -> Vec<AnyAddress> {
        let mut out = Vec::new();
        if let Some(set) = &self.a {
            out.extend(set.addresses.iter().cloned().map(AnyAddress::A));
        }
        if let Some(set) = &self.aaaa {
            out.extend(set.addresses.iter().cloned().map(AnyAddress::Aaaa));
        }
        if let Some(set) = &self.cname {
            out.extend(set.addresses.iter().cloned().map(AnyAddress::Cname));
        }
        if let Some(set) = &self.ns {
            out.extend(set.addresses.iter().cloned().map(AnyAddress::Ns));
        }
        if let Some(set) = &self.txt {
            out.extend(set.addresses.iter().cloned().map(AnyAddress::Txt));
        }
        if let Some(set) = &self.mx {
            out.extend(set.addresses.iter().cloned().map(AnyAddress::Mx));
        }
        if let Some(set) = &self.srv {
            out.extend(set.addresses.iter().cloned().map(AnyAddress::Srv));
        }
        out
    }

    /// True when the named section is absent or holds no addresses.
    pub fn section_is_empty(&self, kind: RecordKind) -> bool {
        match kind {
            RecordKind::A => self.a.as_ref().map_or(true, |s| s.is_empty()),
            RecordKind::Aaaa => self.aaaa.as_ref().map_or(true, |s| s.is_empty()),
            RecordKind::Cname => self.cname.as_ref().map_or(true, |s| s.is_empty()),
            RecordKind::Ns => self.ns.as_ref().map_or(true, |s| s.is_empty()),
            RecordKind::Txt => self.txt.as_ref().map_or(true, |s| s.is_empty()),
            RecordKind::Mx => self.mx.as_ref().map_or(true, |s| s.is_empty()),
            RecordKind::Srv => self.srv.as_ref().map_or(true, |s| s.is_empty()),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DocumentError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn encode(&self) -> Result<Vec<u8>, DocumentError> {
        Ok(serde_json::to_vec(self)?)
    }
}

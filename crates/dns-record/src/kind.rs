use hickory_proto::rr::RecordType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The set of record kinds a document can hold a section for.
///
/// The administrative "any kind" sentinel is deliberately not a variant;
/// selectors model it separately so that a `RecordKind` always names a
/// concrete section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    A,
    Aaaa,
    Cname,
    Ns,
    Txt,
    Mx,
    Srv,
}

impl RecordKind {
    /// Every kind, in the order sections are enumerated by flat views.
    pub const ALL: [RecordKind; 7] = [
        RecordKind::A,
        RecordKind::Aaaa,
        RecordKind::Cname,
        RecordKind::Ns,
        RecordKind::Txt,
        RecordKind::Mx,
        RecordKind::Srv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::Aaaa => "AAAA",
            RecordKind::Cname => "CNAME",
            RecordKind::Ns => "NS",
            RecordKind::Txt => "TXT",
            RecordKind::Mx => "MX",
            RecordKind::Srv => "SRV",
        }
    }

    pub fn record_type(&self) -> RecordType {
        match self {
            RecordKind::A => RecordType::A,
            RecordKind::Aaaa => RecordType::AAAA,
            RecordKind::Cname => RecordType::CNAME,
            RecordKind::Ns => RecordType::NS,
            RecordKind::Txt => RecordType::TXT,
            RecordKind::Mx => RecordType::MX,
            RecordKind::Srv => RecordType::SRV,
        }
    }

    /// Whether addresses of this kind carry a priority field.
    pub fn has_priority(&self) -> bool {
        matches!(self, RecordKind::Mx | RecordKind::Srv)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordKind::A),
            "AAAA" => Ok(RecordKind::Aaaa),
            "CNAME" => Ok(RecordKind::Cname),
            "NS" => Ok(RecordKind::Ns),
            "TXT" => Ok(RecordKind::Txt),
            "MX" => Ok(RecordKind::Mx),
            "SRV" => Ok(RecordKind::Srv),
            _ => Err(format!(
                "'{s}' is not a valid record kind. Accepted values are: [A,AAAA,CNAME,NS,TXT,MX,SRV]"
            )),
        }
    }
}

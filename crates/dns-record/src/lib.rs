//! The record document model shared by the resolver and every writer.
//!
//! One document is stored per (domain, label) pair and holds up to seven
//! typed sections of addresses. All mutation primitives that affect how a
//! document is interpreted at query time (natural-key upsert, section
//! replacement, removal collapse) live here so that readers and writers
//! cannot disagree about the rules.

mod address;
mod document;
mod kind;
mod section;
pub mod selector;

pub use address::{
    fully_qualify, Address, AddressAttrs, AnyAddress, IpAddress, MxAddress, NameAddress,
    SrvAddress, DEFAULT_TTL, DEFAULT_WEIGHT,
};
pub use document::{Document, DocumentError};
pub use kind::RecordKind;
pub use section::{remove_matching, remove_matching_srv, RecordSet, SrvSet};

use crate::address::{Address, SrvAddress};
use serde::{Deserialize, Serialize};

/// A typed section of a document.
///
/// `weighted` selects the answer policy: pick one address per query by
/// weighted random choice, versus returning every active address. Insertion
/// order of `addresses` is preserved so that non-weighted answers are
/// deterministic across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSet<A> {
    #[serde(default)]
    pub weighted: bool,
    #[serde(default)]
    pub addresses: Vec<A>,
}

impl<A> Default for RecordSet<A> {
    fn default() -> Self {
        Self {
            weighted: false,
            addresses: Vec::new(),
        }
    }
}

impl<A: Address> RecordSet<A> {
    pub fn new(weighted: bool) -> Self {
        Self {
            weighted,
            addresses: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// The subset of addresses that are both enabled and healthy, in stored
    /// order, keeping the section's answer policy.
    pub fn active(&self) -> RecordSet<A> {
        RecordSet {
            weighted: self.weighted,
            addresses: self
                .addresses
                .iter()
                .filter(|a| a.attrs().is_active())
                .cloned()
                .collect(),
        }
    }

    pub fn find_mut(&mut self, natural_key: &str) -> Option<&mut A> {
        self.addresses
            .iter_mut()
            .find(|a| a.natural_key() == natural_key)
    }

    pub fn push(&mut self, addr: A) {
        self.addresses.push(addr);
    }

    /// Replace the address list with exactly the given entries, merging
    /// duplicates by natural key (last one wins).
    pub fn replace(&mut self, addrs: Vec<A>) {
        self.addresses.clear();
        for addr in addrs {
            match self.find_mut(&addr.natural_key()) {
                Some(existing) => *existing = addr,
                None => self.addresses.push(addr),
            }
        }
    }
}

/// The SRV section has no answer policy flag: SRV clients perform their own
/// selection from the priority and weight carried on each record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SrvSet {
    #[serde(default)]
    pub addresses: Vec<SrvAddress>,
}

impl SrvSet {
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn active(&self) -> SrvSet {
        SrvSet {
            addresses: self
                .addresses
                .iter()
                .filter(|a| a.attrs.is_active())
                .cloned()
                .collect(),
        }
    }

    pub fn find_mut(&mut self, natural_key: &str) -> Option<&mut SrvAddress> {
        self.addresses
            .iter_mut()
            .find(|a| a.natural_key() == natural_key)
    }

    pub fn push(&mut self, addr: SrvAddress) {
        self.addresses.push(addr);
    }

    pub fn replace(&mut self, addrs: Vec<SrvAddress>) {
        self.addresses.clear();
        for addr in addrs {
            match self.find_mut(&addr.natural_key()) {
                Some(existing) => *existing = addr,
                None => self.addresses.push(addr),
            }
        }
    }
}

/// Remove every address matching `pred` from the section held in `slot`,
/// applying the collapse rules:
///
/// - removing the last remaining address of a weighted section keeps the
///   section with an empty address list (the policy survives);
/// - removing the last remaining address of a non-weighted section drops
///   the section entirely;
/// - otherwise the matched address is removed in place, preserving order.
///
/// Returns the removed addresses.
pub fn remove_matching<A: Address>(
    slot: &mut Option<RecordSet<A>>,
    pred: impl Fn(&A) -> bool,
) -> Vec<A> {
    let mut removed = Vec::new();
    let mut drop_section = false;

    if let Some(set) = slot.as_mut() {
        let mut i = 0;
        while i < set.addresses.len() {
            if !pred(&set.addresses[i]) {
                i += 1;
                continue;
            }
            if set.addresses.len() == 1 {
                removed.push(set.addresses.remove(0));
                drop_section = !set.weighted;
                break;
            }
            removed.push(set.addresses.remove(i));
        }
    }

    if drop_section {
        *slot = None;
    }
    removed
}

/// SRV variant of [`remove_matching`]: with no policy flag to preserve, the
/// section is dropped once its last address is removed.
pub fn remove_matching_srv(
    slot: &mut Option<SrvSet>,
    pred: impl Fn(&SrvAddress) -> bool,
) -> Vec<SrvAddress> {
    let mut removed = Vec::new();
    let mut drop_section = false;

    if let Some(set) = slot.as_mut() {
        let mut i = 0;
        while i < set.addresses.len() {
            if !pred(&set.addresses[i]) {
                i += 1;
                continue;
            }
            removed.push(set.addresses.remove(i));
        }
        drop_section = set.addresses.is_empty() && !removed.is_empty();
    }

    if drop_section {
        *slot = None;
    }
    removed
}

//! Weighted random selection over the active addresses of a section.
//!
//! Callers filter to active addresses first; the draw happens once per
//! query, from an RNG the caller owns, so the server can seed once per
//! process and tests can inject a deterministic source.

use crate::address::Address;
use rand::Rng;

/// Pick exactly one address: draw `n` uniformly from `[0, Σweight)` and walk
/// the list subtracting each weight until `n` falls within an entry.
///
/// A single-entry list short-circuits without consuming randomness. When
/// every weight is zero there is nothing meaningful to draw; the first
/// address is returned deterministically rather than failing the query.
pub fn pick_weighted<'a, A: Address>(addresses: &'a [A], rng: &mut impl Rng) -> Option<&'a A> {
    if addresses.len() <= 1 {
        return addresses.first();
    }

    let total: u32 = addresses.iter().map(|a| u32::from(a.attrs().weight)).sum();
    if total == 0 {
        return addresses.first();
    }

    let mut n = rng.gen_range(0..total);
    for addr in addresses {
        let weight = u32::from(addr.attrs().weight);
        if n < weight {
            return Some(addr);
        }
        n -= weight;
    }

    // n < total guarantees the walk terminates inside the list
    addresses.last()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::address::IpAddress;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn weighted_ip(s: &str, weight: u16) -> IpAddress {
        let mut addr = IpAddress::new(s.parse().unwrap());
        addr.attrs.weight = weight;
        addr
    }

    #[test]
    fn empty_list_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_weighted::<IpAddress>(&[], &mut rng).is_none());
    }

    #[test]
    fn zero_total_weight_falls_back_to_first() {
        let mut rng = StdRng::seed_from_u64(1);
        let addrs = vec![weighted_ip("10.0.0.1", 0), weighted_ip("10.0.0.2", 0)];
        for _ in 0..10 {
            let picked = pick_weighted(&addrs, &mut rng).unwrap();
            assert_eq!(picked.natural_key(), "10.0.0.1");
        }
    }

    #[test]
    fn zero_weight_entry_is_never_picked() {
        let mut rng = StdRng::seed_from_u64(7);
        let addrs = vec![weighted_ip("10.0.0.1", 5), weighted_ip("10.0.0.2", 0)];
        for _ in 0..1_000 {
            let picked = pick_weighted(&addrs, &mut rng).unwrap();
            assert_eq!(picked.natural_key(), "10.0.0.1");
        }
    }

    #[test]
    fn distribution_tracks_weights() {
        let mut rng = StdRng::seed_from_u64(42);
        let addrs = vec![
            weighted_ip("10.0.0.1", 1),
            weighted_ip("10.0.0.2", 2),
            weighted_ip("10.0.0.3", 3),
        ];

        let trials = 60_000usize;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..trials {
            let picked = pick_weighted(&addrs, &mut rng).unwrap();
            *counts.entry(picked.natural_key()).or_default() += 1;
        }

        let total_weight = 6.0;
        for addr in &addrs {
            let expected = trials as f64 * f64::from(addr.attrs.weight) / total_weight;
            let got = counts[&addr.natural_key()] as f64;
            let tolerance = trials as f64 * 0.02;
            assert!(
                (got - expected).abs() < tolerance,
                "{}: got {got}, expected {expected} +/- {tolerance}",
                addr.natural_key()
            );
        }
    }
}

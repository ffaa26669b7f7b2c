//! IPv4 whitelist matching.
//!
//! Whitelist entries come in three shapes:
//!
//! | Shape | Example                        | Match rule                     |
//! |-------|--------------------------------|--------------------------------|
//! | exact | `192.168.1.10`                 | string equality after trimming |
//! | CIDR  | `10.0.0.0/8`                   | network mask and compare       |
//! | range | `192.168.1.1 - 192.168.1.200`  | inclusive numeric containment  |
//!
//! CIDR prefixes are limited to `/8`, `/16`, `/24` and `/32`. Anything that
//! does not parse is simply a non-match; nothing here returns an error.

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;

/// CIDR prefix lengths accepted in whitelist entries.
pub const ALLOWED_CIDR_PREFIXES: [u8; 4] = [8, 16, 24, 32];

/// Parse a dotted-quad IPv4 address into its four octets.
///
/// Each octet is one to three ASCII digits in `0..=255`. Multi-digit octets
/// with a leading zero (`"01"`) are rejected, as is any surrounding text.
pub fn parse_ipv4(s: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = s.split('.');
    for slot in &mut octets {
        *slot = parse_octet(parts.next()?)?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}

fn parse_octet(part: &str) -> Option<u8> {
    if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse::<u8>().ok()
}

/// Returns `true` iff `s` is exactly four decimal octets separated by dots.
pub fn is_ipv4(s: &str) -> bool {
    parse_ipv4(s).is_some()
}

/// Pack an IPv4 address into a number: `(o0<<24)+(o1<<16)+(o2<<8)+o3`.
///
/// Every ordering comparison in this module goes through this function, so
/// the unsigned packing is used consistently on both sides.
pub fn ip_to_number(ip: &str) -> Option<u32> {
    parse_ipv4(ip).map(u32::from_be_bytes)
}

/// Parse `<ipv4>/<prefix>` where the prefix is one of `8`, `16`, `24`, `32`.
///
/// Host bits in the address are allowed; membership masks them off.
pub fn parse_cidr(s: &str) -> Option<Ipv4Network> {
    let (addr, prefix) = s.split_once('/')?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let prefix: u8 = prefix.parse().ok()?;
    if !ALLOWED_CIDR_PREFIXES.contains(&prefix) {
        return None;
    }
    let addr = Ipv4Addr::from(parse_ipv4(addr)?);
    Ipv4Network::new(addr, prefix).ok()
}

/// Returns `true` iff `s` is a CIDR block with an allowed prefix.
pub fn is_cidr(s: &str) -> bool {
    parse_cidr(s).is_some()
}

/// Parse `<ipv4> - <ipv4>` into numeric bounds.
///
/// Whitespace around the hyphen is optional. Returns `None` unless both ends
/// are valid addresses and the start is strictly below the end.
pub fn is_range(s: &str) -> Option<(u32, u32)> {
    let (start, end) = s.split_once('-')?;
    let start = ip_to_number(start.trim())?;
    let end = ip_to_number(end.trim())?;
    (start < end).then_some((start, end))
}

/// A classified whitelist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitelistEntry {
    /// A single address.
    Exact(u32),
    /// A CIDR block.
    Cidr(Ipv4Network),
    /// Inclusive `start..=end` range.
    Range { start: u32, end: u32 },
}

impl WhitelistEntry {
    /// Classify a raw entry. Unrecognized shapes yield `None`.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if let Some(n) = ip_to_number(entry) {
            return Some(Self::Exact(n));
        }
        if let Some(cidr) = parse_cidr(entry) {
            return Some(Self::Cidr(cidr));
        }
        is_range(entry).map(|(start, end)| Self::Range { start, end })
    }

    /// Whether the packed address `ip` is covered by this entry.
    pub fn contains(&self, ip: u32) -> bool {
        match *self {
            Self::Exact(n) => n == ip,
            Self::Cidr(network) => network.contains(Ipv4Addr::from(ip)),
            Self::Range { start, end } => start <= ip && ip <= end,
        }
    }
}

/// Test a single whitelist entry against a candidate address.
///
/// Plain addresses compare as trimmed strings; CIDR blocks and ranges compare
/// numerically and require the candidate to be a valid address.
pub fn entry_matches(entry: &str, ip: &str) -> bool {
    let entry = entry.trim();
    let ip = ip.trim();

    if is_ipv4(entry) {
        return entry == ip;
    }
    let Some(candidate) = ip_to_number(ip) else {
        return false;
    };
    match WhitelistEntry::parse(entry) {
        Some(parsed) => parsed.contains(candidate),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_octet_value() {
        for o in 0..=255u16 {
            let s = format!("{o}.{o}.{o}.{o}");
            assert!(is_ipv4(&s), "{s} should be valid");
        }
    }

    #[test]
    fn rejects_out_of_range_octets() {
        assert!(!is_ipv4("256.0.0.1"));
        assert!(!is_ipv4("1.2.3.999"));
        assert!(!is_ipv4("1.2.3.-1"));
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(!is_ipv4("1.2.3"));
        assert!(!is_ipv4("1.2.3.4.5"));
        assert!(!is_ipv4(""));
        assert!(!is_ipv4("1..2.3"));
    }

    #[test]
    fn rejects_garbage_and_leading_zeros() {
        assert!(!is_ipv4(" 1.2.3.4"));
        assert!(!is_ipv4("1.2.3.4 "));
        assert!(!is_ipv4("1.2.3.4x"));
        assert!(!is_ipv4("+1.2.3.4"));
        assert!(!is_ipv4("01.2.3.4"));
        assert!(is_ipv4("0.0.0.0"));
    }

    #[test]
    fn cidr_only_allows_byte_aligned_prefixes() {
        for prefix in 0..=40u8 {
            let s = format!("10.0.0.0/{prefix}");
            let expected = ALLOWED_CIDR_PREFIXES.contains(&prefix);
            assert_eq!(is_cidr(&s), expected, "prefix {prefix}");
        }
    }

    #[test]
    fn cidr_rejects_malformed() {
        assert!(!is_cidr("10.0.0.0/"));
        assert!(!is_cidr("10.0.0/8"));
        assert!(!is_cidr("10.0.0.0/+8"));
        assert!(!is_cidr("10.0.0.0/8/8"));
    }

    #[test]
    fn range_requires_strictly_ascending_bounds() {
        assert_eq!(
            is_range("192.168.1.1-192.168.1.200"),
            Some((
                ip_to_number("192.168.1.1").unwrap(),
                ip_to_number("192.168.1.200").unwrap()
            ))
        );
        assert!(is_range("192.168.1.1 - 192.168.1.2").is_some());
        assert!(is_range("192.168.1.5-192.168.1.5").is_none());
        assert!(is_range("192.168.1.9-192.168.1.5").is_none());
        assert!(is_range("192.168.1.1-").is_none());
        assert!(is_range("a-b").is_none());
    }

    #[test]
    fn ip_to_number_known_values() {
        assert_eq!(ip_to_number("0.0.0.0"), Some(0));
        assert_eq!(ip_to_number("1.1.1.1"), Some(16_843_009));
        assert_eq!(ip_to_number("255.255.255.255"), Some(u32::MAX));
        assert_eq!(ip_to_number("nope"), None);
    }

    #[test]
    fn ip_to_number_preserves_ordering() {
        let numbers: Vec<u32> = (1..=254)
            .map(|o| ip_to_number(&format!("192.168.1.{o}")).unwrap())
            .collect();
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn cidr_membership() {
        assert!(entry_matches("192.168.1.0/24", "192.168.1.100"));
        assert!(!entry_matches("192.168.1.0/24", "192.168.2.1"));
        assert!(entry_matches("10.0.0.0/8", "10.255.0.1"));
        assert!(entry_matches("10.1.2.3/32", "10.1.2.3"));
        assert!(!entry_matches("10.1.2.3/32", "10.1.2.4"));
    }

    #[test]
    fn cidr_keeps_written_base_and_masks_host_bits() {
        let network = parse_cidr("192.168.1.77/24").unwrap();
        assert_eq!(network.prefix(), 24);
        assert!(network.contains(Ipv4Addr::new(192, 168, 1, 1)));
        assert!(!network.contains(Ipv4Addr::new(192, 168, 0, 255)));
        assert!(parse_cidr("010.0.0.0/8").is_none());
    }

    #[test]
    fn range_membership_is_inclusive() {
        let entry = "192.168.1.1-192.168.1.200";
        assert!(entry_matches(entry, "192.168.1.1"));
        assert!(entry_matches(entry, "192.168.1.150"));
        assert!(entry_matches(entry, "192.168.1.200"));
        assert!(!entry_matches(entry, "192.168.1.201"));
    }

    #[test]
    fn exact_match_trims_both_sides() {
        assert!(entry_matches("  10.0.0.5 ", "10.0.0.5\n"));
        assert!(!entry_matches("10.0.0.5", "10.0.0.6"));
    }

    #[test]
    fn unrecognized_entries_never_match() {
        assert!(!entry_matches("*", "10.0.0.5"));
        assert!(!entry_matches("10.0.0.0/12", "10.0.0.5"));
        assert!(!entry_matches("10.0.0.0/8", "not-an-ip"));
        assert!(!entry_matches("", ""));
    }

    #[test]
    fn whitelist_entry_classification() {
        assert!(matches!(
            WhitelistEntry::parse("1.2.3.4"),
            Some(WhitelistEntry::Exact(_))
        ));
        assert!(matches!(
            WhitelistEntry::parse("1.2.0.0/16"),
            Some(WhitelistEntry::Cidr(n)) if n.prefix() == 16
        ));
        assert!(matches!(
            WhitelistEntry::parse(" 1.2.3.4 - 1.2.3.9 "),
            Some(WhitelistEntry::Range { .. })
        ));
        assert_eq!(WhitelistEntry::parse("1.2.3.4/7"), None);
    }
}

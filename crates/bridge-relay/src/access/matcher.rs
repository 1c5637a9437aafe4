//! Address normalization and CIDR matching.
//!
//! Matching is IPv4-only: IPv6-mapped IPv4 addresses are unwrapped before
//! comparison and everything else simply never matches a CIDR rule.

/// The canonical loopback literal every local caller normalizes to.
pub const LOOPBACK: &str = "127.0.0.1";

/// IPv6-mapped IPv4 prefix as produced by dual-stack listeners.
const MAPPED_PREFIX: &str = "::ffff:";

/// One allow-list rule, parsed fresh for every access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// Matches one address by normalized string equality.
    Exact(String),
    /// Matches any address sharing `prefix_len` leading bits with `network`.
    Cidr { network: String, prefix_len: u8 },
}

impl AccessRule {
    /// Parse a configuration entry of the form `address` or `address/prefix`.
    ///
    /// Malformed entries yield `None` and are skipped by the policy, never
    /// surfaced as errors.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }

        match entry.split_once('/') {
            Some((addr, prefix)) => {
                let addr = addr.trim();
                if addr.is_empty() {
                    return None;
                }
                let prefix_len: u8 = prefix.trim().parse().ok()?;
                if prefix_len > 32 {
                    return None;
                }
                Some(Self::Cidr {
                    network: normalize(addr).to_string(),
                    prefix_len,
                })
            }
            None => Some(Self::Exact(normalize(entry).to_string())),
        }
    }

    /// Test whether `client` is covered by this rule.
    ///
    /// CIDR rules fail closed: if either side does not convert to a 4-octet
    /// numeric address, the rule does not match.
    pub fn matches(&self, client: &str) -> bool {
        match self {
            Self::Exact(addr) => normalize(client) == addr.as_str(),
            Self::Cidr { network, prefix_len } => {
                let client = match to_numeric(normalize(client)) {
                    Some(n) => n,
                    None => return false,
                };
                let network = match to_numeric(network) {
                    Some(n) => n,
                    None => return false,
                };
                let mask = prefix_mask(*prefix_len);
                client & mask == network & mask
            }
        }
    }
}

/// Strip the IPv6-mapped prefix and canonicalize the IPv6 loopback literal.
///
/// Idempotent: anything already normalized passes through unchanged.
pub fn normalize(addr: &str) -> &str {
    if addr == "::1" {
        return LOOPBACK;
    }
    addr.strip_prefix(MAPPED_PREFIX).unwrap_or(addr)
}

/// Convert a dotted 4-octet address to its numeric form.
///
/// Returns `None` for anything that is not exactly four octets in 0-255,
/// including IPv6 literals.
pub fn to_numeric(addr: &str) -> Option<u32> {
    let mut value: u32 = 0;
    let mut parts = 0;
    for part in addr.split('.') {
        if parts == 4 {
            return None;
        }
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let octet: u32 = part.parse().ok()?;
        if octet > 255 {
            return None;
        }
        value = (value << 8) | octet;
        parts += 1;
    }
    (parts == 4).then_some(value)
}

/// Bitmask keeping the `prefix_len` leading bits. A prefix of 0 masks to 0,
/// so it matches everything.
fn prefix_mask(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix_len))
    }
}

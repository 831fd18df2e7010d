//! Network-prefix parsing for the CIDR index (§4.4).

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::{err_at, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    fn max_len(self) -> u8 {
        match self {
            Family::V4 => 32,
            Family::V6 => 128,
        }
    }
}

/// A canonical network prefix: family, address bytes (network-ordered,
/// host bits already zeroed at construction), and prefix length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefix {
    pub family: Family,
    pub bytes: Vec<u8>,
    pub len: u8,
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.family {
            Family::V4 => {
                let a = Ipv4Addr::new(self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]);
                write!(f, "{}/{}", a, self.len)
            }
            Family::V6 => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(&self.bytes);
                write!(f, "{}/{}", Ipv6Addr::from(octets), self.len)
            }
        }
    }
}

impl Prefix {
    fn from_parts(family: Family, mut bytes: Vec<u8>, len: u8) -> Result<Prefix> {
        if len > family.max_len() {
            return err_at!(InvalidRecord, msg: "prefix length {} exceeds family bound", len);
        }
        zero_host_bits(&mut bytes, len);
        Ok(Prefix { family, bytes, len })
    }

    /// Parse `input` as `addr/len`; a bare address (no `/len`) is
    /// rejected — indexing requires an explicit length (§4.4).
    pub fn parse_for_indexing(input: &str) -> Result<Prefix> {
        let (addr, len) = split_addr_len(input)?;
        let len = match len {
            Some(l) => l,
            None => return err_at!(InvalidRecord, msg: "indexing requires an explicit /len: {:?}", input),
        };
        parse_addr(addr, len)
    }

    /// Parse `input` as `addr/len`, or a bare address treated as a
    /// host-length prefix (§4.4: "valid for searching").
    pub fn parse_for_searching(input: &str) -> Result<Prefix> {
        let (addr, len) = split_addr_len(input)?;
        match len {
            Some(l) => parse_addr(addr, l),
            None => {
                let family = detect_family(addr)?;
                parse_addr(addr, family.max_len())
            }
        }
    }

    /// Truncate to `new_len`, zeroing the newly-host bits. `new_len`
    /// must not exceed the current length.
    pub fn masked_to(&self, new_len: u8) -> Prefix {
        let mut bytes = self.bytes.clone();
        zero_host_bits(&mut bytes, new_len);
        Prefix {
            family: self.family,
            bytes,
            len: new_len,
        }
    }

    /// Lengths to probe during CIDR descent: `self.len` down to 0,
    /// inclusive, widest-first (§4.4).
    pub fn walk_lengths(&self) -> impl Iterator<Item = u8> {
        (0..=self.len).rev()
    }
}

fn zero_host_bits(bytes: &mut [u8], len: u8) {
    let full_bytes = (len / 8) as usize;
    let rem_bits = len % 8;
    for (i, byte) in bytes.iter_mut().enumerate() {
        if i < full_bytes {
            continue;
        } else if i == full_bytes && rem_bits > 0 {
            let mask = 0xFFu8 << (8 - rem_bits);
            *byte &= mask;
        } else {
            *byte = 0;
        }
    }
}

fn split_addr_len(input: &str) -> Result<(&str, Option<u8>)> {
    match input.split_once('/') {
        Some((addr, len_s)) => {
            let len = err_at!(InvalidRecord, len_s.parse::<u8>())?;
            Ok((addr, Some(len)))
        }
        None => Ok((input, None)),
    }
}

fn detect_family(addr: &str) -> Result<Family> {
    if Ipv4Addr::from_str(addr).is_ok() {
        Ok(Family::V4)
    } else if Ipv6Addr::from_str(addr).is_ok() {
        Ok(Family::V6)
    } else {
        err_at!(InvalidRecord, msg: "not a valid IPv4/IPv6 address: {:?}", addr)
    }
}

fn parse_addr(addr: &str, len: u8) -> Result<Prefix> {
    if let Ok(v4) = Ipv4Addr::from_str(addr) {
        return Prefix::from_parts(Family::V4, v4.octets().to_vec(), len);
    }
    if let Ok(v6) = Ipv6Addr::from_str(addr) {
        return Prefix::from_parts(Family::V6, v6.octets().to_vec(), len);
    }
    err_at!(InvalidRecord, msg: "not a valid IPv4/IPv6 address: {:?}", addr)
}

#[cfg(test)]
#[path = "net_test.rs"]
mod net_test;

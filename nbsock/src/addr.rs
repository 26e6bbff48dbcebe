//!
//! # Socket Address Encoding and Resolution
//!
//! ## Purpose
//!
//! This file holds the mechanical edge of the crate: turning caller-facing
//! addresses into raw `sockaddr` storage for the connect/sendto syscalls, and
//! turning the storage filled in by `recvfrom` back into caller-facing
//! values. It also hosts the host-string convenience: a numeric-literal fast
//! path followed by DNS resolution.
//!
//! ## How it works
//!
//! Encoding writes into a zeroed `sockaddr_storage` union large enough for
//! any supported family (IPv4, IPv6, Unix-domain including the Linux
//! abstract namespace). Decoding inspects `ss_family` and falls back to a
//! `(family, raw bytes)` pair for families it does not know, so an embedder
//! never loses information. Resolution tries `Ipv4Addr`/`Ipv6Addr` literals
//! first and only then asks the resolver; the first resolved address wins.
//!
//! ## Main components
//!
//! - `Address`: caller-supplied destination (inet host/port or unix path).
//! - `PeerAddr`: address reported back to the caller.
//! - `SockAddr`: owned raw storage plus length, handed to syscalls.
//! - `encode()` / `decode()` / `resolve_inet()`.

use crate::error::{Result, SocketError};
use std::mem;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs as _};
use std::str::FromStr as _;

/// A destination supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// Host is a dotted-quad / IPv6 literal or a DNS name, resolved at use.
    Inet { host: String, port: u16 },
    /// Unix-domain path bytes. A leading NUL byte selects the Linux abstract
    /// namespace.
    Unix(Vec<u8>),
}

impl Address {
    pub fn inet(host: impl Into<String>, port: u16) -> Self {
        Address::Inet {
            host: host.into(),
            port,
        }
    }

    pub fn unix(path: impl Into<Vec<u8>>) -> Self {
        Address::Unix(path.into())
    }
}

/// An address reported back from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerAddr {
    /// Numeric IPv4 host text and port.
    Inet(String, u16),
    /// Numeric IPv6 host text and port.
    Inet6(String, u16),
    /// Unix-domain path bytes (leading NUL preserved for abstract names).
    Unix(Vec<u8>),
    /// Family number plus the raw sockaddr bytes, for families this crate
    /// does not interpret.
    Unknown(i32, Vec<u8>),
}

/// Owned raw sockaddr storage ready to pass to a syscall.
pub struct SockAddr {
    storage: libc::sockaddr_storage,
    len: libc::socklen_t,
}

impl SockAddr {
    pub fn family(&self) -> libc::c_int {
        self.storage.ss_family as libc::c_int
    }

    pub fn as_ptr(&self) -> *const libc::sockaddr {
        &self.storage as *const libc::sockaddr_storage as *const libc::sockaddr
    }

    pub fn len(&self) -> libc::socklen_t {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Encodes a caller address, resolving inet hosts as needed.
pub fn encode(addr: &Address) -> Result<SockAddr> {
    match addr {
        Address::Inet { host, port } => resolve_inet(host, *port),
        Address::Unix(path) => encode_unix(path),
    }
}

/// Resolves `host:port` into raw storage.
///
/// Numeric IPv4 and IPv6 literals bypass the resolver entirely; otherwise the
/// first address the resolver yields wins (which one that is, is up to the
/// system and not deterministic).
pub fn resolve_inet(host: &str, port: u16) -> Result<SockAddr> {
    if let Ok(ip) = Ipv4Addr::from_str(host) {
        return Ok(encode_inet4(ip, port));
    }
    if let Ok(ip) = Ipv6Addr::from_str(host) {
        return Ok(encode_inet6(ip, port));
    }
    let mut resolved = (host, port)
        .to_socket_addrs()
        .map_err(SocketError::Io)?;
    match resolved.next() {
        Some(SocketAddr::V4(sa)) => Ok(encode_inet4(*sa.ip(), sa.port())),
        Some(SocketAddr::V6(sa)) => Ok(encode_inet6(*sa.ip(), sa.port())),
        None => Err(SocketError::Argument(format!("cannot resolve '{host}'"))),
    }
}

fn encode_inet4(ip: Ipv4Addr, port: u16) -> SockAddr {
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let sin = &mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr_in;
    unsafe {
        (*sin).sin_family = libc::AF_INET as libc::sa_family_t;
        (*sin).sin_port = port.to_be();
        (*sin).sin_addr.s_addr = u32::from(ip).to_be();
    }
    SockAddr {
        storage,
        len: mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
    }
}

fn encode_inet6(ip: Ipv6Addr, port: u16) -> SockAddr {
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let sin6 = &mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr_in6;
    unsafe {
        (*sin6).sin6_family = libc::AF_INET6 as libc::sa_family_t;
        (*sin6).sin6_port = port.to_be();
        (*sin6).sin6_addr.s6_addr = ip.octets();
    }
    SockAddr {
        storage,
        len: mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t,
    }
}

fn encode_unix(path: &[u8]) -> Result<SockAddr> {
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let sun = &mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr_un;
    let capacity = unsafe { (*sun).sun_path.len() };
    let abstract_name = path.first() == Some(&0);
    // Filesystem paths keep one slot for the terminating NUL.
    let limit = if abstract_name { capacity } else { capacity - 1 };
    if path.is_empty() || path.len() > limit {
        return Err(SocketError::Argument(format!(
            "invalid unix path length {} (limit {limit})",
            path.len()
        )));
    }
    unsafe {
        (*sun).sun_family = libc::AF_UNIX as libc::sa_family_t;
        for (dst, src) in (*sun).sun_path.iter_mut().zip(path) {
            *dst = *src as libc::c_char;
        }
    }
    let base = mem::size_of::<libc::sa_family_t>();
    let len = if abstract_name {
        base + path.len()
    } else {
        base + path.len() + 1
    };
    Ok(SockAddr {
        storage,
        len: len as libc::socklen_t,
    })
}

/// Decodes storage filled in by the kernel into a caller-facing address.
pub fn decode(storage: &libc::sockaddr_storage, len: libc::socklen_t) -> PeerAddr {
    match storage.ss_family as libc::c_int {
        libc::AF_INET => {
            let sin = storage as *const libc::sockaddr_storage as *const libc::sockaddr_in;
            let (ip, port) = unsafe {
                (
                    Ipv4Addr::from(u32::from_be((*sin).sin_addr.s_addr)),
                    u16::from_be((*sin).sin_port),
                )
            };
            PeerAddr::Inet(ip.to_string(), port)
        }
        libc::AF_INET6 => {
            let sin6 = storage as *const libc::sockaddr_storage as *const libc::sockaddr_in6;
            let (ip, port) = unsafe {
                (
                    Ipv6Addr::from((*sin6).sin6_addr.s6_addr),
                    u16::from_be((*sin6).sin6_port),
                )
            };
            PeerAddr::Inet6(ip.to_string(), port)
        }
        libc::AF_UNIX => {
            let sun = storage as *const libc::sockaddr_storage as *const libc::sockaddr_un;
            let base = mem::size_of::<libc::sa_family_t>();
            let path_len = (len as usize).saturating_sub(base);
            let raw = unsafe { &(&(*sun).sun_path)[..path_len.min((*sun).sun_path.len())] };
            let mut path: Vec<u8> = raw.iter().map(|&c| c as u8).collect();
            // Filesystem paths arrive NUL-terminated; abstract names keep
            // their leading NUL and exact length.
            if path.first() != Some(&0) {
                if let Some(nul) = path.iter().position(|&b| b == 0) {
                    path.truncate(nul);
                }
            }
            PeerAddr::Unix(path)
        }
        family => {
            let raw = unsafe {
                std::slice::from_raw_parts(
                    storage as *const libc::sockaddr_storage as *const u8,
                    (len as usize).min(mem::size_of::<libc::sockaddr_storage>()),
                )
            };
            PeerAddr::Unknown(family, raw.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inet4_literal_roundtrips() {
        let sa = resolve_inet("127.0.0.1", 8080).unwrap();
        assert_eq!(sa.family(), libc::AF_INET);
        assert_eq!(decode(&sa.storage, sa.len()), PeerAddr::Inet("127.0.0.1".into(), 8080));
    }

    #[test]
    fn inet6_literal_roundtrips() {
        let sa = resolve_inet("::1", 443).unwrap();
        assert_eq!(sa.family(), libc::AF_INET6);
        assert_eq!(decode(&sa.storage, sa.len()), PeerAddr::Inet6("::1".into(), 443));
    }

    #[test]
    fn unix_path_roundtrips() {
        let sa = encode(&Address::unix(&b"/tmp/test.sock"[..])).unwrap();
        assert_eq!(sa.family(), libc::AF_UNIX);
        assert_eq!(
            decode(&sa.storage, sa.len()),
            PeerAddr::Unix(b"/tmp/test.sock".to_vec())
        );
    }

    #[test]
    fn abstract_unix_name_keeps_leading_nul() {
        let name = b"\0nbsock-test".to_vec();
        let sa = encode(&Address::Unix(name.clone())).unwrap();
        assert_eq!(decode(&sa.storage, sa.len()), PeerAddr::Unix(name));
    }

    #[test]
    fn oversized_unix_path_is_rejected() {
        let long = vec![b'a'; 200];
        assert!(matches!(
            encode(&Address::Unix(long)),
            Err(SocketError::Argument(_))
        ));
    }

    #[test]
    fn unknown_family_falls_back_to_raw_bytes() {
        let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
        storage.ss_family = libc::AF_PACKET as libc::sa_family_t;
        match decode(&storage, 8) {
            PeerAddr::Unknown(family, raw) => {
                assert_eq!(family, libc::AF_PACKET);
                assert_eq!(raw.len(), 8);
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }
}

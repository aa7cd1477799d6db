//! Address matching logic.
//!
//! # Responsibilities
//! - Compile policy patterns into predicates over address strings
//! - Regex: anchored, the whole address must match
//! - CIDR: strip an optional port, then test block containment
//! - Plain: exact string equality
//!
//! # Design Decisions
//! - Matchers are pure and shareable across tasks
//! - CIDR matching fails closed on anything that is not a bare IP
//!   after the port is removed

use std::net::IpAddr;

use ipnet::IpNet;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// Trait for matching destination addresses against a compiled pattern.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the address matches this pattern.
    fn matches(&self, addr: &str) -> bool;
}

/// Builds a matcher from a policy pattern string.
pub trait MatcherBuilder {
    fn build(&self, pattern: &str) -> Result<Box<dyn Matcher>, PatternError>;
}

impl<F> MatcherBuilder for F
where
    F: Fn(&str) -> Result<Box<dyn Matcher>, PatternError>,
{
    fn build(&self, pattern: &str) -> Result<Box<dyn Matcher>, PatternError> {
        self(pattern)
    }
}

/// Selects one of the canonical builders, usually from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    #[default]
    Regex,
    Cidr,
    Plain,
}

impl MatcherBuilder for MatchKind {
    fn build(&self, pattern: &str) -> Result<Box<dyn Matcher>, PatternError> {
        match self {
            MatchKind::Regex => match_regex(pattern),
            MatchKind::Cidr => match_cidr(pattern),
            MatchKind::Plain => match_plain(pattern),
        }
    }
}

/// Matches addresses against a regular expression covering the whole string.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    re: Regex,
}

impl RegexMatcher {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let re = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self { re })
    }
}

impl Matcher for RegexMatcher {
    fn matches(&self, addr: &str) -> bool {
        self.re.is_match(addr)
    }
}

/// Matches addresses whose host part lies inside an IP block.
#[derive(Debug, Clone)]
pub struct CidrMatcher {
    net: IpNet,
}

impl CidrMatcher {
    pub fn new(cidr: &str) -> Result<Self, PatternError> {
        let net = cidr
            .parse::<IpNet>()
            .map_err(|_| PatternError::Cidr(cidr.to_string()))?;
        Ok(Self { net })
    }
}

impl Matcher for CidrMatcher {
    fn matches(&self, addr: &str) -> bool {
        let host = if addr.contains(':') {
            match split_host(addr) {
                Some(host) if !host.is_empty() => host,
                _ => return false,
            }
        } else {
            addr
        };

        match host.parse::<IpAddr>() {
            Ok(ip) => self.net.contains(&ip),
            Err(_) => false,
        }
    }
}

/// Splits `host:port` or `[host]:port`, rejecting unbracketed IPv6 literals.
fn split_host(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let end = rest.find(']')?;
        let port = rest[end + 1..].strip_prefix(':')?;
        if port.contains(':') || port.contains('[') || port.contains(']') {
            return None;
        }
        return Some(&rest[..end]);
    }

    let idx = addr.rfind(':')?;
    let host = &addr[..idx];
    if host.contains(':') || host.contains('[') || host.contains(']') {
        return None;
    }
    Some(host)
}

/// Matches one address exactly.
#[derive(Debug, Clone)]
pub struct PlainMatcher {
    addr: String,
}

impl PlainMatcher {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl Matcher for PlainMatcher {
    fn matches(&self, addr: &str) -> bool {
        self.addr == addr
    }
}

pub fn match_regex(pattern: &str) -> Result<Box<dyn Matcher>, PatternError> {
    Ok(Box::new(RegexMatcher::new(pattern)?))
}

pub fn match_cidr(pattern: &str) -> Result<Box<dyn Matcher>, PatternError> {
    Ok(Box::new(CidrMatcher::new(pattern)?))
}

/// Never fails.
pub fn match_plain(pattern: &str) -> Result<Box<dyn Matcher>, PatternError> {
    Ok(Box::new(PlainMatcher::new(pattern)))
}

//! Parsing and matching for one directive's complete source list.

use std::collections::HashSet;

use url::Url;

use crate::context::PolicyContext;
use crate::directive::{self, CspDirective};
use crate::hash::{self, CspHashValue, HashAlgorithm, MAX_DIGEST_BYTES, SUPPORTED_HASH_PREFIXES};
use crate::report::{Diagnostic, DiagnosticSink};
use crate::scanner::{self, Scanner};
use crate::source::{CspSource, HostWildcard, PortWildcard, RedirectStatus};

/// Everything one directive allows: keyword flags, nonce and hash sets, and
/// the parsed source expressions. An instance with nothing set is `'none'`
/// and matches no URL at all.
#[derive(Debug, Clone)]
pub struct CspSourceList {
    directive: CspDirective,
    allow_self: bool,
    allow_star: bool,
    allow_inline: bool,
    allow_eval: bool,
    nonces: HashSet<String>,
    hashes: HashSet<CspHashValue>,
    hash_algorithms_used: u8,
    list: Vec<CspSource>,
}

impl CspSourceList {
    /// An empty list for `directive`, equivalent to `'none'`.
    pub fn new(directive: CspDirective) -> Self {
        Self {
            directive,
            allow_self: false,
            allow_star: false,
            allow_inline: false,
            allow_eval: false,
            nonces: HashSet::new(),
            hashes: HashSet::new(),
            hash_algorithms_used: 0,
            list: Vec::new(),
        }
    }

    /// Parse a directive value. Unparseable tokens are reported to `sink`
    /// and skipped; the surviving tokens behave exactly as if the bad ones
    /// had never been written, which can only narrow the policy.
    pub fn parse(directive: CspDirective, value: &str, sink: &mut DiagnosticSink) -> Self {
        let mut list = Self::new(directive);

        // `'none'` counts only as the entire value; anywhere else it is an
        // ordinary invalid token.
        if value.trim_matches(scanner::is_ascii_space).eq_ignore_ascii_case("'none'") {
            return list;
        }

        let mut scan = Scanner::new(value);
        loop {
            scan.skip_while(scanner::is_ascii_space);
            if scan.is_done() {
                break;
            }
            let token = scan.take_while(scanner::is_source_char);
            list.parse_token(token, sink);
        }
        list
    }

    fn parse_token(&mut self, token: &str, sink: &mut DiagnosticSink) {
        if token == "*" {
            self.allow_star = true;
            return;
        }
        if token.eq_ignore_ascii_case("'none'") {
            sink.report(Diagnostic::warning(format!(
                "'none' must be the only member of a source list; ignoring it in directive '{}'",
                self.directive
            )));
            return;
        }
        if token.eq_ignore_ascii_case("'self'") {
            self.allow_self = true;
            return;
        }
        if token.eq_ignore_ascii_case("'unsafe-inline'") {
            self.allow_inline = true;
            return;
        }
        if token.eq_ignore_ascii_case("'unsafe-eval'") {
            self.allow_eval = true;
            return;
        }
        if token.starts_with('\'') {
            if self.try_parse_nonce(token, sink) || self.try_parse_hash(token, sink) {
                return;
            }
            sink.report(Diagnostic::warning(format!(
                "ignoring unrecognized source '{}' in directive '{}'",
                token, self.directive
            )));
            return;
        }

        if directive::is_directive_name(token) {
            // Almost always a missing ';' in the header. Advisory only: the
            // token still parses as the host it spells.
            sink.report(Diagnostic::warning(format!(
                "'{}' appears as a source value for '{}'; did you forget a semicolon?",
                token, self.directive
            )));
        }

        match parse_source_expression(token, self.directive, sink) {
            Ok(Some(source)) => self.list.push(source),
            Ok(None) => {}
            Err(reason) => sink.report(Diagnostic::warning(format!(
                "ignoring invalid source expression '{}' in directive '{}': {}",
                token, self.directive, reason
            ))),
        }
    }

    fn try_parse_nonce(&mut self, token: &str, sink: &mut DiagnosticSink) -> bool {
        let rest = match scanner::strip_prefix_ignore_ascii_case(token, "'nonce-") {
            Some(rest) => rest,
            None => return false,
        };
        match rest.strip_suffix('\'') {
            Some(value) if !value.is_empty() && value.chars().all(scanner::is_nonce_char) => {
                self.nonces.insert(value.to_string());
            }
            _ => sink.report(Diagnostic::warning(format!(
                "ignoring invalid nonce source '{}' in directive '{}'",
                token, self.directive
            ))),
        }
        true
    }

    fn try_parse_hash(&mut self, token: &str, sink: &mut DiagnosticSink) -> bool {
        let inner = &token[1..];
        let parsed = SUPPORTED_HASH_PREFIXES.iter().find_map(|&(prefix, algorithm)| {
            scanner::strip_prefix_ignore_ascii_case(inner, prefix).map(|rest| (rest, algorithm))
        });
        let (rest, algorithm) = match parsed {
            Some(found) => found,
            None => return false,
        };
        match rest.strip_suffix('\'') {
            Some(value) if is_well_formed_hash_value(value) => {
                match hash::decode_hash_value(value) {
                    Some(digest) if digest.len() <= MAX_DIGEST_BYTES => {
                        self.hash_algorithms_used |= algorithm.bit();
                        self.hashes.insert(CspHashValue::new(algorithm, digest));
                    }
                    _ => sink.report(Diagnostic::warning(format!(
                        "ignoring hash source '{}' in directive '{}': digest is not a valid \
                         base64 value of at most {} bytes",
                        token, self.directive, MAX_DIGEST_BYTES
                    ))),
                }
            }
            _ => sink.report(Diagnostic::warning(format!(
                "ignoring malformed hash source '{}' in directive '{}'",
                token, self.directive
            ))),
        }
        true
    }

    /// Does any entry in this list allow `url`?
    pub fn matches(&self, url: &Url, redirect: RedirectStatus, ctx: &PolicyContext) -> bool {
        if self.allow_star {
            return true;
        }
        let effective = ctx.effective_url(url);
        if self.allow_self {
            if let Some(self_source) = ctx.self_source() {
                if self_source.matches(&effective, redirect, ctx) {
                    return true;
                }
            }
        }
        self.list
            .iter()
            .any(|source| source.matches(&effective, redirect, ctx))
    }

    /// String-keyed variant of [`matches`](Self::matches). A `*` list allows
    /// everything before the URL is even parsed; otherwise a candidate that
    /// does not parse matches nothing.
    pub fn matches_str(&self, url: &str, redirect: RedirectStatus, ctx: &PolicyContext) -> bool {
        if self.allow_star {
            return true;
        }
        match Url::parse(url) {
            Ok(url) => self.matches(&url, redirect, ctx),
            Err(_) => false,
        }
    }

    pub fn allows_inline(&self) -> bool {
        self.allow_inline
    }

    pub fn allows_eval(&self) -> bool {
        self.allow_eval
    }

    pub fn allows_nonce(&self, nonce: Option<&str>) -> bool {
        matches!(nonce, Some(nonce) if self.nonces.contains(nonce))
    }

    pub fn allows_hash(&self, hash: &CspHashValue) -> bool {
        self.hashes.contains(hash)
    }

    /// Bitmask of [`HashAlgorithm`] values with at least one hash source, so
    /// callers can skip digesting content that no source could ever match.
    pub fn hash_algorithms_used(&self) -> u8 {
        self.hash_algorithms_used
    }

    pub fn uses_hash_algorithm(&self, algorithm: HashAlgorithm) -> bool {
        self.hash_algorithms_used & algorithm.bit() != 0
    }

    pub fn directive(&self) -> CspDirective {
        self.directive
    }

    pub fn sources(&self) -> &[CspSource] {
        &self.list
    }

    /// True when this list is `'none'`: nothing set, nothing allowed.
    pub fn is_none(&self) -> bool {
        !self.allow_self
            && !self.allow_star
            && !self.allow_inline
            && !self.allow_eval
            && self.nonces.is_empty()
            && self.hashes.is_empty()
            && self.list.is_empty()
    }
}

/// A hash value is 1+ base64 characters followed by at most two `=`.
fn is_well_formed_hash_value(value: &str) -> bool {
    let trimmed = value.trim_end_matches('=');
    value.len() - trimmed.len() <= 2
        && !trimmed.is_empty()
        && trimmed.chars().all(scanner::is_base64_char)
}

/// Parse one token as a source expression:
/// `scheme ":"` alone, or `[scheme "://"] host [":" port] [path]`.
///
/// `Ok(None)` drops the token without comment (a bare path restricts
/// nothing); `Err` carries the reason the token is malformed.
fn parse_source_expression(
    token: &str,
    directive: CspDirective,
    sink: &mut DiagnosticSink,
) -> Result<Option<CspSource>, String> {
    let mut scheme = String::new();
    let rest;
    if let Some((candidate, after)) = token.split_once("://") {
        if !is_valid_scheme(candidate) {
            return Err("invalid scheme".to_string());
        }
        scheme = candidate.to_ascii_lowercase();
        rest = after;
    } else if let Some(candidate) = token.strip_suffix(':') {
        return if is_valid_scheme(candidate) {
            Ok(Some(CspSource::new(
                candidate.to_ascii_lowercase(),
                String::new(),
                HostWildcard::None,
                0,
                PortWildcard::None,
                String::new(),
            )))
        } else {
            Err("invalid scheme".to_string())
        };
    } else {
        rest = token;
    }

    if rest.is_empty() {
        return Err("missing host".to_string());
    }
    if rest.starts_with('/') {
        if scheme.is_empty() {
            return Ok(None);
        }
        return Err("missing host".to_string());
    }

    let mut scan = Scanner::new(rest);
    let mut host_wildcard = HostWildcard::None;
    let mut host = String::new();
    if scan.eat('*') {
        host_wildcard = HostWildcard::Present;
        if scan.eat('.') {
            host = parse_host_labels(&mut scan)?;
        }
    } else {
        host = parse_host_labels(&mut scan)?;
    }

    let mut port = 0u16;
    let mut port_wildcard = PortWildcard::None;
    if scan.eat(':') {
        if scan.eat('*') {
            port_wildcard = PortWildcard::Present;
        } else {
            let digits = scan.take_while(|c| c.is_ascii_digit());
            if digits.is_empty() {
                return Err("invalid port".to_string());
            }
            port = digits.parse().map_err(|_| "port out of range".to_string())?;
        }
    }

    let mut path = String::new();
    if !scan.is_done() {
        if scan.peek() != Some('/') {
            return Err("unexpected characters after host".to_string());
        }
        let raw = scan.take_while(scanner::is_path_char);
        if !scan.is_done() {
            sink.report(Diagnostic::info(format!(
                "query or fragment stripped from source path '{}' in directive '{}'",
                token, directive
            )));
        }
        path = scanner::percent_decode(raw);
    }

    Ok(Some(CspSource::new(
        scheme,
        host,
        host_wildcard,
        port,
        port_wildcard,
        path,
    )))
}

fn parse_host_labels(scan: &mut Scanner<'_>) -> Result<String, String> {
    let mut host = String::new();
    loop {
        let label = scan.take_while(scanner::is_host_char);
        if label.is_empty() {
            return Err("empty host label".to_string());
        }
        host.push_str(label);
        if scan.eat('.') {
            host.push('.');
        } else {
            return Ok(host);
        }
    }
}

fn is_valid_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if scanner::is_scheme_start(first) => {}
        _ => return false,
    }
    chars.all(scanner::is_scheme_char)
}

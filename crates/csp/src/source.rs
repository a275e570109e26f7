//! A single parsed source expression and its URL-matching rules.

use url::Url;

use crate::context::PolicyContext;
use crate::scanner;

/// Whether the candidate URL was reached through an HTTP redirect within the
/// load being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectStatus {
    DidRedirect,
    DidNotRedirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostWildcard {
    None,
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortWildcard {
    None,
    Present,
}

/// Default ports for the schemes whose defaults the CSP grammar can elide.
pub(crate) fn default_port_for_scheme(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        "ftp" => Some(21),
        _ => None,
    }
}

/// One allow-rule from a directive's source list, frozen at parse time.
///
/// Two fields use the empty value as a sentinel: an empty `scheme` inherits
/// the protected document's scheme, and an empty `host` makes the rule
/// scheme-only. `port` is `0` when the author wrote no port, which the
/// matching rules then read as "the scheme's default"; a literal `:0` is
/// indistinguishable from that, so the wildcard is tracked separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspSource {
    scheme: String,
    host: String,
    host_wildcard: HostWildcard,
    port: u16,
    port_wildcard: PortWildcard,
    path: String,
}

impl CspSource {
    pub fn new(
        scheme: String,
        host: String,
        host_wildcard: HostWildcard,
        port: u16,
        port_wildcard: PortWildcard,
        path: String,
    ) -> Self {
        Self {
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_ascii_lowercase(),
            host_wildcard,
            port,
            port_wildcard,
            path,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn host_wildcard(&self) -> HostWildcard {
        self.host_wildcard
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn port_wildcard(&self) -> PortWildcard {
        self.port_wildcard
    }

    /// The rule's path, percent-decoded. Empty matches any path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// A rule with no host restricts by scheme alone.
    pub fn is_scheme_only(&self) -> bool {
        self.host.is_empty()
    }

    /// Does `url` satisfy this rule?
    ///
    /// Path checking is skipped for redirected loads: the redirect target's
    /// path was chosen by the server, not the document author, and
    /// re-checking it would reject loads whose original request was allowed.
    pub fn matches(&self, url: &Url, redirect: RedirectStatus, ctx: &PolicyContext) -> bool {
        if !self.scheme_matches(url, ctx) {
            return false;
        }
        if self.is_scheme_only() {
            return true;
        }
        self.host_matches(url)
            && self.port_matches(url)
            && (redirect == RedirectStatus::DidRedirect || self.path_matches(url))
    }

    fn scheme_matches(&self, url: &Url, ctx: &PolicyContext) -> bool {
        if self.scheme.is_empty() {
            return ctx.scheme_matches_self(url.scheme());
        }
        self.scheme.eq_ignore_ascii_case(url.scheme())
    }

    fn host_matches(&self, url: &Url) -> bool {
        let host = match url.host_str() {
            Some(host) => host,
            None => return false,
        };
        match self.host_wildcard {
            HostWildcard::Present => {
                // `*.example.com` requires at least one extra label; the bare
                // apex is not a subdomain of itself.
                scanner::ends_with_ignore_ascii_case(host, &format!(".{}", self.host))
            }
            HostWildcard::None => host.eq_ignore_ascii_case(&self.host),
        }
    }

    fn port_matches(&self, url: &Url) -> bool {
        if self.port_wildcard == PortWildcard::Present {
            return true;
        }
        match url.port() {
            Some(port) => {
                if self.port == port {
                    return true;
                }
                self.port == 0 && default_port_for_scheme(url.scheme()) == Some(port)
            }
            // The URL carries no explicit port, so it rides the scheme
            // default; a portless rule agrees, an explicit rule port must
            // equal that default.
            None => {
                if self.port == 0 {
                    return true;
                }
                default_port_for_scheme(url.scheme()) == Some(self.port)
            }
        }
    }

    fn path_matches(&self, url: &Url) -> bool {
        if self.path.is_empty() {
            return true;
        }
        let path = scanner::percent_decode(url.path());
        if self.path.ends_with('/') {
            scanner::starts_with_ignore_ascii_case(&path, &self.path)
        } else {
            path.eq_ignore_ascii_case(&self.path)
        }
    }
}

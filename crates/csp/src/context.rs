//! Read-only matching context derived from the protected document's origin.
//!
//! Source matching needs three facts about the document a policy protects:
//! its scheme (for sources written without one), a source describing its
//! origin (for `'self'`), and whether its scheme wraps inner URLs (for
//! unwrapping `blob:`/`filesystem:` candidates). They are captured once here
//! and passed by shared reference, so sources and source lists never hold a
//! back-reference to the policy that owns them.

use url::Url;

use crate::error::CspResult;
use crate::source::{CspSource, HostWildcard, PortWildcard};

/// Schemes whose URLs wrap an inner URL that carries the effective origin.
fn scheme_uses_inner_url(scheme: &str) -> bool {
    matches!(scheme, "blob" | "filesystem")
}

/// The protected document's origin, reduced to what matching needs.
#[derive(Debug, Clone, Default)]
pub struct PolicyContext {
    self_scheme: String,
    self_source: Option<CspSource>,
}

impl PolicyContext {
    /// Build a context from the document's URL. A URL with no host (e.g.
    /// `data:`) yields a context where `'self'` matches nothing.
    pub fn new(document_url: &Url) -> Self {
        let self_scheme = document_url.scheme().to_ascii_lowercase();
        let self_source = document_url.host_str().map(|host| {
            CspSource::new(
                self_scheme.clone(),
                host.to_string(),
                HostWildcard::None,
                document_url.port().unwrap_or(0),
                PortWildcard::None,
                String::new(),
            )
        });
        Self {
            self_scheme,
            self_source,
        }
    }

    /// Convenience constructor from a serialized document URL.
    pub fn from_document_url(document_url: &str) -> CspResult<Self> {
        Ok(Self::new(&Url::parse(document_url)?))
    }

    pub fn self_scheme(&self) -> &str {
        &self.self_scheme
    }

    pub fn self_source(&self) -> Option<&CspSource> {
        self.self_source.as_ref()
    }

    /// Whether `scheme` matches the protected document's own scheme. An
    /// `http` document widens to the whole HTTP family, so upgrading a
    /// resource to `https` never trips the policy.
    pub(crate) fn scheme_matches_self(&self, scheme: &str) -> bool {
        if self.self_scheme.is_empty() {
            return false;
        }
        if self.self_scheme == "http" {
            return scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https");
        }
        scheme.eq_ignore_ascii_case(&self.self_scheme)
    }

    /// The URL actually compared against source expressions: candidates
    /// wrapped in `blob:`/`filesystem:` are unwrapped to their inner URL when
    /// the document origin itself lives behind such a scheme.
    pub(crate) fn effective_url(&self, url: &Url) -> Url {
        if scheme_uses_inner_url(&self.self_scheme) && scheme_uses_inner_url(url.scheme()) {
            if let Ok(inner) = Url::parse(url.path()) {
                return inner;
            }
        }
        url.clone()
    }
}

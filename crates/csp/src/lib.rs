//! Rampart CSP Engine
//!
//! Content Security Policy parsing and source-expression matching for the
//! Rampart browser. A raw `Content-Security-Policy` header value is parsed
//! into one policy per header instance; at load time the resource pipeline
//! asks the aggregated policies whether a URL, inline block, nonce, or digest
//! is allowed, and blocks the load on a `false`.
//!
//! Policies are plain data: built once when the header arrives, immutable
//! afterwards, safe to share across threads without locking. Parsing is
//! fault-tolerant by design — a malformed token is dropped and reported,
//! never fatal, and dropping a token can only make a policy stricter.
//!
//! ```
//! use rampart_csp::{ContentSecurityPolicy, PolicyDisposition, RedirectStatus};
//! use url::Url;
//!
//! let document = Url::parse("https://example.com/").unwrap();
//! let mut csp = ContentSecurityPolicy::new(&document);
//! csp.add_policy_from_header(
//!     "script-src 'self' https://cdn.example.com",
//!     PolicyDisposition::Enforce,
//! );
//!
//! let trusted = Url::parse("https://cdn.example.com/lib.js").unwrap();
//! assert!(csp.allow_script_from_source(&trusted, RedirectStatus::DidNotRedirect));
//!
//! let untrusted = Url::parse("https://ads.example.net/t.js").unwrap();
//! assert!(!csp.allow_script_from_source(&untrusted, RedirectStatus::DidNotRedirect));
//! ```

pub mod context;
pub mod directive;
pub mod error;
pub mod hash;
pub mod policy;
pub mod report;
mod scanner;
pub mod source;
pub mod source_list;

pub use context::PolicyContext;
pub use directive::CspDirective;
pub use error::{CspError, CspResult};
pub use hash::{CspHashValue, HashAlgorithm, MAX_DIGEST_BYTES};
pub use policy::{ContentSecurityPolicy, CspPolicy, PolicyDisposition};
pub use report::{Diagnostic, DiagnosticSeverity, DiagnosticSink};
pub use source::{CspSource, HostWildcard, PortWildcard, RedirectStatus};
pub use source_list::CspSourceList;

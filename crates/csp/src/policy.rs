//! Policy objects parsed from header instances, and the aggregator that
//! combines every policy in effect into one allow/deny decision.

use std::collections::HashMap;

use url::Url;

use crate::context::PolicyContext;
use crate::directive::CspDirective;
use crate::hash::CspHashValue;
use crate::report::{Diagnostic, DiagnosticSink};
use crate::scanner;
use crate::source::RedirectStatus;
use crate::source_list::CspSourceList;

/// Whether a policy blocks violating loads or only reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDisposition {
    Enforce,
    ReportOnly,
}

/// One parsed policy: the contents of a single header instance. Policies are
/// never merged; each keeps its own directives and is evaluated on its own.
#[derive(Debug, Clone)]
pub struct CspPolicy {
    directives: HashMap<CspDirective, CspSourceList>,
    disposition: PolicyDisposition,
    report_uri: Option<String>,
    header: String,
}

impl CspPolicy {
    /// Parse one policy. `segment` is a single header instance; callers with
    /// a comma-joined header should use
    /// [`ContentSecurityPolicy::add_policy_from_header`] instead.
    pub fn parse(
        segment: &str,
        disposition: PolicyDisposition,
        sink: &mut DiagnosticSink,
    ) -> Self {
        let mut policy = Self {
            directives: HashMap::new(),
            disposition,
            report_uri: None,
            header: segment.trim_matches(scanner::is_ascii_space).to_string(),
        };

        for directive_text in segment.split(';') {
            let directive_text = directive_text.trim_matches(scanner::is_ascii_space);
            if directive_text.is_empty() {
                continue;
            }

            let (name, value) = match directive_text.find(scanner::is_ascii_space) {
                Some(split) => (&directive_text[..split], &directive_text[split + 1..]),
                None => (directive_text, ""),
            };

            if name.eq_ignore_ascii_case("report-uri") {
                policy.report_uri = value.split_whitespace().next().map(str::to_string);
                continue;
            }

            match name.parse::<CspDirective>() {
                Ok(directive) => {
                    if policy.directives.contains_key(&directive) {
                        sink.report(Diagnostic::warning(format!(
                            "duplicate directive '{directive}'; keeping the first occurrence"
                        )));
                        continue;
                    }
                    let list = CspSourceList::parse(directive, value, sink);
                    policy.directives.insert(directive, list);
                }
                Err(_) => sink.report(Diagnostic::warning(format!(
                    "unrecognized directive '{name}' ignored"
                ))),
            }
        }

        policy
    }

    pub fn disposition(&self) -> PolicyDisposition {
        self.disposition
    }

    pub fn is_report_only(&self) -> bool {
        self.disposition == PolicyDisposition::ReportOnly
    }

    /// Destination named by `report-uri`, if the policy carries one.
    /// Delivering reports there is the embedder's job.
    pub fn report_uri(&self) -> Option<&str> {
        self.report_uri.as_deref()
    }

    /// The header text this policy was parsed from.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// The source list governing `directive`, resolved through the fallback
    /// chain. `None` means this policy places no restriction on it.
    pub fn source_list(&self, directive: CspDirective) -> Option<&CspSourceList> {
        directive
            .lookup_chain()
            .iter()
            .find_map(|candidate| self.directives.get(candidate))
    }

    /// Does this policy allow loading `url` for `directive`?
    pub fn allows(
        &self,
        directive: CspDirective,
        url: &Url,
        redirect: RedirectStatus,
        ctx: &PolicyContext,
    ) -> bool {
        match self.source_list(directive) {
            None => true,
            Some(list) => list.matches(url, redirect, ctx),
        }
    }
}

/// Every policy currently applied to a document. A load is allowed only when
/// each enforced policy allows it; with no policies at all, everything is
/// allowed.
///
/// Built once per document (and rebuilt from scratch when a late policy
/// arrives), then read-only: matching never mutates, so a finished aggregator
/// can be shared across threads freely.
#[derive(Debug, Clone, Default)]
pub struct ContentSecurityPolicy {
    context: PolicyContext,
    policies: Vec<CspPolicy>,
}

impl ContentSecurityPolicy {
    pub fn new(document_url: &Url) -> Self {
        Self {
            context: PolicyContext::new(document_url),
            policies: Vec::new(),
        }
    }

    pub fn with_context(context: PolicyContext) -> Self {
        Self {
            context,
            policies: Vec::new(),
        }
    }

    pub fn context(&self) -> &PolicyContext {
        &self.context
    }

    pub fn policies(&self) -> &[CspPolicy] {
        &self.policies
    }

    /// Parse a raw header value and add the resulting policies. Multiple
    /// header instances joined with commas (RFC 2616 §4.2) become independent
    /// policies, exactly as if each had arrived in its own header.
    pub fn add_policy_from_header(
        &mut self,
        header: &str,
        disposition: PolicyDisposition,
    ) -> Vec<Diagnostic> {
        let mut sink = DiagnosticSink::new();
        for segment in header.split(',') {
            if segment.trim_matches(scanner::is_ascii_space).is_empty() {
                continue;
            }
            let policy = CspPolicy::parse(segment, disposition, &mut sink);
            self.policies.push(policy);
        }
        sink.into_entries()
    }

    pub fn add_policy(&mut self, policy: CspPolicy) {
        self.policies.push(policy);
    }

    /// AND one check across all policies. Report-only policies never veto;
    /// a would-be violation there is only logged.
    fn allows_all(
        &self,
        directive: CspDirective,
        subject: &str,
        check: impl Fn(&CspSourceList) -> bool,
    ) -> bool {
        let mut allowed = true;
        for policy in &self.policies {
            let ok = match policy.source_list(directive) {
                None => true,
                Some(list) => check(list),
            };
            if ok {
                continue;
            }
            if policy.is_report_only() {
                log::warn!(
                    "report-only policy would block {subject} restricted by '{directive}' \
                     (policy: {})",
                    policy.header()
                );
            } else {
                allowed = false;
            }
        }
        allowed
    }

    fn allows_from_source(
        &self,
        directive: CspDirective,
        url: &Url,
        redirect: RedirectStatus,
    ) -> bool {
        self.allows_all(directive, url.as_str(), |list| {
            list.matches(url, redirect, &self.context)
        })
    }

    pub fn allow_script_from_source(&self, url: &Url, redirect: RedirectStatus) -> bool {
        self.allows_from_source(CspDirective::ScriptSrc, url, redirect)
    }

    pub fn allow_style_from_source(&self, url: &Url, redirect: RedirectStatus) -> bool {
        self.allows_from_source(CspDirective::StyleSrc, url, redirect)
    }

    pub fn allow_image_from_source(&self, url: &Url, redirect: RedirectStatus) -> bool {
        self.allows_from_source(CspDirective::ImgSrc, url, redirect)
    }

    pub fn allow_font_from_source(&self, url: &Url, redirect: RedirectStatus) -> bool {
        self.allows_from_source(CspDirective::FontSrc, url, redirect)
    }

    pub fn allow_media_from_source(&self, url: &Url, redirect: RedirectStatus) -> bool {
        self.allows_from_source(CspDirective::MediaSrc, url, redirect)
    }

    pub fn allow_object_from_source(&self, url: &Url, redirect: RedirectStatus) -> bool {
        self.allows_from_source(CspDirective::ObjectSrc, url, redirect)
    }

    pub fn allow_manifest_from_source(&self, url: &Url, redirect: RedirectStatus) -> bool {
        self.allows_from_source(CspDirective::ManifestSrc, url, redirect)
    }

    pub fn allow_connect_to_source(&self, url: &Url, redirect: RedirectStatus) -> bool {
        self.allows_from_source(CspDirective::ConnectSrc, url, redirect)
    }

    pub fn allow_frame_from_source(&self, url: &Url, redirect: RedirectStatus) -> bool {
        self.allows_from_source(CspDirective::FrameSrc, url, redirect)
    }

    pub fn allow_worker_from_source(&self, url: &Url, redirect: RedirectStatus) -> bool {
        self.allows_from_source(CspDirective::WorkerSrc, url, redirect)
    }

    pub fn allow_base_uri(&self, url: &Url) -> bool {
        self.allows_from_source(CspDirective::BaseUri, url, RedirectStatus::DidNotRedirect)
    }

    pub fn allow_form_action(&self, url: &Url, redirect: RedirectStatus) -> bool {
        self.allows_from_source(CspDirective::FormAction, url, redirect)
    }

    pub fn allow_frame_ancestor(&self, ancestor_url: &Url) -> bool {
        self.allows_from_source(
            CspDirective::FrameAncestors,
            ancestor_url,
            RedirectStatus::DidNotRedirect,
        )
    }

    /// String-keyed capability check, for callers holding a raw attribute
    /// value. A `*` source list allows even a candidate that fails to parse.
    pub fn allow_from_url_str(
        &self,
        directive: CspDirective,
        url: &str,
        redirect: RedirectStatus,
    ) -> bool {
        self.allows_all(directive, url, |list| {
            list.matches_str(url, redirect, &self.context)
        })
    }

    fn allows_inline(
        &self,
        directive: CspDirective,
        kind: &str,
        nonce: Option<&str>,
        hash: Option<&CspHashValue>,
    ) -> bool {
        self.allows_all(directive, kind, |list| {
            list.allows_inline()
                || list.allows_nonce(nonce)
                || hash.is_some_and(|hash| {
                    list.uses_hash_algorithm(hash.algorithm()) && list.allows_hash(hash)
                })
        })
    }

    /// Is an inline script allowed, given whatever nonce/digest the embedder
    /// has for it?
    pub fn allow_inline_script(&self, nonce: Option<&str>, hash: Option<&CspHashValue>) -> bool {
        self.allows_inline(CspDirective::ScriptSrc, "an inline script", nonce, hash)
    }

    pub fn allow_inline_style(&self, nonce: Option<&str>, hash: Option<&CspHashValue>) -> bool {
        self.allows_inline(CspDirective::StyleSrc, "an inline style", nonce, hash)
    }

    pub fn allow_eval(&self) -> bool {
        self.allows_all(CspDirective::ScriptSrc, "eval", CspSourceList::allows_eval)
    }

    pub fn allow_script_nonce(&self, nonce: &str) -> bool {
        self.allows_all(CspDirective::ScriptSrc, "a nonced script", |list| {
            list.allows_nonce(Some(nonce))
        })
    }

    pub fn allow_style_nonce(&self, nonce: &str) -> bool {
        self.allows_all(CspDirective::StyleSrc, "a nonced style", |list| {
            list.allows_nonce(Some(nonce))
        })
    }

    pub fn allow_script_hash(&self, hash: &CspHashValue) -> bool {
        self.allows_all(CspDirective::ScriptSrc, "a hashed script", |list| {
            list.allows_hash(hash)
        })
    }

    pub fn allow_style_hash(&self, hash: &CspHashValue) -> bool {
        self.allows_all(CspDirective::StyleSrc, "a hashed style", |list| {
            list.allows_hash(hash)
        })
    }

    /// Union of hash algorithms any policy uses for `directive`. When this is
    /// zero the embedder can skip digesting inline content entirely.
    pub fn hash_algorithms_used(&self, directive: CspDirective) -> u8 {
        self.policies
            .iter()
            .filter_map(|policy| policy.source_list(directive))
            .fold(0, |mask, list| mask | list.hash_algorithms_used())
    }
}

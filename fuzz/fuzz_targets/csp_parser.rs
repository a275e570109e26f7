#![no_main]
//! Content Security Policy parsing and matching fuzzer.
//!
//! Feeds arbitrary header values through the parser and arbitrary candidate
//! URLs through every capability check. Parsing must never panic, and a
//! parse-match round trip must be deterministic for the same input.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use rampart_csp::{
    ContentSecurityPolicy, CspDirective, CspHashValue, HashAlgorithm, PolicyDisposition,
    RedirectStatus,
};

#[derive(Debug, Arbitrary)]
struct CspFuzzInput {
    /// Document URL establishing the self origin.
    document_url: String,
    /// Raw header values, enforce and report-only.
    enforce_headers: Vec<String>,
    report_only_headers: Vec<String>,
    /// Candidate URLs to run through the capability checks.
    test_urls: Vec<String>,
    /// Nonces and inline content to validate.
    nonces: Vec<String>,
    inline_contents: Vec<Vec<u8>>,
}

fuzz_target!(|input: CspFuzzInput| {
    let document_url = match url::Url::parse(&input.document_url) {
        Ok(url) => url,
        Err(_) => return,
    };

    let mut csp = ContentSecurityPolicy::new(&document_url);
    for header in input.enforce_headers.iter().take(8) {
        if header.len() < 10_000 {
            let _ = csp.add_policy_from_header(header, PolicyDisposition::Enforce);
        }
    }
    for header in input.report_only_headers.iter().take(8) {
        if header.len() < 10_000 {
            let _ = csp.add_policy_from_header(header, PolicyDisposition::ReportOnly);
        }
    }

    let directives = [
        CspDirective::ScriptSrc,
        CspDirective::StyleSrc,
        CspDirective::ImgSrc,
        CspDirective::ConnectSrc,
        CspDirective::FontSrc,
        CspDirective::MediaSrc,
        CspDirective::ObjectSrc,
        CspDirective::FrameSrc,
        CspDirective::WorkerSrc,
    ];

    for candidate in input.test_urls.iter().take(16) {
        if candidate.len() >= 10_000 {
            continue;
        }
        for directive in directives {
            for redirect in [RedirectStatus::DidNotRedirect, RedirectStatus::DidRedirect] {
                let first = csp.allow_from_url_str(directive, candidate, redirect);
                let second = csp.allow_from_url_str(directive, candidate, redirect);
                assert_eq!(first, second, "matching must be deterministic");
            }
        }
        if let Ok(url) = url::Url::parse(candidate) {
            let _ = csp.allow_base_uri(&url);
            let _ = csp.allow_form_action(&url, RedirectStatus::DidNotRedirect);
            let _ = csp.allow_frame_ancestor(&url);
        }
    }

    for nonce in input.nonces.iter().take(16) {
        if nonce.len() < 1_000 {
            let _ = csp.allow_script_nonce(nonce);
            let _ = csp.allow_inline_script(Some(nonce), None);
        }
    }

    for content in input.inline_contents.iter().take(8) {
        if content.len() < 10_000 {
            for algorithm in [HashAlgorithm::Sha256, HashAlgorithm::Sha384, HashAlgorithm::Sha512] {
                if csp.hash_algorithms_used(CspDirective::ScriptSrc) & algorithm.bit() != 0 {
                    if let Some(digest) = CspHashValue::from_content(algorithm, content) {
                        let _ = csp.allow_script_hash(&digest);
                    }
                }
            }
        }
    }

    let _ = csp.allow_eval();
});

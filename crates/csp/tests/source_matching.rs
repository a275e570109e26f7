//! End-to-end tests for source-expression parsing and URL matching: each
//! scenario goes from raw directive text to a match decision the way the
//! resource pipeline would.

use url::Url;

use rampart_csp::{
    CspDirective, CspHashValue, CspSourceList, DiagnosticSink, HashAlgorithm, PolicyContext,
    RedirectStatus,
};

fn ctx() -> PolicyContext {
    PolicyContext::from_document_url("https://self.test/index.html").unwrap()
}

fn parse(value: &str) -> CspSourceList {
    let mut sink = DiagnosticSink::new();
    CspSourceList::parse(CspDirective::ScriptSrc, value, &mut sink)
}

fn allows(value: &str, candidate: &str) -> bool {
    parse(value).matches(
        &Url::parse(candidate).unwrap(),
        RedirectStatus::DidNotRedirect,
        &ctx(),
    )
}

#[test]
fn none_matches_no_url_whatever_the_scheme() {
    for candidate in [
        "https://example.com/",
        "http://example.com/",
        "ftp://example.com/",
        "data:text/plain,hello",
        "https://self.test/",
    ] {
        assert!(!allows("'none'", candidate), "{candidate} should be denied");
    }
}

#[test]
fn star_matches_unconditionally() {
    let list = parse("*");
    for candidate in [
        "https://example.com/",
        "ftp://example.com:2121/x",
        "data:text/plain,hello",
    ] {
        assert!(
            list.matches(&Url::parse(candidate).unwrap(), RedirectStatus::DidNotRedirect, &ctx()),
            "{candidate} should be allowed"
        );
    }
    // The wildcard wins before the candidate is even parsed as a URL.
    assert!(list.matches_str("", RedirectStatus::DidNotRedirect, &ctx()));
    assert!(list.matches_str("%%not-a-url%%", RedirectStatus::DidNotRedirect, &ctx()));
}

#[test]
fn prefix_path_with_default_port() {
    let value = "https://example.com:443/foo/";
    assert!(allows(value, "https://example.com/foo/bar.js"));
    assert!(!allows(value, "https://example.com/other/bar.js"));
}

#[test]
fn wildcard_host_scopes_to_subdomains() {
    let value = "*.example.com";
    assert!(allows(value, "https://sub.example.com/"));
    assert!(allows(value, "https://a.b.example.com/"));
    assert!(!allows(value, "https://example.com/"));
    assert!(!allows(value, "https://notexample.com/"));
}

#[test]
fn omitted_port_means_scheme_default() {
    let value = "https://example.com";
    assert!(allows(value, "https://example.com/"));
    assert!(allows(value, "https://example.com:443/"));
    assert!(!allows(value, "https://example.com:8443/"));
}

#[test]
fn redirected_loads_skip_the_path_check_only() {
    let list = parse("https://example.com/only/this/path");
    let moved = Url::parse("https://example.com/different/path").unwrap();
    assert!(!list.matches(&moved, RedirectStatus::DidNotRedirect, &ctx()));
    assert!(list.matches(&moved, RedirectStatus::DidRedirect, &ctx()));

    // Host and port still apply to redirected loads.
    let other_host = Url::parse("https://other.com/different/path").unwrap();
    assert!(!list.matches(&other_host, RedirectStatus::DidRedirect, &ctx()));
    let other_port = Url::parse("https://example.com:8443/different/path").unwrap();
    assert!(!list.matches(&other_port, RedirectStatus::DidRedirect, &ctx()));
}

#[test]
fn sha256_source_parses_into_the_hash_set() {
    let content = b"doSomething();";
    let digest = CspHashValue::from_content(HashAlgorithm::Sha256, content).unwrap();

    // The canonical 44-character base64 encoding of the digest.
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    let encoded = STANDARD.encode(digest.digest());
    assert_eq!(encoded.len(), 44);

    let list = parse(&format!("'sha256-{encoded}'"));
    assert!(list.uses_hash_algorithm(HashAlgorithm::Sha256));
    assert_eq!(list.hash_algorithms_used(), HashAlgorithm::Sha256.bit());
    assert!(list.allows_hash(&digest));

    let other = CspHashValue::from_content(HashAlgorithm::Sha256, b"somethingElse();").unwrap();
    assert!(!list.allows_hash(&other));
}

#[test]
fn oversized_digest_is_dropped_without_panicking() {
    // 120 base64 characters decode to 90 bytes, longer than any digest.
    let oversized = "B".repeat(120);
    let mut sink = DiagnosticSink::new();
    let list = CspSourceList::parse(
        CspDirective::ScriptSrc,
        &format!("'sha512-{oversized}'"),
        &mut sink,
    );
    assert!(!sink.is_empty());
    assert!(list.is_none());
}

#[test]
fn parsing_twice_yields_identical_behavior() {
    let value = "'self' * 'unsafe-inline' https://a.test/x/ *.b.test:8443 'nonce-n' 'sha384-aGVsbG8='";
    let first = parse(value);
    let second = parse(value);
    let candidates = [
        "https://a.test/x/file.js",
        "https://sub.b.test:8443/",
        "https://self.test/anything",
        "ftp://unrelated.test/",
    ];
    for candidate in candidates {
        let url = Url::parse(candidate).unwrap();
        for redirect in [RedirectStatus::DidNotRedirect, RedirectStatus::DidRedirect] {
            assert_eq!(
                first.matches(&url, redirect, &ctx()),
                second.matches(&url, redirect, &ctx()),
                "{candidate} diverged"
            );
        }
    }
    assert_eq!(first.allows_inline(), second.allows_inline());
    assert_eq!(first.allows_eval(), second.allows_eval());
    assert_eq!(first.allows_nonce(Some("n")), second.allows_nonce(Some("n")));
}

#[test]
fn self_keyword_uses_the_document_origin() {
    let value = "'self'";
    assert!(allows(value, "https://self.test/app.js"));
    assert!(allows(value, "https://self.test:443/app.js"));
    assert!(!allows(value, "https://other.test/app.js"));
    assert!(!allows(value, "http://self.test/app.js"));
}

#[test]
fn scheme_only_source_spans_hosts() {
    let value = "data:";
    assert!(allows(value, "data:image/png;base64,AAAA"));
    assert!(!allows(value, "https://example.com/image.png"));
}

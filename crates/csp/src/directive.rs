//! CSP directive names and the fallback relationships between them.

use std::fmt;
use std::str::FromStr;

use crate::error::CspError;

/// A fetch or navigation capability restricted by a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CspDirective {
    DefaultSrc,
    ScriptSrc,
    StyleSrc,
    ImgSrc,
    FontSrc,
    ConnectSrc,
    MediaSrc,
    ObjectSrc,
    ManifestSrc,
    FrameSrc,
    ChildSrc,
    WorkerSrc,
    BaseUri,
    FormAction,
    FrameAncestors,
}

impl CspDirective {
    pub fn as_str(self) -> &'static str {
        match self {
            CspDirective::DefaultSrc => "default-src",
            CspDirective::ScriptSrc => "script-src",
            CspDirective::StyleSrc => "style-src",
            CspDirective::ImgSrc => "img-src",
            CspDirective::FontSrc => "font-src",
            CspDirective::ConnectSrc => "connect-src",
            CspDirective::MediaSrc => "media-src",
            CspDirective::ObjectSrc => "object-src",
            CspDirective::ManifestSrc => "manifest-src",
            CspDirective::FrameSrc => "frame-src",
            CspDirective::ChildSrc => "child-src",
            CspDirective::WorkerSrc => "worker-src",
            CspDirective::BaseUri => "base-uri",
            CspDirective::FormAction => "form-action",
            CspDirective::FrameAncestors => "frame-ancestors",
        }
    }

    /// The ordered list of directives consulted when resolving this
    /// capability, most specific first. Navigation directives (`base-uri`,
    /// `form-action`, `frame-ancestors`) never fall back to `default-src`.
    pub fn lookup_chain(self) -> &'static [CspDirective] {
        use CspDirective::*;
        match self {
            DefaultSrc => &[DefaultSrc],
            ScriptSrc => &[ScriptSrc, DefaultSrc],
            StyleSrc => &[StyleSrc, DefaultSrc],
            ImgSrc => &[ImgSrc, DefaultSrc],
            FontSrc => &[FontSrc, DefaultSrc],
            ConnectSrc => &[ConnectSrc, DefaultSrc],
            MediaSrc => &[MediaSrc, DefaultSrc],
            ObjectSrc => &[ObjectSrc, DefaultSrc],
            ManifestSrc => &[ManifestSrc, DefaultSrc],
            FrameSrc => &[FrameSrc, ChildSrc, DefaultSrc],
            ChildSrc => &[ChildSrc, DefaultSrc],
            WorkerSrc => &[WorkerSrc, ChildSrc, ScriptSrc, DefaultSrc],
            BaseUri => &[BaseUri],
            FormAction => &[FormAction],
            FrameAncestors => &[FrameAncestors],
        }
    }
}

impl fmt::Display for CspDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CspDirective {
    type Err = CspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default-src" => Ok(CspDirective::DefaultSrc),
            "script-src" => Ok(CspDirective::ScriptSrc),
            "style-src" => Ok(CspDirective::StyleSrc),
            "img-src" => Ok(CspDirective::ImgSrc),
            "font-src" => Ok(CspDirective::FontSrc),
            "connect-src" => Ok(CspDirective::ConnectSrc),
            "media-src" => Ok(CspDirective::MediaSrc),
            "object-src" => Ok(CspDirective::ObjectSrc),
            "manifest-src" => Ok(CspDirective::ManifestSrc),
            "frame-src" => Ok(CspDirective::FrameSrc),
            "child-src" => Ok(CspDirective::ChildSrc),
            "worker-src" => Ok(CspDirective::WorkerSrc),
            "base-uri" => Ok(CspDirective::BaseUri),
            "form-action" => Ok(CspDirective::FormAction),
            "frame-ancestors" => Ok(CspDirective::FrameAncestors),
            _ => Err(CspError::UnknownDirective(s.to_string())),
        }
    }
}

/// Directive names we recognize but do not enforce through a source list.
const OTHER_DIRECTIVE_NAMES: [&str; 6] = [
    "report-uri",
    "report-to",
    "sandbox",
    "plugin-types",
    "upgrade-insecure-requests",
    "block-all-mixed-content",
];

/// Whether `name` is any known directive name. Used to flag a directive name
/// showing up where a source was expected, which almost always means a
/// missing `;` in the header.
pub(crate) fn is_directive_name(name: &str) -> bool {
    name.parse::<CspDirective>().is_ok()
        || OTHER_DIRECTIVE_NAMES
            .iter()
            .any(|other| name.eq_ignore_ascii_case(other))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for directive in [
            CspDirective::DefaultSrc,
            CspDirective::ScriptSrc,
            CspDirective::FrameAncestors,
            CspDirective::WorkerSrc,
        ] {
            assert_eq!(directive.as_str().parse::<CspDirective>().unwrap(), directive);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            "SCRIPT-SRC".parse::<CspDirective>().unwrap(),
            CspDirective::ScriptSrc
        );
    }

    #[test]
    fn test_unknown_directive_is_an_error() {
        assert!(matches!(
            "script-source".parse::<CspDirective>(),
            Err(CspError::UnknownDirective(_))
        ));
    }

    #[test]
    fn test_lookup_chains() {
        assert_eq!(
            CspDirective::ScriptSrc.lookup_chain(),
            &[CspDirective::ScriptSrc, CspDirective::DefaultSrc]
        );
        assert_eq!(
            CspDirective::WorkerSrc.lookup_chain(),
            &[
                CspDirective::WorkerSrc,
                CspDirective::ChildSrc,
                CspDirective::ScriptSrc,
                CspDirective::DefaultSrc
            ]
        );
        // Navigation directives never reach default-src.
        assert_eq!(CspDirective::BaseUri.lookup_chain(), &[CspDirective::BaseUri]);
        assert_eq!(
            CspDirective::FrameAncestors.lookup_chain(),
            &[CspDirective::FrameAncestors]
        );
    }

    #[test]
    fn test_directive_name_detection() {
        assert!(is_directive_name("script-src"));
        assert!(is_directive_name("REPORT-URI"));
        assert!(!is_directive_name("example.com"));
    }
}

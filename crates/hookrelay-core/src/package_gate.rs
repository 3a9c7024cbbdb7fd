//! Package publish provenance gate.
//!
//! A `package.published` event is forwarded only when the package URL the
//! provider reported matches the URL implied by the rest of the same payload:
//! `{registry}/{namespace}/{name}:{branch}`, compared case-insensitively.

use crate::domain::PackageDescriptor;

/// The outcome of checking one [`PackageDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVerdict {
    /// Whether the reported URL matches the expected one.
    pub passed: bool,
    /// Case-folded expected URL.
    pub expected: String,
    /// Case-folded reported URL.
    pub actual: String,
}

impl PackageVerdict {
    /// Human-readable reason for a failed verdict.
    pub fn reason(&self) -> Option<String> {
        (!self.passed).then(|| {
            format!(
                "package url {:?} does not match expected {:?}",
                self.actual, self.expected
            )
        })
    }
}

/// Strip the scheme and trailing slashes from a registry URL.
pub fn registry_host(url: &str) -> String {
    let trimmed = url.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map_or(trimmed, |(_, rest)| rest);
    without_scheme.trim_end_matches('/').to_string()
}

/// The host segment of a package URL such as `ghcr.io/acme/svc:main`.
pub fn package_url_host(url: &str) -> String {
    let host = registry_host(url);
    host.split('/').next().unwrap_or_default().to_string()
}

/// `{registry}/{namespace}/{name}:{branch}`, case-folded.
pub fn expected_package_url(descriptor: &PackageDescriptor) -> String {
    format!(
        "{}/{}/{}:{}",
        descriptor.registry, descriptor.namespace, descriptor.name, descriptor.branch
    )
    .to_lowercase()
}

pub fn evaluate_package(descriptor: &PackageDescriptor) -> PackageVerdict {
    let expected = expected_package_url(descriptor);
    let actual = descriptor.url.to_lowercase();
    PackageVerdict {
        passed: expected == actual,
        expected,
        actual,
    }
}

/// `true` only when the reported URL matches exactly (ignoring case).
pub fn validate_package(descriptor: &PackageDescriptor) -> bool {
    evaluate_package(descriptor).passed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(url: &str) -> PackageDescriptor {
        PackageDescriptor {
            name: "svc".into(),
            namespace: "acme".into(),
            branch: "main".into(),
            registry: "ghcr.io".into(),
            url: url.into(),
            ..Default::default()
        }
    }

    #[test]
    fn match_is_case_insensitive() {
        assert!(validate_package(&descriptor("GHCR.IO/ACME/svc:MAIN")));
    }

    #[test]
    fn namespace_mismatch_fails() {
        let verdict = evaluate_package(&descriptor("ghcr.io/other/svc:main"));
        assert!(!verdict.passed);
        assert_eq!(verdict.expected, "ghcr.io/acme/svc:main");
        assert!(verdict.reason().expect("reason").contains("ghcr.io/other/svc:main"));
    }

    #[test]
    fn passing_verdict_has_no_reason() {
        assert_eq!(evaluate_package(&descriptor("ghcr.io/acme/svc:main")).reason(), None);
    }

    #[test]
    fn prefix_or_suffix_is_not_a_match() {
        assert!(!validate_package(&descriptor("https://ghcr.io/acme/svc:main")));
        assert!(!validate_package(&descriptor("ghcr.io/acme/svc:main-old")));
    }

    #[test]
    fn registry_host_strips_scheme_and_slash() {
        assert_eq!(registry_host("https://ghcr.io/"), "ghcr.io");
        assert_eq!(registry_host("ghcr.io"), "ghcr.io");
        assert_eq!(package_url_host("ghcr.io/acme/svc:main"), "ghcr.io");
        assert_eq!(package_url_host(""), "");
    }
}

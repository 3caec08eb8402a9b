pub use seoscope_core::host_of;

/// How a result URL's host is compared against a target domain.
///
/// `Exact` treats `www.` as equivalent to the bare host and nothing else;
/// `IncludeSubdomains` additionally accepts any `*.target` host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DomainMatch {
    #[default]
    Exact,
    IncludeSubdomains,
}

impl DomainMatch {
    #[must_use]
    pub fn from_flag(include_subdomains: bool) -> Self {
        if include_subdomains {
            DomainMatch::IncludeSubdomains
        } else {
            DomainMatch::Exact
        }
    }

    /// Whether `url` belongs to `target`. `target` may be a bare domain or
    /// a full URL.
    #[must_use]
    pub fn matches(self, url: &str, target: &str) -> bool {
        let (Some(host), Some(target)) = (host_of(url), normalize_domain(target)) else {
            return false;
        };
        if host == target {
            return true;
        }
        match self {
            DomainMatch::Exact => false,
            DomainMatch::IncludeSubdomains => host
                .strip_suffix(target.as_str())
                .is_some_and(|prefix| prefix.ends_with('.')),
        }
    }
}

/// Normalizes a user-supplied target domain (bare or URL form).
#[must_use]
pub fn normalize_domain(target: &str) -> Option<String> {
    host_of(target)
}

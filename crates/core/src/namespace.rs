//! Go package path and identifier helpers
//!
//! A namespace is identified by its canonical import path: the path with any
//! vendor snapshot prefix removed, so `app/vendor/github.com/x/y` and
//! `github.com/x/y` name the same package.

/// Import path of the package providing the fake's concurrency guard
pub const RESERVED_NAMESPACE: &str = "sync";

/// Alias always bound to [`RESERVED_NAMESPACE`]
pub const RESERVED_ALIAS: &str = "sync";

const VENDOR_SEGMENT: &str = "vendor";

/// Strip everything up to and including the last `vendor` path segment.
///
/// ```
/// use fakeforge_core::namespace::unvendor;
/// assert_eq!(unvendor("app/vendor/github.com/x/y"), "github.com/x/y");
/// assert_eq!(unvendor("vendor/a/vendor/b"), "b");
/// assert_eq!(unvendor("github.com/vendorish/y"), "github.com/vendorish/y");
/// ```
pub fn unvendor(path: &str) -> String {
    let path = path.trim().trim_matches('/');
    let segments: Vec<&str> = path.split('/').collect();
    match segments.iter().rposition(|s| *s == VENDOR_SEGMENT) {
        Some(idx) => segments[idx + 1..].join("/"),
        None => path.to_string(),
    }
}

/// Guess the declared package name of an import path whose source is unavailable.
///
/// Follows Go conventions: a trailing `/vN` major version is skipped, a
/// `.vN` suffix (gopkg.in style) is dropped, `go-` prefixes and `-go`
/// suffixes are removed, and remaining non-identifier characters are discarded.
pub fn guess_package_name(path: &str) -> String {
    let canonical = unvendor(path);
    let mut segments: Vec<&str> = canonical.split('/').filter(|s| !s.is_empty()).collect();

    if segments.len() > 1 && segments.last().is_some_and(|s| is_major_version(s)) {
        segments.pop();
    }

    let last = segments.last().copied().unwrap_or_default();
    let mut name = last;
    if let Some((base, suffix)) = name.rsplit_once('.') {
        if is_major_version(suffix) {
            name = base;
        }
    }
    if let Some(rest) = name.strip_prefix("go-") {
        name = rest;
    }
    if let Some(rest) = name.strip_suffix("-go") {
        name = rest;
    }

    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase();

    match cleaned.chars().next() {
        None => "pkg".to_string(),
        Some(c) if c.is_ascii_digit() => format!("pkg{cleaned}"),
        Some(_) => cleaned,
    }
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

/// Whether a Go identifier is exported (starts with an upper-case letter)
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Convert a package name such as `http_util` or `os` to `HttpUtil` / `Os`
pub fn to_pascal_case(name: &str) -> String {
    name.split(['_', '-', '.'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unvendor_strips_through_last_segment() {
        assert_eq!(unvendor("vendor/github.com/a/b"), "github.com/a/b");
        assert_eq!(
            unvendor("example.com/app/vendor/github.com/a/b"),
            "github.com/a/b"
        );
        assert_eq!(
            unvendor("x/vendor/y/vendor/github.com/a/b"),
            "github.com/a/b"
        );
        assert_eq!(unvendor(" io "), "io");
        assert_eq!(unvendor("github.com/vendor-tools/b"), "github.com/vendor-tools/b");
    }

    #[test]
    fn test_guess_package_name() {
        assert_eq!(guess_package_name("io"), "io");
        assert_eq!(guess_package_name("net/http"), "http");
        assert_eq!(guess_package_name("github.com/x/thing/v2"), "thing");
        assert_eq!(guess_package_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(guess_package_name("github.com/x/go-redis"), "redis");
        assert_eq!(guess_package_name("github.com/x/cron-go"), "cron");
        assert_eq!(guess_package_name("github.com/x/my.lib"), "mylib");
        assert_eq!(guess_package_name("github.com/x/9p"), "pkg9p");
        assert_eq!(guess_package_name("app/vendor/github.com/x/y"), "y");
    }

    #[test]
    fn test_is_exported() {
        assert!(is_exported("Reader"));
        assert!(!is_exported("reader"));
        assert!(!is_exported("_Reader"));
        assert!(!is_exported(""));
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("os"), "Os");
        assert_eq!(to_pascal_case("http_util"), "HttpUtil");
        assert_eq!(to_pascal_case(""), "");
    }
}

//! Package URL construction (`pkg:<type>/<namespace>/<name>@<version>`).

use crate::models::Ecosystem;

/// Build the canonical PURL for `name` in `ecosystem`.
///
/// `name` is given the way the ecosystem spells it: `@scope/pkg` for npm,
/// `group:artifact` for Maven, a module path for Go, `vendor/pkg` for
/// Composer. Empty versions are treated as absent.
pub fn build(ecosystem: Ecosystem, name: &str, version: Option<&str>) -> String {
    let path = match ecosystem {
        Ecosystem::Pypi => encode_path(&name.to_lowercase().replace('_', "-")),
        Ecosystem::Maven => encode_path(&name.replacen(':', "/", 1)),
        Ecosystem::Deb => format!("debian/{}", encode_segment(name)),
        Ecosystem::Apk => format!("alpine/{}", encode_segment(name)),
        _ => encode_path(name),
    };

    let mut purl = format!("pkg:{}/{}", ecosystem.purl_type(), path);
    if let Some(v) = version.map(str::trim).filter(|v| !v.is_empty()) {
        purl.push('@');
        purl.push_str(&encode_segment(v));
    }
    purl
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' | b'_' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npm_scoped() {
        assert_eq!(
            build(Ecosystem::Npm, "@types/node", Some("20.1.0")),
            "pkg:npm/%40types/node@20.1.0"
        );
    }

    #[test]
    fn test_pypi_normalized() {
        assert_eq!(
            build(Ecosystem::Pypi, "Typing_Extensions", None),
            "pkg:pypi/typing-extensions"
        );
    }

    #[test]
    fn test_maven_coordinates() {
        assert_eq!(
            build(Ecosystem::Maven, "com.google.guava:guava", Some("33.0.0-jre")),
            "pkg:maven/com.google.guava/guava@33.0.0-jre"
        );
    }

    #[test]
    fn test_golang_path_and_build_metadata() {
        assert_eq!(
            build(Ecosystem::Golang, "github.com/spf13/cobra", Some("v1.8.0+incompatible")),
            "pkg:golang/github.com/spf13/cobra@v1.8.0%2Bincompatible"
        );
    }

    #[test]
    fn test_empty_version_omitted() {
        assert_eq!(build(Ecosystem::Cargo, "serde", Some("  ")), "pkg:cargo/serde");
    }

    #[test]
    fn test_deb_namespace() {
        assert_eq!(build(Ecosystem::Deb, "curl", None), "pkg:deb/debian/curl");
    }
}

use anyhow::Result;
use serde::Deserialize;

use crate::models::{Ecosystem, ParsedDependency};

/// `Package.resolved` v1 nests pins under `object`; v2 and v3 put them at
/// the top level and rename `repositoryURL` to `location`.
#[derive(Debug, Deserialize)]
struct PackageResolved {
    object: Option<PinsV1>,
    #[serde(default)]
    pins: Vec<Pin>,
}

#[derive(Debug, Deserialize)]
struct PinsV1 {
    #[serde(default)]
    pins: Vec<Pin>,
}

#[derive(Debug, Deserialize)]
struct Pin {
    #[serde(rename = "repositoryURL")]
    repository_url: Option<String>,
    location: Option<String>,
    state: PinState,
}

#[derive(Debug, Deserialize)]
struct PinState {
    version: Option<String>,
}

pub fn parse_package_resolved(content: &str) -> Result<Vec<ParsedDependency>> {
    let resolved: PackageResolved = serde_json::from_str(content)?;
    let pins = resolved
        .object
        .map(|o| o.pins)
        .unwrap_or_default()
        .into_iter()
        .chain(resolved.pins);

    let mut deps = Vec::new();
    for pin in pins {
        // branch and revision pins have no version
        let Some(version) = pin.state.version else {
            continue;
        };
        let Some(name) = pin.location.or(pin.repository_url).and_then(|url| repo_path(&url)) else {
            continue;
        };
        deps.push(ParsedDependency::new(Ecosystem::Swift, name, version));
    }
    Ok(deps)
}

/// `https://github.com/apple/swift-nio.git` -> `github.com/apple/swift-nio`,
/// `git@github.com:apple/swift-nio.git` -> `github.com/apple/swift-nio`.
fn repo_path(url: &str) -> Option<String> {
    let rest = match url.split_once("://") {
        Some((_, rest)) => rest.to_string(),
        None => url.strip_prefix("git@")?.replacen(':', "/", 1),
    };
    // credentials before the host
    let rest = match rest.find('@') {
        Some(i) if !rest[..i].contains('/') => &rest[i + 1..],
        _ => rest.as_str(),
    };
    let path = rest.trim_end_matches('/').trim_end_matches(".git");
    (path.split('/').filter(|s| !s.is_empty()).count() >= 3).then(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_v1() {
        let content = r#"{
  "object": {
    "pins": [
      {
        "package": "swift-log",
        "repositoryURL": "https://github.com/apple/swift-log.git",
        "state": { "branch": null, "revision": "abc", "version": "1.5.3" }
      },
      {
        "package": "Experimental",
        "repositoryURL": "https://github.com/acme/experimental.git",
        "state": { "branch": "main", "revision": "def", "version": null }
      }
    ]
  },
  "version": 1
}"#;
        let deps = parse_package_resolved(content).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].purl, "pkg:swift/github.com/apple/swift-log@1.5.3");
    }

    #[test]
    fn test_parse_v2() {
        let content = r#"{
  "originHash": "abc",
  "pins": [
    {
      "identity": "alamofire",
      "kind": "remoteSourceControl",
      "location": "https://github.com/Alamofire/Alamofire.git",
      "state": { "revision": "abc", "version": "5.8.1" }
    }
  ],
  "version": 3
}"#;
        let deps = parse_package_resolved(content).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "github.com/Alamofire/Alamofire");
    }

    #[test]
    fn test_repo_path() {
        assert_eq!(repo_path("git@github.com:apple/swift-nio.git").as_deref(), Some("github.com/apple/swift-nio"));
        assert_eq!(repo_path("https://token@gitlab.com/a/b").as_deref(), Some("gitlab.com/a/b"));
        assert_eq!(repo_path("file:///tmp"), None);
    }
}

use reqwest::Client;
use serde_json::Value;

use crate::error::Result;
use crate::store::PackageHash;

/// Fetch the sha256 of a release file from the PyPI JSON API.
pub async fn fetch_hash(client: &Client, pypi_url: &str, name: &str, version: &str) -> Result<Option<PackageHash>> {
    let url = format!("{}/pypi/{}/{}/json", pypi_url, name, version);

    let Some(doc) = super::get_json(client, "pypi", &url).await? else {
        return Ok(None);
    };
    Ok(hash_from_release(&doc))
}

/// The source distribution's digest when there is one, otherwise the first
/// file that publishes a sha256.
pub fn hash_from_release(doc: &Value) -> Option<PackageHash> {
    let files = doc.get("urls").and_then(|v| v.as_array())?;
    let sha256 = |file: &Value| {
        file.get("digests")
            .and_then(|d| d.get("sha256"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    };

    let sdist = files
        .iter()
        .filter(|f| f.get("packagetype").and_then(|v| v.as_str()) == Some("sdist"))
        .find_map(sha256);
    sdist.or_else(|| files.iter().find_map(sha256)).map(|value| PackageHash {
        algorithm: "sha256".to_string(),
        value,
        source: "pypi".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_sdist() {
        let doc = serde_json::json!({
            "info": { "name": "requests", "version": "2.31.0" },
            "urls": [
                {
                    "packagetype": "bdist_wheel",
                    "filename": "requests-2.31.0-py3-none-any.whl",
                    "digests": { "md5": "x", "sha256": "58CD2187C01E70E6E26505BCA751777AA9F2EE0B7F4300988B709F44E013003F" }
                },
                {
                    "packagetype": "sdist",
                    "filename": "requests-2.31.0.tar.gz",
                    "digests": { "sha256": "942c5a758f98d790eaed1a29cb6eefc7ffb0d1cf7af05c3d2791656dbd6ad1e1" }
                }
            ]
        });
        let hash = hash_from_release(&doc).unwrap();
        assert_eq!(hash.algorithm, "sha256");
        assert_eq!(hash.value, "942c5a758f98d790eaed1a29cb6eefc7ffb0d1cf7af05c3d2791656dbd6ad1e1");
        assert_eq!(hash.source, "pypi");
    }

    #[test]
    fn test_wheel_only() {
        let doc = serde_json::json!({
            "urls": [
                { "packagetype": "bdist_wheel", "digests": { "sha256": "ABCDEF" } }
            ]
        });
        assert_eq!(hash_from_release(&doc).unwrap().value, "abcdef");
    }

    #[test]
    fn test_no_files() {
        assert!(hash_from_release(&serde_json::json!({ "urls": [] })).is_none());
        assert!(hash_from_release(&serde_json::json!({ "info": {} })).is_none());
    }
}

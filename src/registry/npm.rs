use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::Value;

use crate::error::Result;
use crate::store::PackageHash;

/// Strongest first.
const SRI_PREFERENCE: &[&str] = &["sha512", "sha384", "sha256", "sha1"];

/// Fetch the tarball digest for an npm package version.
pub async fn fetch_hash(client: &Client, registry_url: &str, name: &str, version: &str) -> Result<Option<PackageHash>> {
    // Scoped packages need URL encoding: @scope/pkg -> %40scope%2Fpkg
    let encoded_name = name.replace('@', "%40").replace('/', "%2F");
    let url = format!("{}/{}/{}", registry_url, encoded_name, version);

    let Some(doc) = super::get_json(client, "npm", &url).await? else {
        return Ok(None);
    };
    Ok(hash_from_manifest(&doc))
}

/// Read `dist.integrity` (Subresource Integrity, `<alg>-<base64>`), falling
/// back to the legacy `dist.shasum` (sha1 hex).
pub fn hash_from_manifest(doc: &Value) -> Option<PackageHash> {
    let dist = doc.get("dist")?;

    if let Some(integrity) = dist.get("integrity").and_then(|v| v.as_str()) {
        if let Some(hash) = parse_integrity(integrity) {
            return Some(hash);
        }
    }

    dist.get("shasum")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit()))
        .map(|s| PackageHash {
            algorithm: "sha1".to_string(),
            value: s.to_lowercase(),
            source: "npm".to_string(),
        })
}

/// An integrity string may list several digests; the strongest decodable one wins.
fn parse_integrity(integrity: &str) -> Option<PackageHash> {
    let mut candidates: Vec<(usize, String, Vec<u8>)> = integrity
        .split_whitespace()
        .filter_map(|entry| {
            let (algorithm, digest) = entry.split_once('-')?;
            let algorithm = algorithm.to_lowercase();
            let rank = SRI_PREFERENCE.iter().position(|a| *a == algorithm)?;
            // options after '?' are not part of the digest
            let digest = digest.split('?').next().unwrap_or(digest);
            let bytes = STANDARD.decode(digest).ok()?;
            Some((rank, algorithm, bytes))
        })
        .collect();
    candidates.sort_by_key(|(rank, _, _)| *rank);

    candidates.into_iter().next().map(|(_, algorithm, bytes)| PackageHash {
        algorithm,
        value: hex::encode(bytes),
        source: "npm".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_decoded_to_hex() {
        let doc: Value = serde_json::from_str(
            r#"{
  "name": "lodash",
  "version": "4.17.21",
  "dist": {
    "shasum": "679591c564c3bffaae8454cf0b3df370c3d6911c",
    "integrity": "sha512-v2kDEe57lecTulaDIuNTPy3Ry4gLGJ6Z1O3vE1krgXZNrsQ+LFTGHVxVjcXPs17LhbZVGedAJv8XZ1tvj5FvSg=="
  }
}"#,
        )
        .unwrap();
        let hash = hash_from_manifest(&doc).unwrap();
        assert_eq!(hash.algorithm, "sha512");
        assert_eq!(hash.value.len(), 128);
        assert!(hash.value.starts_with("bf690311ee7b95e713ba568322e3533f"));
        assert_eq!(hash.source, "npm");
    }

    #[test]
    fn test_strongest_integrity_wins() {
        // sha1 of "" and sha256 of ""
        let doc: Value = serde_json::json!({
            "dist": {
                "integrity": "sha1-2jmj7l5rSw0yVb/vlWAYkK/YBwk= sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
            }
        });
        let hash = hash_from_manifest(&doc).unwrap();
        assert_eq!(hash.algorithm, "sha256");
        assert_eq!(hash.value, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
    }

    #[test]
    fn test_shasum_fallback() {
        let doc: Value = serde_json::json!({
            "dist": { "shasum": "679591C564C3BFFAAE8454CF0B3DF370C3D6911C", "integrity": "md5-nope" }
        });
        let hash = hash_from_manifest(&doc).unwrap();
        assert_eq!(hash.algorithm, "sha1");
        assert_eq!(hash.value, "679591c564c3bffaae8454cf0b3df370c3d6911c");
    }

    #[test]
    fn test_no_dist_is_none() {
        assert!(hash_from_manifest(&serde_json::json!({ "name": "x" })).is_none());
        assert!(hash_from_manifest(&serde_json::json!({ "dist": {} })).is_none());
    }
}

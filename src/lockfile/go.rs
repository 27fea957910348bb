use anyhow::Result;

use crate::models::{Ecosystem, ParsedDependency};

/// Parse the `require` directives of `go.mod`, single-line and block form.
/// `// indirect` requirements are kept; they are part of the build list.
pub fn parse_go_mod(content: &str) -> Result<Vec<ParsedDependency>> {
    let mut deps = Vec::new();
    let mut in_block = false;

    for raw in content.lines() {
        let line = raw.split("//").next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        if in_block {
            if line == ")" {
                in_block = false;
            } else if let Some(d) = require_line(line) {
                deps.push(d);
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest == "(" {
                in_block = true;
            } else if let Some(d) = require_line(rest) {
                deps.push(d);
            }
        }
    }

    Ok(deps)
}

fn require_line(line: &str) -> Option<ParsedDependency> {
    let mut parts = line.split_whitespace();
    let module = parts.next()?.trim_matches('"');
    let version = parts.next()?;
    version
        .starts_with('v')
        .then(|| ParsedDependency::new(Ecosystem::Golang, module, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_go_mod() {
        let content = r#"module github.com/acme/widgets

go 1.21

require github.com/spf13/cobra v1.8.0

require (
	github.com/pkg/errors v0.9.1
	golang.org/x/sys v0.15.0 // indirect
)

replace github.com/pkg/errors => ../errors
"#;
        let deps = parse_go_mod(content).unwrap();
        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].purl, "pkg:golang/github.com/spf13/cobra@v1.8.0");
        assert_eq!(deps[2].name, "golang.org/x/sys");
    }

    #[test]
    fn test_module_only() {
        assert!(parse_go_mod("module example.com/x\n\ngo 1.22\n").unwrap().is_empty());
    }
}

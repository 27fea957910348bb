use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

use crate::models::{Ecosystem, ParsedDependency};

static GRADLE_LOCK_LINE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^([^:=\s]+):([^:=\s]+):([^=\s]+)=").ok());

fn dep(group_id: &str, artifact_id: &str, version: &str) -> ParsedDependency {
    // "group:artifact" keeps the Maven coordinates; the purl splits them
    let name = if group_id.is_empty() {
        artifact_id.to_string()
    } else {
        format!("{}:{}", group_id, artifact_id)
    };
    ParsedDependency::new(Ecosystem::Maven, name, version)
}

/// Parse `pom.xml` with the quick-xml event API.
///
/// Only `<dependency>` elements with a literal version are reported:
/// property references (`${spring.version}`) and versions inherited from a
/// parent or BOM cannot be resolved from this file alone.
pub fn parse_pom_xml(content: &str) -> Result<Vec<ParsedDependency>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut deps = Vec::new();
    let mut buf = Vec::new();

    let mut depth: u32 = 0;
    let mut dependencies_depth: Option<u32> = None;
    let mut in_dependency = false;
    let mut dependency_depth: u32 = 0;
    let mut current_tag = String::new();
    let mut group_id = String::new();
    let mut artifact_id = String::new();
    let mut version = String::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .with_context(|| format!("malformed pom.xml at byte {}", reader.buffer_position()))?;
        match event {
            Event::Start(ref e) => {
                depth += 1;
                let name = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                match name.as_str() {
                    "dependencies" if dependencies_depth.is_none() => {
                        dependencies_depth = Some(depth);
                    }
                    "dependency" if dependencies_depth.is_some() => {
                        in_dependency = true;
                        dependency_depth = depth;
                        group_id.clear();
                        artifact_id.clear();
                        version.clear();
                    }
                    _ => {}
                }
                current_tag = name;
            }
            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                if name == "dependency" && in_dependency {
                    let literal = !version.is_empty() && !version.contains("${");
                    if !artifact_id.is_empty() && literal {
                        deps.push(dep(&group_id, &artifact_id, &version));
                    }
                    in_dependency = false;
                } else if name == "dependencies" && dependencies_depth == Some(depth) {
                    dependencies_depth = None;
                }
                depth = depth.saturating_sub(1);
                current_tag.clear();
            }
            // direct children only; <exclusions> carry their own coordinates
            Event::Text(ref e) if in_dependency && depth == dependency_depth + 1 => {
                let text = e.unescape().unwrap_or_default();
                match current_tag.as_str() {
                    "groupId" => group_id = text.trim().to_string(),
                    "artifactId" => artifact_id = text.trim().to_string(),
                    "version" => version = text.trim().to_string(),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(deps)
}

/// Parse `gradle.lockfile`: `group:artifact:version=configurations`.
pub fn parse_gradle_lockfile(content: &str) -> Result<Vec<ParsedDependency>> {
    let Some(re) = GRADLE_LOCK_LINE.as_ref() else {
        return Ok(Vec::new());
    };
    let mut deps = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("empty=") {
            continue;
        }
        if let Some(caps) = re.captures(line) {
            deps.push(dep(&caps[1], &caps[2], &caps[3]));
        }
    }

    Ok(deps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pom_xml() {
        let xml = r#"<?xml version="1.0"?>
<project>
  <parent>
    <groupId>org.springframework.boot</groupId>
    <artifactId>spring-boot-starter-parent</artifactId>
    <version>3.2.0</version>
  </parent>
  <dependencies>
    <dependency>
      <groupId>com.squareup.okhttp3</groupId>
      <artifactId>okhttp</artifactId>
      <version>4.12.0</version>
    </dependency>
    <dependency>
      <groupId>org.junit.jupiter</groupId>
      <artifactId>junit-jupiter</artifactId>
      <version>5.10.1</version>
      <scope>test</scope>
    </dependency>
    <dependency>
      <groupId>org.slf4j</groupId>
      <artifactId>slf4j-api</artifactId>
      <version>2.0.9</version>
      <exclusions>
        <exclusion>
          <groupId>log4j</groupId>
          <artifactId>log4j</artifactId>
        </exclusion>
      </exclusions>
    </dependency>
    <dependency>
      <groupId>org.springframework</groupId>
      <artifactId>spring-core</artifactId>
      <version>${spring.version}</version>
    </dependency>
    <dependency>
      <groupId>org.springframework.boot</groupId>
      <artifactId>spring-boot-starter-web</artifactId>
    </dependency>
  </dependencies>
</project>"#;
        let deps = parse_pom_xml(xml).unwrap();
        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].name, "com.squareup.okhttp3:okhttp");
        assert_eq!(deps[0].purl, "pkg:maven/com.squareup.okhttp3/okhttp@4.12.0");
        assert_eq!(deps[1].version, "5.10.1");
        assert_eq!(deps[2].name, "org.slf4j:slf4j-api");
    }

    #[test]
    fn test_dependency_management_and_plugins() {
        let xml = r#"<project>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>com.fasterxml.jackson</groupId>
        <artifactId>jackson-bom</artifactId>
        <version>2.16.0</version>
      </dependency>
    </dependencies>
  </dependencyManagement>
  <build>
    <plugins>
      <plugin>
        <artifactId>maven-compiler-plugin</artifactId>
        <version>3.11.0</version>
      </plugin>
    </plugins>
  </build>
</project>"#;
        let deps = parse_pom_xml(xml).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "com.fasterxml.jackson:jackson-bom");
    }

    #[test]
    fn test_parse_gradle_lockfile() {
        let content = "# This is a Gradle generated file for dependency locking.\ncom.google.guava:guava:32.1.3-jre=compileClasspath,runtimeClasspath\norg.slf4j:slf4j-api:2.0.9=runtimeClasspath\nempty=annotationProcessor\n";
        let deps = parse_gradle_lockfile(content).unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].purl, "pkg:maven/com.google.guava/guava@32.1.3-jre");
    }
}

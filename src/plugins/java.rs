use once_cell::sync::Lazy;
use regex::Regex;

use super::{capture_modules, pattern, score, signals, under, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// JVM languages (Java, Kotlin, Scala, Groovy) resolved to Maven coordinates.
pub struct JavaPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^\s*package\s+[\w.]+;\s*$", 25),
        (r"(?m)^\s*import\s+(static\s+)?[\w.]+(\.\*)?;\s*$", 20),
        (r"\bpublic\s+(final\s+)?(class|interface|enum|record)\s+\w+", 20),
        (r"\bSystem\.out\.print", 10),
        (r"(?m)^\s*@(Override|Test|Autowired|Inject)\b", 10),
        (r"(?m)^\s*(data\s+)?class\s+\w+\s*\(", 5),
        (r"(?m)^\s*fun\s+\w+\s*\(", 15),
    ])
});

static IMPORT: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r"(?m)^\s*import\s+(?:static\s+)?([A-Za-z_][\w.]*[\w*])\s*(?:;|$|\s+as\s)"));

static PACKAGE: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?m)^\s*package\s+([A-Za-z_][\w.]*)\s*;?\s*$"));

const STDLIB_PREFIXES: &[&str] = &[
    "java", "javax", "jdk", "sun", "com.sun", "org.w3c.dom", "org.xml.sax", "org.ietf.jgss",
    "org.omg", "kotlin", "scala", "groovy", "android", "androidx",
];

/// Well-known package prefixes and their Maven coordinates.
const KNOWN: &[(&str, &str)] = &[
    ("com.google.common", "com.google.guava:guava"),
    ("com.google.gson", "com.google.code.gson:gson"),
    ("com.google.protobuf", "com.google.protobuf:protobuf-java"),
    ("com.google.inject", "com.google.inject:guice"),
    ("com.fasterxml.jackson.databind", "com.fasterxml.jackson.core:jackson-databind"),
    ("com.fasterxml.jackson.core", "com.fasterxml.jackson.core:jackson-core"),
    ("com.fasterxml.jackson.annotation", "com.fasterxml.jackson.core:jackson-annotations"),
    ("org.apache.commons.lang3", "org.apache.commons:commons-lang3"),
    ("org.apache.commons.io", "commons-io:commons-io"),
    ("org.apache.commons.codec", "commons-codec:commons-codec"),
    ("org.apache.commons.collections4", "org.apache.commons:commons-collections4"),
    ("org.apache.http", "org.apache.httpcomponents:httpclient"),
    ("org.apache.logging.log4j", "org.apache.logging.log4j:log4j-api"),
    ("org.apache.kafka", "org.apache.kafka:kafka-clients"),
    ("org.slf4j", "org.slf4j:slf4j-api"),
    ("ch.qos.logback", "ch.qos.logback:logback-classic"),
    ("org.junit.jupiter", "org.junit.jupiter:junit-jupiter"),
    ("org.junit", "junit:junit"),
    ("org.mockito", "org.mockito:mockito-core"),
    ("org.assertj", "org.assertj:assertj-core"),
    ("org.hamcrest", "org.hamcrest:hamcrest"),
    ("lombok", "org.projectlombok:lombok"),
    ("okhttp3", "com.squareup.okhttp3:okhttp"),
    ("retrofit2", "com.squareup.retrofit2:retrofit"),
    ("io.reactivex.rxjava3", "io.reactivex.rxjava3:rxjava"),
    ("reactor.core", "io.projectreactor:reactor-core"),
    ("io.netty", "io.netty:netty-all"),
    ("io.micronaut", "io.micronaut:micronaut-core"),
    ("io.quarkus", "io.quarkus:quarkus-core"),
    ("jakarta.persistence", "jakarta.persistence:jakarta.persistence-api"),
    ("jakarta.servlet", "jakarta.servlet:jakarta.servlet-api"),
    ("jakarta.validation", "jakarta.validation:jakarta.validation-api"),
    ("org.hibernate", "org.hibernate.orm:hibernate-core"),
    ("org.springframework.boot", "org.springframework.boot:spring-boot"),
    ("org.springframework.web", "org.springframework:spring-web"),
    ("org.springframework.context", "org.springframework:spring-context"),
    ("org.springframework.beans", "org.springframework:spring-beans"),
    ("org.springframework.data.jpa", "org.springframework.data:spring-data-jpa"),
    ("org.springframework", "org.springframework:spring-core"),
    ("kotlinx.coroutines", "org.jetbrains.kotlinx:kotlinx-coroutines-core"),
    ("kotlinx.serialization", "org.jetbrains.kotlinx:kotlinx-serialization-json"),
    ("org.jetbrains.annotations", "org.jetbrains:annotations"),
];

const DOMAIN_ROOTS: &[&str] = &["com", "org", "io", "net", "dev", "de", "fr", "uk", "edu", "me", "co", "ai"];

impl LanguagePlugin for JavaPlugin {
    fn id(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".java", ".kt", ".kts", ".scala", ".groovy"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let imports = capture_modules(&IMPORT, content);
        match own_root(content) {
            Some(root) => imports
                .into_iter()
                .filter(|i| !under(&i.module, &root, '.'))
                .collect(),
            None => imports,
        }
    }

    fn is_std_lib(&self, module: &str) -> bool {
        STDLIB_PREFIXES.iter().any(|p| under(module, p, '.'))
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        if let Some((_, coords)) = KNOWN.iter().find(|(prefix, _)| under(module, prefix, '.')) {
            return Some(DetectedPackage::new(Ecosystem::Maven, *coords));
        }

        // Reverse-domain fallback: com.acme.widgets.Foo -> com.acme:widgets
        let segments: Vec<&str> = module
            .split('.')
            .filter(|s| *s != "*" && s.starts_with(|c: char| c.is_ascii_lowercase()))
            .collect();
        if segments.len() < 3 || !DOMAIN_ROOTS.contains(&segments[0]) {
            return None;
        }
        let group = format!("{}.{}", segments[0], segments[1]);
        Some(DetectedPackage::new(
            Ecosystem::Maven,
            format!("{}:{}", group, segments[2]),
        ))
    }
}

/// `group.artifact` prefix of the file's own `package` declaration. Imports
/// under it belong to the project, not to a dependency.
fn own_root(content: &str) -> Option<String> {
    let declared = PACKAGE.as_ref()?.captures(content)?.get(1)?.as_str();
    let mut segments = declared.split('.');
    let group = segments.next()?;
    let artifact = segments.next()?;
    Some(format!("{}.{}", group, artifact))
}

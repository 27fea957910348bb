use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, under, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// C# and F# namespaces resolved to NuGet packages.
pub struct CSharpPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^\s*using\s+System(\.[\w.]+)?\s*;", 30),
        (r"(?m)^\s*namespace\s+[\w.]+\s*(;|\{|$)", 15),
        (r"\b(public|internal|private)\s+(static\s+|sealed\s+|partial\s+)*(class|record|struct|interface)\s+\w+", 15),
        (r"\{\s*get;\s*(set;|init;)?\s*\}", 20),
        (r"\bConsole\.Write(Line)?\(", 10),
        (r"\basync\s+Task(<[^>]+>)?\s+\w+\s*\(", 10),
        (r"(?m)^\s*open\s+System(\.[\w.]+)?\s*$", 25),
    ])
});

static USING: Lazy<Option<Regex>> = Lazy::new(|| {
    pattern(r"(?m)^\s*(?:global\s+)?using\s+(?:static\s+)?(?:\w+\s*=\s*)?([A-Z][\w.]*)\s*;")
});
static OPEN: Lazy<Option<Regex>> = Lazy::new(|| pattern(r"(?m)^\s*open\s+([A-Z][\w.]*)\s*$"));

const STDLIB_PREFIXES: &[&str] = &[
    "System",
    "Microsoft.CSharp",
    "Microsoft.VisualBasic",
    "Microsoft.Win32",
    "Microsoft.FSharp",
    "Microsoft.AspNetCore",
    "Windows",
    "FSharp.Core",
];

/// Namespace prefixes and the NuGet package that provides them.
const KNOWN: &[(&str, &str)] = &[
    ("Newtonsoft.Json", "Newtonsoft.Json"),
    ("Microsoft.EntityFrameworkCore", "Microsoft.EntityFrameworkCore"),
    ("Microsoft.Extensions.DependencyInjection", "Microsoft.Extensions.DependencyInjection"),
    ("Microsoft.Extensions.Logging", "Microsoft.Extensions.Logging"),
    ("Microsoft.Extensions.Configuration", "Microsoft.Extensions.Configuration"),
    ("Microsoft.Extensions.Hosting", "Microsoft.Extensions.Hosting"),
    ("Microsoft.Extensions.Options", "Microsoft.Extensions.Options"),
    ("Microsoft.Extensions.Http", "Microsoft.Extensions.Http"),
    ("Microsoft.Data.SqlClient", "Microsoft.Data.SqlClient"),
    ("Microsoft.IdentityModel.Tokens", "Microsoft.IdentityModel.Tokens"),
    ("Microsoft.VisualStudio.TestTools.UnitTesting", "MSTest.TestFramework"),
    ("Xunit", "xunit"),
    ("NUnit.Framework", "NUnit"),
    ("Moq", "Moq"),
    ("NSubstitute", "NSubstitute"),
    ("FluentAssertions", "FluentAssertions"),
    ("FluentValidation", "FluentValidation"),
    ("Serilog", "Serilog"),
    ("NLog", "NLog"),
    ("AutoMapper", "AutoMapper"),
    ("Dapper", "Dapper"),
    ("MediatR", "MediatR"),
    ("Polly", "Polly"),
    ("StackExchange.Redis", "StackExchange.Redis"),
    ("Npgsql", "Npgsql"),
    ("MySqlConnector", "MySqlConnector"),
    ("MongoDB.Driver", "MongoDB.Driver"),
    ("RestSharp", "RestSharp"),
    ("Swashbuckle", "Swashbuckle.AspNetCore"),
    ("Grpc.Core", "Grpc.Core"),
    ("Google.Protobuf", "Google.Protobuf"),
    ("Hangfire", "Hangfire.Core"),
    ("MassTransit", "MassTransit"),
    ("Quartz", "Quartz"),
    ("CsvHelper", "CsvHelper"),
    ("Humanizer", "Humanizer"),
    ("BenchmarkDotNet", "BenchmarkDotNet"),
    ("UnityEngine", "UnityEngine"),
    ("Avalonia", "Avalonia"),
    ("CommunityToolkit.Mvvm", "CommunityToolkit.Mvvm"),
];

impl LanguagePlugin for CSharpPlugin {
    fn id(&self) -> &'static str {
        "csharp"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".cs", ".csx", ".fs", ".fsx"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let mut imports = super::capture_modules(&USING, content);
        imports.extend(super::capture_modules(&OPEN, content));
        imports
    }

    fn is_std_lib(&self, module: &str) -> bool {
        STDLIB_PREFIXES.iter().any(|p| under(module, p, '.'))
    }

    /// Namespaces are only mapped when a known package provides them; C#
    /// projects import their own namespaces with the same syntax.
    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        KNOWN
            .iter()
            .find(|(prefix, _)| under(module, prefix, '.'))
            .map(|(_, package)| DetectedPackage::new(Ecosystem::Nuget, *package))
    }
}

use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, under, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

pub struct ElixirPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^\s*defmodule\s+[A-Z][\w.]*\s+do\s*$", 35),
        (r"(?m)^\s*defp?\s+\w+[?!]?(\(.*\))?\s*(,\s*)?do:?", 20),
        (r"(?m)^\s*(alias|import|use|require)\s+[A-Z][\w.]*", 15),
        (r"\|>", 15),
        (r"(?m)^\s*@(moduledoc|doc|spec)\b", 15),
        (r"%\{", 5),
    ])
});

static DIRECTIVE: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r"(?m)^\s*(?:alias|import|use|require)\s+([A-Z][\w.]*)"));

const STDLIB_ROOTS: &[&str] = &[
    "Kernel", "Enum", "Map", "List", "String", "Integer", "Float", "Atom", "Tuple", "Keyword",
    "Stream", "Agent", "Task", "GenServer", "Supervisor", "DynamicSupervisor", "Registry",
    "Process", "Application", "Logger", "IO", "File", "Path", "System", "Code", "Module",
    "Access", "Base", "Bitwise", "Calendar", "Date", "DateTime", "NaiveDateTime", "Time",
    "Exception", "Function", "MapSet", "Node", "Port", "Protocol", "Range", "Record", "Regex",
    "URI", "Version", "ExUnit", "IEx", "Mix", "EEx", "Inspect", "Macro", "Config",
];

/// Module prefixes and the Hex package that provides them.
const KNOWN: &[(&str, &str)] = &[
    ("Phoenix.LiveView", "phoenix_live_view"),
    ("Phoenix.HTML", "phoenix_html"),
    ("Phoenix.PubSub", "phoenix_pubsub"),
    ("Phoenix", "phoenix"),
    ("Ecto.Adapters.SQL", "ecto_sql"),
    ("Ecto", "ecto"),
    ("Plug.Cowboy", "plug_cowboy"),
    ("Plug", "plug"),
    ("Jason", "jason"),
    ("Poison", "poison"),
    ("Tesla", "tesla"),
    ("HTTPoison", "httpoison"),
    ("Finch", "finch"),
    ("Req", "req"),
    ("Absinthe", "absinthe"),
    ("Oban", "oban"),
    ("Broadway", "broadway"),
    ("Telemetry.Metrics", "telemetry_metrics"),
    ("Guardian", "guardian"),
    ("Timex", "timex"),
    ("Decimal", "decimal"),
    ("Postgrex", "postgrex"),
    ("Swoosh", "swoosh"),
    ("Credo", "credo"),
    ("Mox", "mox"),
    ("ExMachina", "ex_machina"),
    ("Nx", "nx"),
];

impl LanguagePlugin for ElixirPlugin {
    fn id(&self) -> &'static str {
        "elixir"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".ex", ".exs"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        super::capture_modules(&DIRECTIVE, content)
    }

    fn is_std_lib(&self, module: &str) -> bool {
        STDLIB_ROOTS.iter().any(|root| under(module, root, '.'))
    }

    /// Hex package names are not derivable from module names, so only known
    /// modules are mapped.
    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        KNOWN
            .iter()
            .find(|(prefix, _)| under(module, prefix, '.'))
            .map(|(_, package)| DetectedPackage::new(Ecosystem::Hex, *package))
    }
}

use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, under, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

pub struct HaskellPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^module\s+[A-Z][\w.]*(\s*\(.*)?\s*(where)?\s*$", 25),
        (r"(?m)^import\s+(qualified\s+)?[A-Z][\w.]*", 20),
        (r"(?m)^\w+\s*::\s*[A-Z\[(]", 20),
        (r"(?m)^main\s*=\s*do\b", 15),
        (r"\{-#\s*LANGUAGE\b", 20),
        (r"(?m)^data\s+[A-Z]\w*.*=", 10),
        (r"<\$>|>>=", 5),
    ])
});

static IMPORT: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r"(?m)^import\s+(?:safe\s+)?(?:qualified\s+)?(?:\x22[\w-]+\x22\s+)?([A-Z][\w.]*)"));

/// Module prefixes provided by `base`.
const BASE_PREFIXES: &[&str] = &[
    "Prelude", "Control.Monad", "Control.Exception", "Control.Concurrent", "Control.Applicative",
    "Control.Arrow", "Control.Category", "Data.List", "Data.Maybe", "Data.Char", "Data.Either",
    "Data.Function", "Data.Functor", "Data.Foldable", "Data.Traversable", "Data.IORef",
    "Data.Word", "Data.Int", "Data.Bits", "Data.Ord", "Data.Kind", "Data.Proxy", "Data.Void",
    "Data.Monoid", "Data.Semigroup", "Data.Coerce", "Data.Dynamic", "Data.Typeable",
    "Data.Ratio", "Data.Complex", "Data.String", "Data.Tuple", "Data.Bool", "Data.Fixed",
    "Data.Unique", "Data.Version", "Data.Bifunctor", "Debug.Trace", "Foreign", "GHC",
    "System.IO", "System.Exit", "System.Environment", "System.Mem", "System.Info",
    "System.Timeout", "System.CPUTime", "Text.Printf", "Text.Read", "Text.Show", "Numeric",
    "Unsafe.Coerce", "Type.Reflection",
];

/// Module prefixes and the Hackage package that provides them. Checked before
/// [`BASE_PREFIXES`] so `Control.Monad.State` resolves to `mtl`.
const KNOWN: &[(&str, &str)] = &[
    ("Data.Map", "containers"),
    ("Data.Set", "containers"),
    ("Data.IntMap", "containers"),
    ("Data.IntSet", "containers"),
    ("Data.Sequence", "containers"),
    ("Data.Tree", "containers"),
    ("Data.Text", "text"),
    ("Data.ByteString", "bytestring"),
    ("Data.Aeson", "aeson"),
    ("Data.Vector", "vector"),
    ("Data.HashMap", "unordered-containers"),
    ("Data.HashSet", "unordered-containers"),
    ("Data.Hashable", "hashable"),
    ("Data.Time", "time"),
    ("Data.Yaml", "yaml"),
    ("Data.Scientific", "scientific"),
    ("Data.UUID", "uuid"),
    ("Control.Monad.State", "mtl"),
    ("Control.Monad.Reader", "mtl"),
    ("Control.Monad.Writer", "mtl"),
    ("Control.Monad.Except", "mtl"),
    ("Control.Monad.RWS", "mtl"),
    ("Control.Monad.Trans", "transformers"),
    ("Control.Monad.Logger", "monad-logger"),
    ("Control.Monad.STM", "stm"),
    ("Control.Concurrent.STM", "stm"),
    ("Control.Concurrent.Async", "async"),
    ("Control.DeepSeq", "deepseq"),
    ("Control.Lens", "lens"),
    ("Network.HTTP.Client", "http-client"),
    ("Network.HTTP.Types", "http-types"),
    ("Network.Wai", "wai"),
    ("Web.Scotty", "scotty"),
    ("Servant", "servant"),
    ("Test.Hspec", "hspec"),
    ("Test.QuickCheck", "QuickCheck"),
    ("Test.Tasty", "tasty"),
    ("Options.Applicative", "optparse-applicative"),
    ("Database.PostgreSQL.Simple", "postgresql-simple"),
    ("System.Directory", "directory"),
    ("System.FilePath", "filepath"),
    ("System.Process", "process"),
    ("Text.Megaparsec", "megaparsec"),
    ("Text.Parsec", "parsec"),
    ("Conduit", "conduit"),
];

fn known(module: &str) -> Option<&'static str> {
    KNOWN
        .iter()
        .find(|(prefix, _)| under(module, prefix, '.'))
        .map(|(_, package)| *package)
}

impl LanguagePlugin for HaskellPlugin {
    fn id(&self) -> &'static str {
        "haskell"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".hs", ".lhs"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        super::capture_modules(&IMPORT, content)
    }

    fn is_std_lib(&self, module: &str) -> bool {
        known(module).is_none() && BASE_PREFIXES.iter().any(|p| under(module, p, '.'))
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        known(module).map(|package| DetectedPackage::new(Ecosystem::Hackage, package))
    }
}

use once_cell::sync::Lazy;

use super::c::{angle_includes, conan_package, is_c_std_header};
use super::{score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// C++ sources. `.h` is left to [`super::c::CPlugin`]; C++ headers with that
/// suffix win on content.
pub struct CppPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^\s*#\s*include\s*<[a-z_]+>", 20),
        (r"(?m)^\s*namespace\s+[\w:]+\s*\{", 20),
        (r"\btemplate\s*<", 25),
        (r"\bstd::\w+", 20),
        (r"(?m)^\s*(public|private|protected):", 15),
        (r"(?m)^\s*class\s+\w+(\s*:\s*(public|private)\s+[\w:]+)?\s*\{", 10),
        (r"(?m)^\s*using\s+namespace\s+\w+", 15),
        (r"\b(nullptr|constexpr|std::cout)\b", 10),
    ])
});

const STD_HEADERS: &[&str] = &[
    "algorithm", "any", "array", "atomic", "barrier", "bit", "bitset", "cassert", "cctype",
    "cerrno", "cfloat", "charconv", "chrono", "cinttypes", "climits", "clocale", "cmath",
    "codecvt", "compare", "complex", "concepts", "condition_variable", "coroutine", "csetjmp",
    "csignal", "cstdarg", "cstddef", "cstdint", "cstdio", "cstdlib", "cstring", "ctime",
    "cwchar", "cwctype", "deque", "exception", "execution", "expected", "filesystem", "format",
    "forward_list", "fstream", "functional", "future", "initializer_list", "iomanip", "ios",
    "iosfwd", "iostream", "istream", "iterator", "latch", "limits", "list", "locale", "map",
    "memory", "memory_resource", "mutex", "new", "numbers", "numeric", "optional", "ostream",
    "print", "queue", "random", "ranges", "ratio", "regex", "scoped_allocator", "semaphore",
    "set", "shared_mutex", "source_location", "span", "sstream", "stack", "stdexcept",
    "stop_token", "streambuf", "string", "string_view", "syncstream", "system_error", "thread",
    "tuple", "type_traits", "typeindex", "typeinfo", "unordered_map", "unordered_set",
    "utility", "valarray", "variant", "vector", "version",
];

/// Header prefixes of common C++ libraries and their Conan package.
const KNOWN: &[(&str, &str)] = &[
    ("boost/", "boost"),
    ("fmt/", "fmt"),
    ("spdlog/", "spdlog"),
    ("nlohmann/", "nlohmann_json"),
    ("gtest/", "gtest"),
    ("gmock/", "gtest"),
    ("catch2/", "catch2"),
    ("doctest/", "doctest"),
    ("Eigen/", "eigen"),
    ("opencv2/", "opencv"),
    ("grpcpp/", "grpc"),
    ("google/protobuf/", "protobuf"),
    ("absl/", "abseil"),
    ("folly/", "folly"),
    ("Poco/", "poco"),
    ("QtCore/", "qt"),
    ("QtWidgets/", "qt"),
    ("QtGui/", "qt"),
    ("yaml-cpp/", "yaml-cpp"),
    ("benchmark/", "benchmark"),
    ("range/v3/", "range-v3"),
    ("tbb/", "onetbb"),
    ("oneapi/tbb", "onetbb"),
    ("asio.hpp", "asio"),
    ("asio/", "asio"),
    ("cxxopts.hpp", "cxxopts"),
    ("CLI/", "cli11"),
    ("glm/", "glm"),
    ("rapidjson/", "rapidjson"),
    ("zmq.hpp", "cppzmq"),
    ("pybind11/", "pybind11"),
    ("magic_enum.hpp", "magic_enum"),
    ("tl/expected.hpp", "tl-expected"),
    ("imgui.h", "imgui"),
];

impl LanguagePlugin for CppPlugin {
    fn id(&self) -> &'static str {
        "cpp"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".cpp", ".cc", ".cxx", ".c++", ".hpp", ".hh", ".hxx", ".h++", ".ipp", ".tpp"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        angle_includes(content)
    }

    fn is_std_lib(&self, module: &str) -> bool {
        STD_HEADERS.contains(&module) || is_c_std_header(module)
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        KNOWN
            .iter()
            .find(|(prefix, _)| module.starts_with(prefix))
            .map(|(_, package)| DetectedPackage::new(Ecosystem::Conan, *package))
            .or_else(|| conan_package(module))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_imports() {
        let src = "#include <vector>\n#include <boost/asio.hpp>\n#include \"widget.hpp\"\n";
        let modules: Vec<String> = CppPlugin
            .extract_imports(src)
            .into_iter()
            .map(|i| i.module)
            .collect();
        assert_eq!(modules, vec!["vector", "boost/asio.hpp"]);
    }

    #[test]
    fn test_is_std_lib() {
        assert!(CppPlugin.is_std_lib("unordered_map"));
        assert!(CppPlugin.is_std_lib("stdio.h"));
        assert!(!CppPlugin.is_std_lib("fmt/core.h"));
    }

    #[test]
    fn test_map_to_package() {
        assert_eq!(CppPlugin.map_to_package("fmt/core.h").unwrap().purl, "pkg:conan/fmt");
        assert_eq!(CppPlugin.map_to_package("openssl/evp.h").unwrap().name, "openssl");
        assert!(CppPlugin.map_to_package("widget.hpp").is_none());
    }

    #[test]
    fn test_detect() {
        let src = "#include <iostream>\n\nusing namespace std;\n\nint main() {\n    std::cout << \"hi\";\n}\n";
        assert!(CppPlugin.detect(src, "main.cpp") >= 90);
    }
}

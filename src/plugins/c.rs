use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

/// C sources and headers. Headers are shared with C++, so C++ markers count
/// against this plugin.
pub struct CPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^\s*#\s*include\s*<[\w/]+\.h>", 25),
        (r"(?m)^\s*#\s*ifndef\s+\w+_H\w*\s*$", 10),
        (r"\btypedef\s+(struct|enum|union)\b", 20),
        (
            r"(?m)^\s*(static\s+|extern\s+)?(const\s+)?(void|int|char|long|short|unsigned|float|double|size_t|bool|\w+_t)\s+\**\w+\s*\([^)]*\)\s*[;{]",
            15,
        ),
        (r"\b(malloc|calloc|free|printf|fprintf|memcpy)\s*\(", 10),
        (r"(?m)^\s*namespace\s+\w+\s*\{", -30),
        (r"\btemplate\s*<", -30),
        (r"\bstd::", -30),
        (r"(?m)^\s*#\s*include\s*<[a-z_]+>", -20),
        (r"(?m)^\s*(class|public:|private:|protected:)\s*\w*", -15),
    ])
});

static INCLUDE: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r"(?m)^\s*#\s*include\s*<\s*([^>\s]+)\s*>"));

/// `<...>` includes; quoted includes are project headers and skipped.
pub(crate) fn angle_includes(content: &str) -> Vec<ImportEntry> {
    super::capture_modules(&INCLUDE, content)
}

const STD_HEADERS: &[&str] = &[
    "assert.h", "complex.h", "ctype.h", "errno.h", "fenv.h", "float.h", "inttypes.h", "iso646.h",
    "limits.h", "locale.h", "math.h", "setjmp.h", "signal.h", "stdalign.h", "stdarg.h",
    "stdatomic.h", "stdbool.h", "stddef.h", "stdint.h", "stdio.h", "stdlib.h", "stdnoreturn.h",
    "string.h", "tgmath.h", "threads.h", "time.h", "uchar.h", "wchar.h", "wctype.h",
    "unistd.h", "fcntl.h", "pthread.h", "dirent.h", "dlfcn.h", "poll.h", "sched.h",
    "semaphore.h", "termios.h", "syslog.h", "pwd.h", "grp.h", "glob.h", "regex.h", "libgen.h",
    "netdb.h", "strings.h", "spawn.h", "getopt.h", "malloc.h", "alloca.h", "endian.h",
    "windows.h", "winsock2.h", "ws2tcpip.h", "io.h", "conio.h", "process.h",
];

/// Header directories owned by the platform rather than a package.
const STD_DIRS: &[&str] = &["sys/", "netinet/", "arpa/", "net/", "linux/", "asm/", "bits/", "mach/"];

pub(crate) fn is_c_std_header(header: &str) -> bool {
    STD_HEADERS.contains(&header) || STD_DIRS.iter().any(|dir| header.starts_with(dir))
}

/// Headers of common C libraries and their Conan package. Entries ending in
/// `/` match a header directory.
const CONAN_HEADERS: &[(&str, &str)] = &[
    ("zlib.h", "zlib"),
    ("openssl/", "openssl"),
    ("curl/", "libcurl"),
    ("sqlite3.h", "sqlite3"),
    ("png.h", "libpng"),
    ("jpeglib.h", "libjpeg"),
    ("yaml.h", "libyaml"),
    ("uv.h", "libuv"),
    ("event2/", "libevent"),
    ("SDL2/", "sdl"),
    ("SDL.h", "sdl"),
    ("GLFW/", "glfw"),
    ("lz4.h", "lz4"),
    ("zstd.h", "zstd"),
    ("bzlib.h", "bzip2"),
    ("lzma.h", "xz_utils"),
    ("expat.h", "expat"),
    ("libxml/", "libxml2"),
    ("cjson/", "cjson"),
    ("jansson.h", "jansson"),
    ("pcre2.h", "pcre2"),
    ("archive.h", "libarchive"),
    ("gmp.h", "gmp"),
    ("ffi.h", "libffi"),
    ("sodium.h", "libsodium"),
    ("mbedtls/", "mbedtls"),
    ("hiredis/", "hiredis"),
    ("libpq-fe.h", "libpq"),
    ("mysql/", "libmysqlclient"),
    ("lua.h", "lua"),
    ("gtk/", "gtk"),
    ("glib.h", "glib"),
];

pub(crate) fn conan_package(header: &str) -> Option<DetectedPackage> {
    CONAN_HEADERS
        .iter()
        .find(|(key, _)| {
            if key.ends_with('/') {
                header.starts_with(key)
            } else {
                header == *key
            }
        })
        .map(|(_, package)| DetectedPackage::new(Ecosystem::Conan, *package))
}

impl LanguagePlugin for CPlugin {
    fn id(&self) -> &'static str {
        "c"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".c", ".h"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        angle_includes(content)
    }

    fn is_std_lib(&self, module: &str) -> bool {
        is_c_std_header(module)
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        conan_package(module)
    }
}

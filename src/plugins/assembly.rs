use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, ImportEntry};

/// GAS and NASM/YASM assembly. Includes are recorded but never resolve to a
/// package.
pub struct AssemblyPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?m)^\s*(section|segment)\s+\.(text|data|bss)", 30),
        (r"(?m)^\s*\.(text|data|bss|globl|global|section)\b", 25),
        (r"(?mi)^\s*(mov|movq|movl|lea|push|pop|call|ret|jmp|xor|add|sub)\s+[\w%\[]", 25),
        (r"(?m)^\s*global\s+_?\w+", 10),
        (r"(?m)^[A-Za-z_.][\w.]*:\s*(;.*)?$", 10),
        (r"(?i)\b(rax|rbx|rsp|rbp|eax|esp|x0|x29|sp)\b", 10),
    ])
});

static GAS_INCLUDE: Lazy<Option<Regex>> = Lazy::new(|| pattern(r#"(?m)^\s*\.include\s+"([^"]+)""#));
static NASM_INCLUDE: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r#"(?m)^\s*%include\s+["'<]([^"'>]+)["'>]"#));

impl LanguagePlugin for AssemblyPlugin {
    fn id(&self) -> &'static str {
        "assembly"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".asm", ".s", ".nasm", ".inc"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let mut imports = super::capture_modules(&GAS_INCLUDE, content);
        imports.extend(super::capture_modules(&NASM_INCLUDE, content));
        imports
    }

    fn is_std_lib(&self, _module: &str) -> bool {
        false
    }

    fn map_to_package(&self, _module: &str) -> Option<DetectedPackage> {
        None
    }
}

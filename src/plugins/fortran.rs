use once_cell::sync::Lazy;
use regex::Regex;

use super::{pattern, score, signals, LanguagePlugin, Signal};
use crate::models::{DetectedPackage, Ecosystem, ImportEntry};

pub struct FortranPlugin;

static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
    signals(&[
        (r"(?mi)^\s*program\s+\w+\s*$", 25),
        (r"(?mi)^\s*end\s+(program|module|subroutine|function)\b", 25),
        (r"(?mi)^\s*implicit\s+none\b", 25),
        (r"(?mi)^\s*(subroutine|module)\s+\w+", 10),
        (r"(?mi)\b(integer|real|character|logical)\s*(\([^)]*\))?\s*(,\s*\w+(\([^)]*\))?)*\s*::", 20),
        (r"(?mi)^\s*use\s+\w+\s*(,\s*only\s*:.*)?$", 10),
    ])
});

static USE: Lazy<Option<Regex>> =
    Lazy::new(|| pattern(r"(?mi)^\s*use(?:\s*,\s*(?:intrinsic|non_intrinsic)\s*::|\s*::|\s)\s*(\w+)"));
static INCLUDE: Lazy<Option<Regex>> = Lazy::new(|| pattern(r#"(?mi)^\s*include\s+['"]([^'"]+)['"]"#));

const INTRINSIC: &[&str] = &[
    "iso_fortran_env", "iso_c_binding", "ieee_arithmetic", "ieee_exceptions", "ieee_features",
    "omp_lib", "omp_lib_kinds", "openacc",
];

/// Module names of common numerical libraries.
const KNOWN: &[(&str, &str)] = &[
    ("mpi", "mpi"),
    ("mpi_f08", "mpi"),
    ("netcdf", "netcdf-fortran"),
    ("hdf5", "hdf5"),
    ("fftw3", "fftw"),
    ("lapack95", "lapack"),
    ("blas95", "blas"),
    ("stdlib_kinds", "fortran-stdlib"),
    ("stdlib_io", "fortran-stdlib"),
    ("json_module", "json-fortran"),
    ("fpm", "fpm"),
];

impl LanguagePlugin for FortranPlugin {
    fn id(&self) -> &'static str {
        "fortran"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".f90", ".f95", ".f03", ".f08", ".f", ".for", ".f77"]
    }

    fn detect(&self, content: &str, filename: &str) -> u8 {
        score(filename, self.extensions(), content, &SIGNALS)
    }

    fn extract_imports(&self, content: &str) -> Vec<ImportEntry> {
        let mut imports = super::capture_modules(&USE, content);
        imports.extend(super::capture_modules(&INCLUDE, content));
        imports
    }

    fn is_std_lib(&self, module: &str) -> bool {
        INTRINSIC.contains(&module.to_lowercase().as_str())
    }

    fn map_to_package(&self, module: &str) -> Option<DetectedPackage> {
        let lower = module.to_lowercase();
        KNOWN
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, package)| DetectedPackage::new(Ecosystem::Generic, *package))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_imports() {
        let src = "program main\n  use, intrinsic :: iso_fortran_env\n  use mpi\n  use my_utils, only: helper\n  include 'mpif.h'\n  implicit none\nend program main\n";
        let modules: Vec<String> = FortranPlugin
            .extract_imports(src)
            .into_iter()
            .map(|i| i.module)
            .collect();
        assert_eq!(modules, vec!["iso_fortran_env", "mpi", "my_utils", "mpif.h"]);
    }

    #[test]
    fn test_is_std_lib() {
        assert!(FortranPlugin.is_std_lib("ISO_C_BINDING"));
        assert!(!FortranPlugin.is_std_lib("mpi"));
    }

    #[test]
    fn test_map_to_package() {
        assert_eq!(FortranPlugin.map_to_package("MPI").unwrap().purl, "pkg:generic/mpi");
        assert!(FortranPlugin.map_to_package("my_utils").is_none());
    }

    #[test]
    fn test_detect() {
        let src = "program hello\n  implicit none\n  integer :: i\n  print *, 'hi'\nend program hello\n";
        assert!(FortranPlugin.detect(src, "hello.f90") >= 90);
    }
}

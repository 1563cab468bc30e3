pub mod c;
pub mod cpp;
pub mod csharp;
pub mod java;
pub mod python;

/// Platform file name for a native executable
pub(crate) fn executable_name(stem: &str) -> String {
    format!("{}{}", stem, std::env::consts::EXE_SUFFIX)
}

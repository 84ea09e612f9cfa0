//! Preprocessor invocation (spec.md §6's "Preprocessor interface";
//! SPEC_FULL.md §12's "preprocessor invocation without a shell").
//!
//! Grounded on `original_source/cppstrtok.cpp`'s `oc_cpp_getfile`, which
//! builds `"/usr/bin/cpp -Da -Db ... file"` by string concatenation and
//! hands it to `popen`. Any `-D` value or filename containing shell
//! metacharacters turns that into a command-injection hazard. This
//! reimplementation keeps the exact external contract -- spawn `cpp` with
//! the given `-D` defines and filename, read its stdout, fail on a
//! non-zero exit -- via `std::process::Command`'s argument vector, which
//! never touches a shell. See DESIGN.md.

use std::process::{Command, Stdio};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CppError {
    #[error("failed to spawn preprocessor 'cpp': {0}")]
    Spawn(#[source] std::io::Error),
    #[error("preprocessor exited with status {0}")]
    NonZeroExit(i32),
    #[error("preprocessor output was not valid UTF-8")]
    InvalidUtf8,
}

/// Runs `cpp <-Ddef>* <file>` and returns its stdout as a `String`
/// (spec.md §6). `defines` are passed through verbatim, one `-D<def>`
/// argument each.
pub fn preprocess(file: &std::path::Path, defines: &[String]) -> Result<String, CppError> {
    let mut cmd = Command::new("cpp");
    for define in defines {
        cmd.arg(format!("-D{define}"));
    }
    cmd.arg(file);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::inherit());

    let output = cmd.output().map_err(CppError::Spawn)?;
    if !output.status.success() {
        return Err(CppError::NonZeroExit(output.status.code().unwrap_or(1)));
    }
    String::from_utf8(output.stdout).map_err(|_| CppError::InvalidUtf8)
}

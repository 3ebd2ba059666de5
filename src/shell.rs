//! Shell command builders for the pipeline's file and database steps.
//!
//! Paths are quoted with `shell-words`; command templates coming from the
//! config are trusted and passed through as written.

use shell_words::quote;

/// Exit 0 iff `path` is a regular file with non-zero size.
pub fn file_is_non_empty(path: &str) -> String {
    let path = quote(path);
    format!("test -f {} && test -s {}", path, path)
}

/// Exit 0 iff `path` is a regular file.
pub fn file_exists(path: &str) -> String {
    format!("test -f {}", quote(path))
}

/// Create `path` unless it already is a directory.
pub fn ensure_dir(path: &str) -> String {
    let path = quote(path);
    format!("test -d {} || mkdir -p {}", path, path)
}

pub fn remove_file(path: &str) -> String {
    format!("rm -f {}", quote(path))
}

/// Pipe a dump command through gzip into `path`.
pub fn export_to(export_command: &str, path: &str) -> String {
    format!("{} | gzip > {}", export_command.trim(), quote(path))
}

/// Stream a gzipped dump at `path` into an import command.
pub fn import_from(path: &str, import_command: &str) -> String {
    format!("gunzip -c {} | {}", quote(path), import_command.trim())
}

/// Wrap `command` for `bash -o pipefail`, so any failing stage of a pipeline
/// fails the whole command.
pub fn strict(command: &str) -> String {
    format!("bash -o pipefail -c {}", quote(command))
}

/// Print the path of `tool` if it is on `PATH`.
pub fn which(tool: &str) -> String {
    format!("command -v {}", quote(tool))
}

/// Join a directory and a file name with exactly one `/`.
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        return name.to_string();
    }
    format!("{}/{}", dir.trim_end_matches('/'), name.trim_start_matches('/'))
}

/// Quote a single argument for the shell.
pub fn arg(value: &str) -> String {
    quote(value).into_owned()
}

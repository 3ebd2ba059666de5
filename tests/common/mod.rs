//! In-memory two-host world for pipeline tests.
//!
//! Implements both collaborator traits over a map of files keyed by
//! `(host, path)` and one "database" per host. Dumps are stored as the raw
//! database bytes; compression is not simulated.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use dbsync::executor::{CommandExecutor, CommandOutput, RunOptions};
use dbsync::sync::Confirm;
use dbsync::transfer::TransferChannel;
use dbsync::{ExecutionContext, RemoteHost, SyncError, SyncResult};

pub const LOCAL: &str = "localhost";

/// What `gzip` leaves behind when its input is empty.
const GZIP_HEADER: &[u8] = &[0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03];

#[derive(Default)]
struct State {
    files: BTreeMap<(String, String), Vec<u8>>,
    dirs: BTreeSet<(String, String)>,
    databases: BTreeMap<String, Vec<u8>>,
    calls: Vec<String>,
}

/// Behaviour switches for failure scenarios.
#[derive(Debug, Clone, Default)]
pub struct Knobs {
    /// Exports write a zero-byte file
    pub empty_export: bool,
    /// Export tools exit non-zero after gzip has written its header
    pub failing_export: bool,
    /// Imports exit non-zero and leave the database untouched
    pub failing_import: bool,
    /// Transfers succeed but leave an empty copy
    pub truncating_transfer: bool,
    /// CSV printed by `db tables`; `None` makes the command fail
    pub tables_output: Option<String>,
}

#[derive(Default)]
pub struct FakeWorld {
    state: Mutex<State>,
    pub knobs: Knobs,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_knobs(knobs: Knobs) -> Self {
        Self {
            state: Mutex::default(),
            knobs,
        }
    }

    pub fn set_database(&self, host: &str, content: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .databases
            .insert(host.to_string(), content.to_vec());
    }

    pub fn database(&self, host: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().databases.get(host).cloned()
    }

    pub fn put_file(&self, host: &str, path: &str, content: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert((host.to_string(), path.to_string()), content.to_vec());
    }

    /// Every file on `host` as `(path, content)`.
    pub fn files_on(&self, host: &str) -> Vec<(String, Vec<u8>)> {
        self.state
            .lock()
            .unwrap()
            .files
            .iter()
            .filter(|((h, _), _)| h == host)
            .map(|((_, path), content)| (path.clone(), content.clone()))
            .collect()
    }

    pub fn has_dir(&self, host: &str, path: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .dirs
            .contains(&(host.to_string(), path.to_string()))
    }

    /// Commands and transfers in the order they ran, as `host: command`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_containing(&self, needle: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.contains(needle))
            .collect()
    }

    fn run(&self, host: &str, command: &str) -> (i32, String) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("{}: {}", host, command));

        if let Some((export, path)) = command.split_once(" | gzip > ") {
            let path = unquote(path);
            let mut dump = state.databases.get(host).cloned().unwrap_or_default();
            if let Some(tables) = export
                .split_whitespace()
                .find_map(|word| word.strip_prefix("--tables="))
            {
                dump = format!("-- tables {}\n", tables).into_bytes();
            }
            if self.knobs.empty_export {
                dump.clear();
            }
            if self.knobs.failing_export {
                state.files.insert(key(host, &path), GZIP_HEADER.to_vec());
                return (1, String::new());
            }
            state.files.insert(key(host, &path), dump);
            return (0, String::new());
        }

        if let Some(rest) = command.strip_prefix("gunzip -c ") {
            let Some((path, _)) = rest.split_once(" | ") else {
                return (2, String::new());
            };
            return match state.files.get(&key(host, &unquote(path))).cloned() {
                Some(_) if self.knobs.failing_import => (1, String::new()),
                Some(dump) => {
                    state.databases.insert(host.to_string(), dump);
                    (0, String::new())
                },
                None => (1, String::new()),
            };
        }

        if command.contains(" db tables ") {
            return match &self.knobs.tables_output {
                Some(csv) => (0, format!("{}\n", csv)),
                None => (1, String::new()),
            };
        }

        if command.contains(" search-replace ") {
            return (0, String::new());
        }

        let words = shell_words::split(command).unwrap_or_default();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        match words.as_slice() {
            ["test", "-f", path, "&&", "test", "-s", _] => {
                let ok = state
                    .files
                    .get(&key(host, path))
                    .is_some_and(|content| !content.is_empty());
                (if ok { 0 } else { 1 }, String::new())
            },
            ["test", "-f", path] => (
                if state.files.contains_key(&key(host, path)) { 0 } else { 1 },
                String::new(),
            ),
            ["test", "-d", path, "||", "mkdir", "-p", _] => {
                state.dirs.insert(key(host, path));
                (0, String::new())
            },
            ["rm", "-f", path] => {
                state.files.remove(&key(host, path));
                (0, String::new())
            },
            _ => (127, String::new()),
        }
    }

    fn copy(&self, from: (&str, &str), to: (&str, &str), verb: &str) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("{}: {} {} -> {}", from.0, verb, from.1, to.1));
        let content = state
            .files
            .get(&(from.0.to_string(), from.1.to_string()))
            .cloned()
            .ok_or_else(|| SyncError::TransferFailed {
                host: to.0.to_string(),
                path: from.1.to_string(),
                reason: "no such file".to_string(),
            })?;
        let content = if self.knobs.truncating_transfer {
            Vec::new()
        } else {
            content
        };
        state
            .files
            .insert((to.0.to_string(), to.1.to_string()), content);
        Ok(())
    }
}

fn key(host: &str, path: &str) -> (String, String) {
    (host.to_string(), path.to_string())
}

fn unquote(word: &str) -> String {
    shell_words::split(word.trim())
        .ok()
        .and_then(|mut words| words.pop())
        .unwrap_or_default()
}

#[async_trait]
impl CommandExecutor for FakeWorld {
    async fn execute(
        &self,
        context: &ExecutionContext,
        command: &str,
        options: &RunOptions,
    ) -> SyncResult<CommandOutput> {
        let host = context.to_string();
        let (status, stdout) = self.run(&host, command);
        if status != 0 && !options.no_throw {
            return Err(SyncError::CommandFailed {
                host,
                command: command.to_string(),
                status,
                stderr: String::new(),
            });
        }
        Ok(CommandOutput {
            status,
            stdout,
            stderr: String::new(),
        })
    }
}

#[async_trait]
impl TransferChannel for FakeWorld {
    async fn upload(&self, host: &RemoteHost, local: &str, remote: &str) -> SyncResult<()> {
        self.copy((LOCAL, local), (&host.hostname, remote), "upload")
    }

    async fn download(&self, host: &RemoteHost, remote: &str, local: &str) -> SyncResult<()> {
        self.copy((&host.hostname, remote), (LOCAL, local), "download")
    }
}

/// Answers every confirmation the same way and counts the questions.
pub struct Answer {
    pub yes: bool,
    pub asked: Mutex<Vec<String>>,
}

impl Answer {
    pub fn yes() -> Self {
        Self {
            yes: true,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn no() -> Self {
        Self {
            yes: false,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Confirm for Answer {
    fn confirm(&self, question: &str) -> SyncResult<bool> {
        self.asked.lock().unwrap().push(question.to_string());
        Ok(self.yes)
    }
}

//! In-memory stand-ins for the terminal and the pack generator.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use packshell_types::error::{Result, ShellError};

use crate::editor::{KeyBinding, LineSource, ReadOutcome};
use crate::interpreter::{CommandRegistry, Environment};
use crate::services::{ConfigEditor, PackagingApi, Services, SetupReport, UpdateChecker};

// ---------------------------------------------------------------------------
// Scripted line source
// ---------------------------------------------------------------------------

/// Replays a fixed sequence of reads, then reports end of input.
pub struct ScriptedLines {
    script: VecDeque<ReadOutcome>,
    history: Vec<String>,
    pub prompts: Rc<RefCell<Vec<String>>>,
    pub cleanups: Rc<Cell<usize>>,
    pub released: Rc<Cell<usize>>,
}

impl ScriptedLines {
    pub fn new(script: impl IntoIterator<Item = ReadOutcome>) -> Self {
        Self {
            script: script.into_iter().collect(),
            history: Vec::new(),
            prompts: Rc::new(RefCell::new(Vec::new())),
            cleanups: Rc::new(Cell::new(0)),
            released: Rc::new(Cell::new(0)),
        }
    }

    /// Script made only of complete lines.
    pub fn lines(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|l| ReadOutcome::Line(l.to_string())))
    }
}

impl LineSource for ScriptedLines {
    fn read_line(&mut self, prompt: &str) -> ReadOutcome {
        self.prompts.borrow_mut().push(prompt.to_string());
        let outcome = self.script.pop_front().unwrap_or(ReadOutcome::EndOfInput);
        if let ReadOutcome::Line(line) = &outcome
            && !line.trim().is_empty()
        {
            self.history.push(line.clone());
        }
        outcome
    }

    fn cleanup(&mut self) {
        self.cleanups.set(self.cleanups.get() + 1);
    }

    fn history(&self) -> Vec<String> {
        self.history.clone()
    }

    fn key_bindings(&self) -> Vec<KeyBinding> {
        vec![KeyBinding {
            keys: "Alt-S".to_string(),
            action: "tailtip-toggle".to_string(),
        }]
    }
}

impl Drop for ScriptedLines {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

// ---------------------------------------------------------------------------
// Fake pack generator
// ---------------------------------------------------------------------------

/// Observable state shared by the fake collaborators.
#[derive(Debug)]
pub struct FakeState {
    pub home: PathBuf,
    pub language: String,
    pub setup_calls: Vec<bool>,
    pub headless_runs: Vec<Option<PathBuf>>,
    pub update_report: String,
    pub update_checks: Vec<PathBuf>,
    pub edited: Vec<(PathBuf, String)>,
    /// Every collaborator call fails while set.
    pub fail: bool,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            home: PathBuf::from("/srv/packs"),
            language: "en_GB".to_string(),
            setup_calls: Vec::new(),
            headless_runs: Vec::new(),
            update_report: "No updates available.".to_string(),
            update_checks: Vec::new(),
            edited: Vec::new(),
            fail: false,
        }
    }
}

type Shared = Rc<RefCell<FakeState>>;

fn fail_if_broken(state: &Shared) -> Result<()> {
    if state.borrow().fail {
        return Err(ShellError::Command("backend unreachable".to_string()));
    }
    Ok(())
}

struct FakeApi(Shared);

impl PackagingApi for FakeApi {
    fn home_directory(&self) -> PathBuf {
        self.0.borrow().home.clone()
    }

    fn set_home_directory(&mut self, path: &Path) -> Result<PathBuf> {
        fail_if_broken(&self.0)?;
        self.0.borrow_mut().home = path.to_path_buf();
        Ok(path.to_path_buf())
    }

    fn language(&self) -> String {
        self.0.borrow().language.clone()
    }

    fn set_language(&mut self, locale: &str) -> Result<()> {
        fail_if_broken(&self.0)?;
        self.0.borrow_mut().language = locale.to_string();
        Ok(())
    }

    fn setup(&mut self, force: bool) -> Result<SetupReport> {
        fail_if_broken(&self.0)?;
        let mut state = self.0.borrow_mut();
        state.setup_calls.push(force);
        let mut report = SetupReport::default();
        if state.setup_calls.len() == 1 {
            report.created.push(state.home.join("work"));
        }
        if force {
            report.overwritten.push(state.home.join("serverpackcreator.conf"));
        }
        Ok(report)
    }

    fn run_headless(&mut self, config: Option<&Path>) -> Result<()> {
        fail_if_broken(&self.0)?;
        self.0
            .borrow_mut()
            .headless_runs
            .push(config.map(Path::to_path_buf));
        Ok(())
    }
}

struct FakeUpdates(Shared);

impl UpdateChecker for FakeUpdates {
    fn check(&mut self, home: &Path) -> Result<String> {
        fail_if_broken(&self.0)?;
        let mut state = self.0.borrow_mut();
        state.update_checks.push(home.to_path_buf());
        Ok(state.update_report.clone())
    }
}

struct FakeEditor(Shared);

impl ConfigEditor for FakeEditor {
    fn edit(&mut self, home: &Path, language: &str) -> Result<PathBuf> {
        fail_if_broken(&self.0)?;
        self.0
            .borrow_mut()
            .edited
            .push((home.to_path_buf(), language.to_string()));
        Ok(home.join("serverpackcreator.conf"))
    }
}

/// Services backed by one shared [`FakeState`].
pub fn fake_services() -> (Services, Shared) {
    let state: Shared = Rc::new(RefCell::new(FakeState::default()));
    let services = Services {
        api: Box::new(FakeApi(Rc::clone(&state))),
        updates: Box::new(FakeUpdates(Rc::clone(&state))),
        config_editor: Box::new(FakeEditor(Rc::clone(&state))),
    };
    (services, state)
}

// ---------------------------------------------------------------------------
// Environments and output
// ---------------------------------------------------------------------------

/// Run `f` with an environment that has no history and no key bindings.
pub fn with_env<R>(
    registry: &CommandRegistry,
    services: &mut Services,
    f: impl FnOnce(&mut Environment<'_>) -> R,
) -> R {
    with_session_env(registry, services, &[], &[], f)
}

pub fn with_session_env<R>(
    registry: &CommandRegistry,
    services: &mut Services,
    history: &[String],
    key_bindings: &[KeyBinding],
    f: impl FnOnce(&mut Environment<'_>) -> R,
) -> R {
    let mut env = Environment {
        registry,
        services,
        history,
        key_bindings,
    };
    f(&mut env)
}

/// Cloneable output sink, readable after the writer has been moved away.
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

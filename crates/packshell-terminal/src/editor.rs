//! Line editor: reading, completion, and the tail-tip hint.
//!
//! [`LineSource`] is what the session loop reads from. [`LineEditor`] is the
//! terminal-backed implementation built on rustyline; its [`ShellHelper`]
//! pulls completion candidates and hint text from the command registry.

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hint, Hinter};
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, CompletionType, ConditionalEventHandler, Config, Context, Editor, Event, EventContext,
    EventHandler, Helper, KeyEvent, RepeatCount,
};

use packshell_types::config::{EditMode, ShellConfig};
use packshell_types::error::{Result, ShellError};

use crate::interpreter::{ArgKind, CommandRegistry, ValueHint};
use crate::parser::{self, CompletionContext};

/// Result of one blocking read.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A complete line, without the trailing newline.
    Line(String),
    /// The user cancelled the line being edited.
    Interrupted,
    /// The user ended the session.
    EndOfInput,
    /// Reading failed. The session reports it and keeps going.
    Error(ShellError),
}

/// Source of input lines for the session loop.
pub trait LineSource {
    /// Block until the user finishes a line, cancels, or ends input.
    fn read_line(&mut self, prompt: &str) -> ReadOutcome;

    /// Drop transient state (completion caches) before the next read.
    fn cleanup(&mut self) {}

    /// Lines entered so far, oldest first.
    fn history(&self) -> Vec<String> {
        Vec::new()
    }

    /// Key bindings the user can rely on.
    fn key_bindings(&self) -> Vec<KeyBinding> {
        Vec::new()
    }
}

/// A documented key binding, as listed by `keymap`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub keys: String,
    pub action: String,
}

impl KeyBinding {
    fn new(keys: &str, action: &str) -> Self {
        Self {
            keys: keys.to_string(),
            action: action.to_string(),
        }
    }
}

/// Line editor settings, passed in explicitly rather than held globally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSettings {
    /// Completion candidate cap.
    pub list_max: usize,
    /// Initial tail-tip visibility.
    pub tail_tip: bool,
    pub edit_mode: EditMode,
    pub history_size: usize,
}

impl EditorSettings {
    pub fn from_config(config: &ShellConfig) -> Self {
        Self {
            list_max: config.list_max,
            tail_tip: config.tail_tip,
            edit_mode: config.edit_mode,
            history_size: config.history_size,
        }
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self::from_config(&ShellConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Completion and hints
// ---------------------------------------------------------------------------

/// A completion candidate. Cached between keystrokes of one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub display: String,
    pub replacement: String,
}

impl From<Pair> for Candidate {
    fn from(pair: Pair) -> Self {
        Self {
            display: pair.display,
            replacement: pair.replacement,
        }
    }
}

/// Inline usage hint. Display-only: accepting hints never inserts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailTip(String);

impl TailTip {
    pub fn text(&self) -> &str {
        &self.0
    }
}

impl Hint for TailTip {
    fn display(&self) -> &str {
        &self.0
    }

    fn completion(&self) -> Option<&str> {
        None
    }
}

type CompletionCache = Option<(String, usize, Vec<Candidate>)>;

/// rustyline helper backed by the command registry.
pub struct ShellHelper {
    registry: Rc<CommandRegistry>,
    list_max: usize,
    tail_tip: Arc<AtomicBool>,
    files: FilenameCompleter,
    cache: RefCell<CompletionCache>,
}

impl ShellHelper {
    pub fn new(registry: Rc<CommandRegistry>, list_max: usize, tail_tip: Arc<AtomicBool>) -> Self {
        Self {
            registry,
            list_max: list_max.max(1),
            tail_tip,
            files: FilenameCompleter::new(),
            cache: RefCell::new(None),
        }
    }

    /// Forget memoised candidates.
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().take();
    }

    /// Completion candidates for the word ending at `pos`, capped at
    /// `list_max`. Returns the byte offset the candidates replace from.
    pub fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<Candidate>) {
        let key = &line[..pos.min(line.len())];
        if let Some((cached_key, start, found)) = self.cache.borrow().as_ref()
            && cached_key == key
        {
            return (*start, found.clone());
        }

        let (start, mut found) = self.compute_candidates(line, pos);
        found.truncate(self.list_max);
        *self.cache.borrow_mut() = Some((key.to_string(), start, found.clone()));
        (start, found)
    }

    fn compute_candidates(&self, line: &str, pos: usize) -> (usize, Vec<Candidate>) {
        let ctx = parser::completion_context(line, pos);
        let Some(command_name) = ctx.preceding.first() else {
            return (ctx.start, self.command_candidates(&ctx.word));
        };
        let Some(cmd) = self.registry.resolve(command_name) else {
            return (ctx.start, Vec::new());
        };

        if ctx.word.starts_with('-') {
            let found = cmd
                .args()
                .iter()
                .filter(|a| a.kind == ArgKind::Flag && a.name.starts_with(ctx.word.as_str()))
                .filter(|a| !ctx.preceding.iter().any(|p| p == a.name))
                .map(|a| Candidate {
                    display: a.name.to_string(),
                    replacement: a.name.to_string(),
                })
                .collect();
            return (ctx.start, found);
        }

        let position = ctx.preceding[1..]
            .iter()
            .filter(|t| !t.starts_with('-'))
            .count();
        let Some(spec) = cmd
            .args()
            .iter()
            .filter(|a| a.kind == ArgKind::Positional)
            .nth(position)
        else {
            return (ctx.start, Vec::new());
        };

        match spec.hint {
            ValueHint::None => (ctx.start, Vec::new()),
            ValueHint::CommandName => (ctx.start, self.command_candidates(&ctx.word)),
            ValueHint::OneOf(values) => (ctx.start, matching(values.iter().copied(), &ctx.word)),
            ValueHint::Path => match self.files.complete_path(line, pos) {
                Ok((start, pairs)) => (start, pairs.into_iter().map(Candidate::from).collect()),
                Err(e) => {
                    log::debug!("Path completion failed: {e}");
                    (ctx.start, Vec::new())
                },
            },
        }
    }

    fn command_candidates(&self, partial: &str) -> Vec<Candidate> {
        self.registry
            .completions(partial)
            .into_iter()
            .map(|name| {
                let takes_args = self
                    .registry
                    .resolve(&name)
                    .is_some_and(|c| !c.args().is_empty());
                let replacement = if takes_args {
                    format!("{name} ")
                } else {
                    name.clone()
                };
                Candidate {
                    display: name,
                    replacement,
                }
            })
            .collect()
    }

    /// Hint for the line as typed, or `None` when hidden or not applicable.
    pub fn tail_tip(&self, line: &str, pos: usize) -> Option<TailTip> {
        if !self.tail_tip.load(Ordering::Relaxed) || pos < line.len() {
            return None;
        }
        let CompletionContext {
            word, preceding, ..
        } = parser::completion_context(line, pos);

        let (name, typing_name) = match preceding.first() {
            Some(name) => (name.as_str(), false),
            None => (word.as_str(), true),
        };
        let cmd = self.registry.resolve(name)?;

        if !typing_name && word.starts_with('-') {
            let flag = cmd.args().iter().find(|a| a.name == word)?;
            return Some(TailTip(format!("  {}", flag.description)));
        }

        let summary = self.registry.describe(name)?;
        let first = summary.lines().next()?;
        let sep = if line.ends_with(char::is_whitespace) {
            ""
        } else {
            "  "
        };
        Some(TailTip(format!("{sep}{first}")))
    }
}

fn matching<'v>(values: impl Iterator<Item = &'v str>, partial: &str) -> Vec<Candidate> {
    values
        .filter(|v| v.starts_with(partial))
        .map(|v| Candidate {
            display: v.to_string(),
            replacement: v.to_string(),
        })
        .collect()
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, found) = self.candidates(line, pos);
        let pairs = found
            .into_iter()
            .map(|c| Pair {
                display: c.display,
                replacement: c.replacement,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = TailTip;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<TailTip> {
        self.tail_tip(line, pos)
    }
}

impl Highlighter for ShellHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }
}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

/// Alt-S handler: flips tail-tip visibility and repaints.
struct TailTipToggle(Arc<AtomicBool>);

impl TailTipToggle {
    fn toggle(&self) -> Cmd {
        let was = self.0.fetch_xor(true, Ordering::Relaxed);
        log::debug!("Tail-tip {}", if was { "hidden" } else { "shown" });
        Cmd::Repaint
    }
}

impl ConditionalEventHandler for TailTipToggle {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        _ctx: &EventContext,
    ) -> Option<Cmd> {
        Some(self.toggle())
    }
}

// ---------------------------------------------------------------------------
// Terminal-backed editor
// ---------------------------------------------------------------------------

/// Terminal line editor. Owns the terminal for as long as it lives.
pub struct LineEditor {
    editor: Editor<ShellHelper, DefaultHistory>,
    edit_mode: EditMode,
}

impl LineEditor {
    /// Acquire the terminal and configure completion, hints and key bindings.
    pub fn new(registry: Rc<CommandRegistry>, settings: &EditorSettings) -> Result<Self> {
        let config = Config::builder()
            .max_history_size(settings.history_size)
            .and_then(|b| b.history_ignore_dups(true))
            .map_err(|e| ShellError::Resource(e.to_string()))?
            .auto_add_history(false)
            .completion_type(CompletionType::List)
            .completion_prompt_limit(settings.list_max)
            .edit_mode(match settings.edit_mode {
                EditMode::Emacs => rustyline::EditMode::Emacs,
                EditMode::Vi => rustyline::EditMode::Vi,
            })
            .build();

        let mut editor: Editor<ShellHelper, DefaultHistory> =
            Editor::with_config(config).map_err(|e| ShellError::Resource(e.to_string()))?;

        let tail_tip = Arc::new(AtomicBool::new(settings.tail_tip));
        editor.set_helper(Some(ShellHelper::new(
            registry,
            settings.list_max,
            Arc::clone(&tail_tip),
        )));
        editor.bind_sequence(
            KeyEvent::alt('s'),
            EventHandler::Conditional(Box::new(TailTipToggle(tail_tip))),
        );

        log::debug!("Line editor ready ({:?} mode)", settings.edit_mode);
        Ok(Self {
            editor,
            edit_mode: settings.edit_mode,
        })
    }
}

impl LineSource for LineEditor {
    fn read_line(&mut self, prompt: &str) -> ReadOutcome {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if worth_remembering(&line)
                    && let Err(e) = self.editor.add_history_entry(line.as_str())
                {
                    log::warn!("Failed to record history: {e}");
                }
                ReadOutcome::Line(line)
            },
            Err(ReadlineError::Interrupted) => ReadOutcome::Interrupted,
            Err(ReadlineError::Eof) => ReadOutcome::EndOfInput,
            Err(ReadlineError::Io(e)) => ReadOutcome::Error(ShellError::Io(e)),
            Err(e) => ReadOutcome::Error(ShellError::Command(format!("line editor: {e}"))),
        }
    }

    fn cleanup(&mut self) {
        if let Some(helper) = self.editor.helper() {
            helper.clear_cache();
        }
    }

    fn history(&self) -> Vec<String> {
        self.editor.history().iter().cloned().collect()
    }

    fn key_bindings(&self) -> Vec<KeyBinding> {
        default_key_bindings(self.edit_mode)
    }
}

/// Blank lines never reach history.
fn worth_remembering(line: &str) -> bool {
    !line.trim().is_empty()
}

/// Bindings documented for `keymap`.
pub fn default_key_bindings(mode: EditMode) -> Vec<KeyBinding> {
    let mut bindings = vec![
        KeyBinding::new("Tab", "complete"),
        KeyBinding::new("Alt-S", "tailtip-toggle"),
        KeyBinding::new("Ctrl-C", "abandon line"),
        KeyBinding::new("Ctrl-D", "end of input (on empty line)"),
        KeyBinding::new("Up / Down", "history previous / next"),
    ];
    match mode {
        EditMode::Emacs => bindings.extend([
            KeyBinding::new("Ctrl-A / Ctrl-E", "beginning / end of line"),
            KeyBinding::new("Ctrl-K", "kill to end of line"),
            KeyBinding::new("Ctrl-U", "kill to beginning of line"),
            KeyBinding::new("Ctrl-Y", "yank"),
            KeyBinding::new("Ctrl-R", "reverse history search"),
            KeyBinding::new("Ctrl-L", "clear screen"),
        ]),
        EditMode::Vi => bindings.extend([
            KeyBinding::new("Esc", "command mode"),
            KeyBinding::new("0 / $", "beginning / end of line (command mode)"),
            KeyBinding::new("D", "kill to end of line (command mode)"),
            KeyBinding::new("p", "yank (command mode)"),
        ]),
    }
    bindings
}

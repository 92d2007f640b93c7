//! The read-eval loop.
//!
//! A [`Session`] owns the line source, the registry and the collaborators for
//! its whole lifetime. Every iteration is independent: whatever goes wrong
//! while reading or dispatching one line is reported and the prompt comes
//! back. Only end of input (or `exit`) ends the loop.
//!
//! ```text
//! Starting -> Ready -> Reading -> Dispatching -> Ready -> ... -> Terminated
//! ```

use std::io::Write;
use std::rc::Rc;

use packshell_types::error::{Result, ShellError};

use crate::dispatch::{self, Dispatch};
use crate::editor::{LineSource, ReadOutcome};
use crate::interpreter::{CommandRegistry, Environment};
use crate::services::Services;

/// Where the loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Ready,
    Reading,
    Dispatching,
    Terminated,
}

/// One interactive session, from terminal acquisition to termination.
pub struct Session<L: LineSource, W: Write> {
    registry: Rc<CommandRegistry>,
    services: Services,
    source: L,
    prompt: String,
    out: W,
    state: SessionState,
}

impl<L: LineSource, W: Write> Session<L, W> {
    /// Build the session and acquire the line source.
    ///
    /// `acquire` receives the shared registry so the editor can complete
    /// against it. If it fails the session never reaches `Ready` and the
    /// error comes back as [`ShellError::Resource`].
    pub fn start<F>(
        registry: CommandRegistry,
        services: Services,
        prompt: impl Into<String>,
        out: W,
        acquire: F,
    ) -> Result<Self>
    where
        F: FnOnce(Rc<CommandRegistry>) -> Result<L>,
    {
        log::trace!("Session {:?}", SessionState::Starting);
        let registry = Rc::new(registry);
        let source = acquire(Rc::clone(&registry)).map_err(|e| match e {
            ShellError::Resource(_) => e,
            other => ShellError::Resource(other.to_string()),
        })?;
        log::info!("Session started with {} commands", registry.len());

        let mut session = Self {
            registry,
            services,
            source,
            prompt: prompt.into(),
            out,
            state: SessionState::Starting,
        };
        session.transition(SessionState::Ready);
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Run one Ready -> Reading -> (Dispatching) -> Ready iteration.
    pub fn step(&mut self) -> SessionState {
        if self.state == SessionState::Terminated {
            return self.state;
        }

        self.source.cleanup();
        self.transition(SessionState::Reading);

        let next = match self.source.read_line(&self.prompt) {
            ReadOutcome::Line(line) => {
                self.transition(SessionState::Dispatching);
                self.dispatch_line(&line)
            },
            ReadOutcome::Interrupted => {
                log::debug!("Line abandoned");
                SessionState::Ready
            },
            ReadOutcome::EndOfInput => SessionState::Terminated,
            ReadOutcome::Error(e) => {
                dispatch::report(&e, &mut self.out);
                SessionState::Ready
            },
        };
        self.transition(next);
        next
    }

    /// Loop until the session terminates, then release the line source.
    pub fn run(mut self) {
        while self.step() != SessionState::Terminated {}
        log::info!("Session ended");
    }

    fn dispatch_line(&mut self, line: &str) -> SessionState {
        let history = self.source.history();
        let key_bindings = self.source.key_bindings();
        let mut env = Environment {
            registry: &self.registry,
            services: &mut self.services,
            history: &history,
            key_bindings: &key_bindings,
        };
        match dispatch::dispatch(line, &mut env, &mut self.out) {
            Dispatch::Exit => SessionState::Terminated,
            Dispatch::Empty | Dispatch::Done | Dispatch::Failed(_) => SessionState::Ready,
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            log::trace!("Session {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

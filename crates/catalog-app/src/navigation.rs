// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;
use tracing::debug;

use crate::message::{REGISTERED, UPDATED};
use crate::{EditTarget, Message, Response, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Editing,
    Submitting,
    Done,
    ErrorRecoverable,
    ErrorFatal,
}

impl SubmitState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::ErrorFatal)
    }
}

/// How a finished submit resolved, with the text to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done(Message),
    Recoverable(Message),
    Fatal(Message),
}

impl Outcome {
    pub fn message(&self) -> &Message {
        match self {
            Self::Done(message) | Self::Recoverable(message) | Self::Fatal(message) => message,
        }
    }

    pub const fn state(&self) -> SubmitState {
        match self {
            Self::Done(_) => SubmitState::Done,
            Self::Recoverable(_) => SubmitState::ErrorRecoverable,
            Self::Fatal(_) => SubmitState::ErrorFatal,
        }
    }

    /// Where the user must go next; `None` keeps them on the form.
    pub const fn destination(&self) -> Option<Route> {
        match self {
            Self::Done(_) | Self::Fatal(_) => Some(Route::List),
            Self::Recoverable(_) => None,
        }
    }
}

/// Maps an insert/update reply to its outcome. A message with exactly 200 is
/// an input problem the user can fix in place; a message with any other 2xx
/// means the record can no longer be acted on.
pub fn classify(target: EditTarget, response: Response<Option<Message>>) -> Outcome {
    match response.body {
        None => Outcome::Done(Message::new(if target.is_new() {
            REGISTERED
        } else {
            UPDATED
        })),
        Some(message) if response.status == 200 => Outcome::Recoverable(message),
        Some(message) => Outcome::Fatal(message),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    InProgress,
    Finished(SubmitState),
    NotSubmitting,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => f.write_str("submit already in progress"),
            Self::Finished(state) => write!(f, "form already left the page ({state:?})"),
            Self::NotSubmitting => f.write_str("no submit is in progress"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Submit lifecycle of one edit page instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    target: EditTarget,
    state: SubmitState,
}

impl Navigator {
    pub fn new(target: EditTarget) -> Self {
        Self {
            target,
            state: SubmitState::Editing,
        }
    }

    pub fn target(&self) -> EditTarget {
        self.target
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn submit_enabled(&self) -> bool {
        self.state == SubmitState::Editing
    }

    /// Whether a submit may start now, without starting it.
    pub fn check_submit(&self) -> Result<(), SubmitError> {
        match self.state {
            SubmitState::Editing | SubmitState::ErrorRecoverable => Ok(()),
            SubmitState::Submitting => Err(SubmitError::InProgress),
            state => Err(SubmitError::Finished(state)),
        }
    }

    pub fn begin_submit(&mut self) -> Result<(), SubmitError> {
        self.check_submit()?;
        self.transition(SubmitState::Submitting);
        Ok(())
    }

    pub fn complete(&mut self, response: Response<Option<Message>>) -> Result<Outcome, SubmitError> {
        if self.state != SubmitState::Submitting {
            return Err(SubmitError::NotSubmitting);
        }
        let outcome = classify(self.target, response);
        self.transition(outcome.state());
        if outcome.state() == SubmitState::ErrorRecoverable {
            self.transition(SubmitState::Editing);
        }
        Ok(outcome)
    }

    /// The exchange failed before any reply arrived; the form stays usable.
    pub fn abort(&mut self) {
        if self.state == SubmitState::Submitting {
            self.transition(SubmitState::Editing);
        }
    }

    pub fn destination(&self) -> Option<Route> {
        self.state.is_terminal().then_some(Route::List)
    }

    fn transition(&mut self, next: SubmitState) {
        debug!(from = ?self.state, to = ?next, target = ?self.target, "submit state");
        self.state = next;
    }
}

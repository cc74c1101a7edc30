// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;
use tracing::debug;

pub const ERROR_GLYPH: &str = "❌";
pub const INFO_GLYPH: &str = "ℹ️";

pub const SESSION_EXPIRED: &str = "❌ セッションが切れました。ページを更新してください。";
pub const REGISTERED: &str = "ℹ️ 登録しました。";
pub const UPDATED: &str = "ℹ️ 更新しました。";
pub const DELETED: &str = "ℹ️ 削除しました。";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A user-facing line of text. Severity is never stored; consumers read it
/// off the leading glyph, so the text must be kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(String);

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn info(body: &str) -> Self {
        Self(format!("{INFO_GLYPH} {body}"))
    }

    pub fn error(body: &str) -> Self {
        Self(format!("{ERROR_GLYPH} {body}"))
    }

    /// Server reply text, where blank means "no message".
    pub fn from_reply(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text.to_owned()))
        }
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    pub fn severity(&self) -> Severity {
        let lead = self
            .0
            .trim_start_matches(|ch: char| ch.is_whitespace() || ch == '\u{fe0f}');
        if lead.starts_with(ERROR_GLYPH) {
            Severity::Error
        } else {
            Severity::Info
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sequence stamp handed out when a message-producing request starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// The single message slot. Every write replaces the previous text; replies
/// for anything but the most recently issued ticket are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageChannel {
    slot: Option<Message>,
    issued: u64,
}

impl MessageChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Message> {
        self.slot.as_ref()
    }

    pub fn text(&self) -> &str {
        self.slot.as_ref().map_or("", Message::text)
    }

    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Applies a reply if `ticket` is still the latest one. Returns whether
    /// the slot was written.
    pub fn deliver(&mut self, ticket: Ticket, message: Option<Message>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                ticket = ticket.0,
                latest = self.issued,
                "dropping reply for superseded request"
            );
            return false;
        }
        self.slot = message;
        true
    }

    /// Direct write from a local event; in-flight replies become stale.
    pub fn set(&mut self, message: Message) {
        self.issued += 1;
        self.slot = Some(message);
    }

    pub fn clear(&mut self) {
        self.issued += 1;
        self.slot = None;
    }

    /// Writes without touching the sequence, for notices that must show
    /// whichever request raised them.
    pub fn notify(&mut self, message: Message) {
        self.slot = Some(message);
    }
}

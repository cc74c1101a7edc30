// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;
use tracing::warn;

use crate::message::{ERROR_GLYPH, SESSION_EXPIRED};
use crate::{
    Company, ItemForm, ItemId, ItemSummary, Message, MessageChannel, SearchCriteria, Ticket,
};

/// Data, or the message the server sent instead of it.
pub type Reply<T> = std::result::Result<T, Message>;

/// A decoded 2xx response. The status is kept because submit handling
/// distinguishes 200 from the other success codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<T> {
    pub status: u16,
    pub body: T,
}

impl<T> Response<T> {
    pub const fn ok(body: T) -> Self {
        Self { status: 200, body }
    }

    pub const fn with_status(status: u16, body: T) -> Self {
        Self { status, body }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            body: f(self.body),
        }
    }
}

/// Why an exchange produced no usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Unauthorized { url: String },
    Status { status: u16, url: String },
    Connection { url: String, detail: String },
    Decode { url: String, detail: String },
}

impl TransportError {
    pub fn url(&self) -> &str {
        match self {
            Self::Unauthorized { url }
            | Self::Status { url, .. }
            | Self::Connection { url, .. }
            | Self::Decode { url, .. } => url,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Self::Unauthorized { .. } => "Request failed with status code 401".to_owned(),
            Self::Status { status, .. } => format!("Request failed with status code {status}"),
            Self::Connection { detail, .. } | Self::Decode { detail, .. } => detail.clone(),
        }
    }

    /// Text the global handler shows for this failure.
    pub fn notice(&self) -> Message {
        match self {
            Self::Unauthorized { .. } => Message::new(SESSION_EXPIRED),
            _ => Message::new(format!(
                "{ERROR_GLYPH} 処理できませんでした。 [{}] {}",
                self.detail(),
                self.url()
            )),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized { url } => write!(f, "session expired (401) calling {url}"),
            _ => write!(f, "request to {} failed: {}", self.url(), self.detail()),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Exchange<T> = std::result::Result<Response<T>, TransportError>;

/// The remote catalog API as the pages see it.
pub trait CatalogGateway {
    fn search(&mut self, criteria: &SearchCriteria) -> Exchange<Reply<Vec<ItemSummary>>>;
    fn count(&mut self, criteria: &SearchCriteria) -> Exchange<Option<Message>>;
    fn fetch_one(&mut self, id: ItemId) -> Exchange<Reply<ItemForm>>;
    fn fetch_companies(&mut self) -> Exchange<Vec<Company>>;
    fn validate(&mut self, form: &ItemForm) -> Exchange<Option<Message>>;
    fn insert(&mut self, form: &ItemForm) -> Exchange<Option<Message>>;
    fn update(&mut self, form: &ItemForm) -> Exchange<Option<Message>>;
    fn delete(&mut self, id: ItemId) -> Exchange<Option<Message>>;
}

impl<G: CatalogGateway + ?Sized> CatalogGateway for &mut G {
    fn search(&mut self, criteria: &SearchCriteria) -> Exchange<Reply<Vec<ItemSummary>>> {
        (**self).search(criteria)
    }

    fn count(&mut self, criteria: &SearchCriteria) -> Exchange<Option<Message>> {
        (**self).count(criteria)
    }

    fn fetch_one(&mut self, id: ItemId) -> Exchange<Reply<ItemForm>> {
        (**self).fetch_one(id)
    }

    fn fetch_companies(&mut self) -> Exchange<Vec<Company>> {
        (**self).fetch_companies()
    }

    fn validate(&mut self, form: &ItemForm) -> Exchange<Option<Message>> {
        (**self).validate(form)
    }

    fn insert(&mut self, form: &ItemForm) -> Exchange<Option<Message>> {
        (**self).insert(form)
    }

    fn update(&mut self, form: &ItemForm) -> Exchange<Option<Message>> {
        (**self).update(form)
    }

    fn delete(&mut self, id: ItemId) -> Exchange<Option<Message>> {
        (**self).delete(id)
    }
}

/// Global failure handler shared by every page. A failed exchange never
/// reaches page logic: its notice goes to the channel and the error is handed
/// back so the caller stops. Session expiry is always shown; other failures
/// only if `ticket` is still current.
pub fn intercept<T>(
    ticket: Ticket,
    exchange: Exchange<T>,
    channel: &mut MessageChannel,
) -> std::result::Result<Response<T>, TransportError> {
    exchange.map_err(|error| {
        warn!(%error, "catalog request failed");
        match &error {
            TransportError::Unauthorized { .. } => channel.notify(error.notice()),
            _ => {
                channel.deliver(ticket, Some(error.notice()));
            }
        }
        error
    })
}

#[cfg(test)]
mod tests {
    use super::{Response, TransportError, intercept};
    use crate::message::SESSION_EXPIRED;
    use crate::{Message, MessageChannel};

    #[test]
    fn unauthorized_notice_is_fixed_text() {
        for url in ["http://host/spa/search", "http://host/spa/insert"] {
            let error = TransportError::Unauthorized {
                url: url.to_owned(),
            };
            assert_eq!(error.notice().text(), SESSION_EXPIRED);
        }
    }

    #[test]
    fn generic_notice_carries_detail_and_url() {
        let error = TransportError::Status {
            status: 500,
            url: "http://host/spa/update".to_owned(),
        };
        assert_eq!(
            error.notice().text(),
            "❌ 処理できませんでした。 [Request failed with status code 500] http://host/spa/update"
        );
        assert!(error.notice().is_error());
    }

    #[test]
    fn intercept_writes_notice_and_fails() {
        let mut channel = MessageChannel::new();
        let ticket = channel.issue();
        let result = intercept::<()>(
            ticket,
            Err(TransportError::Connection {
                url: "http://host/spa/count".to_owned(),
                detail: "connection refused".to_owned(),
            }),
            &mut channel,
        );
        assert!(result.is_err());
        assert!(channel.text().contains("connection refused"));
    }

    #[test]
    fn intercept_passes_success_through_untouched() {
        let mut channel = MessageChannel::new();
        channel.set(Message::info("kept"));
        let ticket = channel.issue();
        let response = intercept(ticket, Ok(Response::with_status(202, 5)), &mut channel)
            .expect("success passes");
        assert_eq!(response, Response::with_status(202, 5));
        assert_eq!(channel.text(), "ℹ️ kept");
    }

    #[test]
    fn stale_failure_is_not_shown_but_expiry_is() {
        let mut channel = MessageChannel::new();
        let stale = channel.issue();
        let _fresh = channel.issue();

        let _ = intercept::<()>(
            stale,
            Err(TransportError::Status {
                status: 503,
                url: "http://host/spa/validate".to_owned(),
            }),
            &mut channel,
        );
        assert!(channel.current().is_none());

        let _ = intercept::<()>(
            stale,
            Err(TransportError::Unauthorized {
                url: "http://host/spa/validate".to_owned(),
            }),
            &mut channel,
        );
        assert_eq!(channel.text(), SESSION_EXPIRED);
    }
}

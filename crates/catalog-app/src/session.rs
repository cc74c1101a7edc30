// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::debug;

use crate::{MessageChannel, Route, SearchCriteria};

/// State shared by the pages of one browsing session: the search form, the
/// message slot and the current route. Pages borrow it; nothing is global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub criteria: SearchCriteria,
    pub messages: MessageChannel,
    route: Route,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            criteria: SearchCriteria::default(),
            messages: MessageChannel::new(),
            route: Route::List,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn navigate(&mut self, route: Route) {
        if self.route != route {
            debug!(from = %self.route, to = %route, "navigate");
        }
        self.route = route;
    }

    /// Full reload: search criteria and the message slot start over.
    pub fn reload(&mut self) {
        debug!("session reload");
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::{EditTarget, Message, Route};

    #[test]
    fn starts_on_list_with_empty_state() {
        let session = Session::new();
        assert_eq!(session.route(), Route::List);
        assert!(session.criteria.name.is_empty());
        assert!(session.messages.current().is_none());
    }

    #[test]
    fn criteria_survive_navigation_but_not_reload() {
        let mut session = Session::new();
        session.criteria.name = "Pro".to_owned();
        session.messages.set(Message::info("kept"));

        session.navigate(Route::Edit(EditTarget::New));
        session.navigate(Route::List);
        assert_eq!(session.criteria.name, "Pro");
        assert_eq!(session.messages.text(), "ℹ️ kept");

        session.reload();
        assert!(session.criteria.name.is_empty());
        assert!(session.messages.current().is_none());
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::message::DELETED;
use crate::{
    CatalogGateway, CriteriaField, Exchange, ItemId, ItemSummary, Message, Route, Session, Ticket,
    TransportError, intercept,
};

/// The search/list page: criteria live in the session, rows live here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    rows: Vec<ItemSummary>,
}

impl ListPage {
    /// Page entry lists with whatever criteria the session kept.
    pub fn enter<G: CatalogGateway>(session: &mut Session, gateway: &mut G) -> Result<Self> {
        session.navigate(Route::List);
        let mut page = Self::default();
        page.search(session, gateway)?;
        Ok(page)
    }

    pub fn rows(&self) -> &[ItemSummary] {
        &self.rows
    }

    pub fn search<G: CatalogGateway>(&mut self, session: &mut Session, gateway: &mut G) -> Result<()> {
        let ticket = session.messages.issue();
        let response = intercept(
            ticket,
            gateway.search(&session.criteria),
            &mut session.messages,
        )?;
        match response.body {
            Ok(rows) => {
                if session.messages.is_current(ticket) {
                    self.rows = rows;
                }
            }
            Err(message) => {
                session.messages.deliver(ticket, Some(message));
            }
        }
        Ok(())
    }

    /// Search button: drop the old message, then list.
    pub fn submit_search<G: CatalogGateway>(
        &mut self,
        session: &mut Session,
        gateway: &mut G,
    ) -> Result<()> {
        session.messages.clear();
        self.search(session, gateway)
    }

    /// Records a criteria keystroke and stamps the count request it causes.
    pub fn change_criterion(
        &self,
        session: &mut Session,
        field: CriteriaField,
        raw: &str,
    ) -> Result<Ticket> {
        session.criteria.set(field, raw)?;
        Ok(session.messages.issue())
    }

    pub fn apply_count(
        &self,
        session: &mut Session,
        ticket: Ticket,
        exchange: Exchange<Option<Message>>,
    ) -> std::result::Result<(), TransportError> {
        let response = intercept(ticket, exchange, &mut session.messages)?;
        session.messages.deliver(ticket, response.body);
        Ok(())
    }

    /// Live count echo for one criteria change.
    pub fn set_criterion<G: CatalogGateway>(
        &self,
        session: &mut Session,
        gateway: &mut G,
        field: CriteriaField,
        raw: &str,
    ) -> Result<()> {
        let ticket = self.change_criterion(session, field, raw)?;
        let exchange = gateway.count(&session.criteria);
        self.apply_count(session, ticket, exchange)?;
        Ok(())
    }

    /// Deletes one row, shows the server's text or the default notice, and
    /// lists again.
    pub fn delete<G: CatalogGateway>(
        &mut self,
        session: &mut Session,
        gateway: &mut G,
        id: ItemId,
    ) -> Result<()> {
        let ticket = session.messages.issue();
        let response = intercept(ticket, gateway.delete(id), &mut session.messages)?;
        let notice = response.body.unwrap_or_else(|| Message::new(DELETED));
        session.messages.set(notice);
        self.search(session, gateway)
    }
}

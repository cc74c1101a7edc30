// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use tracing::debug;

use crate::{
    CatalogGateway, Company, EditTarget, Exchange, FormField, ItemForm, Message, Navigator,
    Outcome, Route, Session, SubmitState, Ticket, TransportError, intercept,
};

/// Result of opening the edit page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Ready(EditPage),
    /// The record could not be loaded; the session already moved here and the
    /// server's text is in the message slot.
    Left(Route),
}

/// Result of pressing submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A required input is empty; nothing was sent.
    Blocked(FormField),
    Finished(Outcome),
}

/// The create/update page: the form being edited, the company choices and the
/// submit lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPage {
    form: ItemForm,
    companies: Vec<Company>,
    navigator: Navigator,
}

impl EditPage {
    /// Page entry. Companies are fetched once on every entry; the record only
    /// when editing an existing one.
    pub fn enter<G: CatalogGateway>(
        session: &mut Session,
        gateway: &mut G,
        target: EditTarget,
    ) -> Result<Entry> {
        session.navigate(Route::Edit(target));
        session.messages.clear();

        let ticket = session.messages.issue();
        let companies = intercept(ticket, gateway.fetch_companies(), &mut session.messages)?.body;

        let form = match target {
            EditTarget::New => ItemForm::default(),
            EditTarget::Existing(id) => {
                let ticket = session.messages.issue();
                let response = intercept(ticket, gateway.fetch_one(id), &mut session.messages)?;
                match response.body {
                    Ok(mut form) => {
                        form.id.get_or_insert(id);
                        form
                    }
                    Err(message) => {
                        debug!(%id, "record unavailable, leaving edit page");
                        session.messages.set(message);
                        session.navigate(Route::List);
                        return Ok(Entry::Left(Route::List));
                    }
                }
            }
        };

        Ok(Entry::Ready(Self {
            form,
            companies,
            navigator: Navigator::new(target),
        }))
    }

    pub fn form(&self) -> &ItemForm {
        &self.form
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn target(&self) -> EditTarget {
        self.navigator.target()
    }

    pub fn state(&self) -> SubmitState {
        self.navigator.state()
    }

    pub fn submit_enabled(&self) -> bool {
        self.navigator.submit_enabled()
    }

    /// Records one field change and stamps the validation request it causes.
    pub fn change_field(
        &mut self,
        session: &mut Session,
        field: FormField,
        raw: &str,
    ) -> Result<Ticket> {
        self.form.set(field, raw)?;
        Ok(session.messages.issue())
    }

    pub fn apply_validation(
        &self,
        session: &mut Session,
        ticket: Ticket,
        exchange: Exchange<Option<Message>>,
    ) -> std::result::Result<(), TransportError> {
        let response = intercept(ticket, exchange, &mut session.messages)?;
        session.messages.deliver(ticket, response.body);
        Ok(())
    }

    /// Live validation echo for one field change.
    pub fn set_field<G: CatalogGateway>(
        &mut self,
        session: &mut Session,
        gateway: &mut G,
        field: FormField,
        raw: &str,
    ) -> Result<()> {
        let ticket = self.change_field(session, field, raw)?;
        let exchange = gateway.validate(&self.form);
        self.apply_validation(session, ticket, exchange)?;
        Ok(())
    }

    pub fn submit<G: CatalogGateway>(
        &mut self,
        session: &mut Session,
        gateway: &mut G,
    ) -> Result<Submission> {
        self.navigator.check_submit()?;
        if let Some(field) = self.form.first_missing() {
            session
                .messages
                .set(Message::error(&format!("{}は必須です。", field.label())));
            return Ok(Submission::Blocked(field));
        }

        self.navigator.begin_submit()?;
        let ticket = session.messages.issue();
        let exchange = if self.target().is_new() {
            gateway.insert(&self.form)
        } else {
            gateway.update(&self.form)
        };
        let response = match intercept(ticket, exchange, &mut session.messages) {
            Ok(response) => response,
            Err(error) => {
                self.navigator.abort();
                return Err(error.into());
            }
        };

        let outcome = self.navigator.complete(response)?;
        session.messages.set(outcome.message().clone());
        if let Some(route) = outcome.destination() {
            session.navigate(route);
        }
        Ok(Submission::Finished(outcome))
    }
}

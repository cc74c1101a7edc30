// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use catalog_app::dates::format_date;
use catalog_app::{
    CatalogGateway, Company, CriteriaField, EditPage, EditTarget, Entry, FormField, ItemForm,
    ItemId, ItemSummary, ListPage, Session, Submission, TransportError, intercept,
};
use std::io::Write;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(Vec<(CriteriaField, String)>),
    Count(Vec<(CriteriaField, String)>),
    Companies,
    Show(ItemId),
    Create(Vec<(FormField, String)>),
    Update(ItemId, Vec<(FormField, String)>),
    Delete(ItemId),
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Search(_) => "search",
            Self::Count(_) => "count",
            Self::Companies => "companies",
            Self::Show(_) => "show",
            Self::Create(_) => "create",
            Self::Update(..) => "update",
            Self::Delete(_) => "delete",
        }
    }
}

/// Drives the pages the way a user at the browser would, one command at a
/// time, and prints what the pages would show.
pub struct Console<G> {
    session: Session,
    gateway: G,
}

impl<G: CatalogGateway> Console<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            session: Session::new(),
            gateway,
        }
    }

    /// Runs `command` and prints its output followed by the message line.
    /// Returns false when the command ended on an error message.
    pub fn run<W: Write>(&mut self, command: &Command, out: &mut W) -> Result<bool> {
        debug!(command = command.name(), "running");
        match self.dispatch(command, out) {
            Ok(()) => {}
            Err(error) if error.downcast_ref::<TransportError>().is_some() => {
                debug!(%error, "command stopped by failed request");
            }
            Err(error) => return Err(error),
        }

        let message = self.session.messages.current();
        if let Some(message) = message {
            writeln!(out, "{message}")?;
        }
        Ok(!message.is_some_and(|message| message.is_error()))
    }

    fn dispatch<W: Write>(&mut self, command: &Command, out: &mut W) -> Result<()> {
        match command {
            Command::Search(criteria) => {
                for (field, raw) in criteria {
                    self.session.criteria.set(*field, raw)?;
                }
                let page = ListPage::enter(&mut self.session, &mut self.gateway)?;
                write_rows(out, page.rows())?;
            }
            Command::Count(criteria) => {
                let page = ListPage::default();
                let mut ticket = self.session.messages.issue();
                for (field, raw) in criteria {
                    ticket = page.change_criterion(&mut self.session, *field, raw)?;
                }
                let exchange = self.gateway.count(&self.session.criteria);
                page.apply_count(&mut self.session, ticket, exchange)?;
            }
            Command::Companies => {
                let ticket = self.session.messages.issue();
                let companies = intercept(
                    ticket,
                    self.gateway.fetch_companies(),
                    &mut self.session.messages,
                )?
                .body;
                for company in &companies {
                    writeln!(out, "{}\t{}", company.id, company.company_name)?;
                }
            }
            Command::Show(id) => {
                if let Entry::Ready(page) = self.open(EditTarget::Existing(*id))? {
                    write_form(out, page.form(), page.companies())?;
                }
            }
            Command::Create(edits) => {
                if let Entry::Ready(page) = self.open(EditTarget::New)? {
                    self.edit_and_submit(page, edits, out)?;
                }
            }
            Command::Update(id, edits) => {
                if let Entry::Ready(page) = self.open(EditTarget::Existing(*id))? {
                    self.edit_and_submit(page, edits, out)?;
                }
            }
            Command::Delete(id) => {
                // Deleting starts from a loaded list, which also picks up the
                // anti-forgery cookie the POST needs.
                let mut page = ListPage::enter(&mut self.session, &mut self.gateway)?;
                page.delete(&mut self.session, &mut self.gateway, *id)?;
            }
        }
        Ok(())
    }

    fn open(&mut self, target: EditTarget) -> Result<Entry> {
        EditPage::enter(&mut self.session, &mut self.gateway, target)
    }

    fn edit_and_submit<W: Write>(
        &mut self,
        mut page: EditPage,
        edits: &[(FormField, String)],
        out: &mut W,
    ) -> Result<()> {
        for (field, raw) in edits {
            page.set_field(&mut self.session, &mut self.gateway, *field, raw)?;
        }
        match page.submit(&mut self.session, &mut self.gateway)? {
            Submission::Blocked(field) => {
                debug!(field = field.as_str(), "submit blocked locally");
            }
            Submission::Finished(outcome) => {
                debug!(state = ?outcome.state(), "submit finished");
                if outcome.destination().is_none() {
                    write_form(out, page.form(), page.companies())?;
                }
            }
        }
        Ok(())
    }
}

fn write_rows<W: Write>(out: &mut W, rows: &[ItemSummary]) -> Result<()> {
    for row in rows {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            row.id,
            row.name,
            format_date(row.release_date),
            if row.face_auth { "顔認証" } else { "-" },
            row.company_name.as_deref().unwrap_or("")
        )?;
    }
    Ok(())
}

fn write_form<W: Write>(out: &mut W, form: &ItemForm, companies: &[Company]) -> Result<()> {
    let company = form
        .company_id
        .and_then(|id| companies.iter().find(|company| company.id == id))
        .map(|company| company.company_name.as_str())
        .or(form.company_name.as_deref())
        .unwrap_or("");
    let id = form.id.map(|id| id.to_string()).unwrap_or_default();
    writeln!(out, "id\t{id}")?;
    writeln!(out, "{}\t{}", FormField::Name.label(), form.name)?;
    writeln!(
        out,
        "{}\t{}",
        FormField::ReleaseDate.label(),
        format_date(form.release_date)
    )?;
    writeln!(out, "{}\t{}", FormField::FaceAuth.label(), form.face_auth)?;
    writeln!(out, "{}\t{}", FormField::CompanyId.label(), company)?;
    Ok(())
}

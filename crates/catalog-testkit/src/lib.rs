// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use catalog_app::{
    CatalogGateway, Company, CompanyId, Exchange, ItemForm, ItemId, ItemSummary, Message, Reply,
    Response, SearchCriteria, TransportError,
};
use std::collections::{BTreeMap, VecDeque};
use time::{Date, Month};
use tracing::debug;

pub const MEMORY_BASE_URL: &str = "memory://catalog";

/// Status the server uses for "record is gone" replies.
pub const GONE_STATUS: u16 = 202;
pub const NOT_FOUND_TEXT: &str = "❌ 存在しません。";

const COMPANIES: [(i64, &str); 5] = [
    (1, "Apple"),
    (2, "Google"),
    (3, "Sony"),
    (4, "Samsung"),
    (5, "Sharp"),
];

const DEMO_ITEMS: [(&str, (i32, Month, u8), bool, i64); 6] = [
    ("iPhone 15 Pro", (2023, Month::September, 22), true, 1),
    ("iPhone SE", (2022, Month::March, 18), true, 1),
    ("Pixel 8 Pro", (2023, Month::October, 12), false, 2),
    ("Xperia 1 V", (2023, Month::July, 14), false, 3),
    ("Galaxy S24 Ultra", (2024, Month::January, 31), true, 4),
    ("AQUOS sense8", (2023, Month::November, 9), false, 5),
];

/// Which server-side validator to emulate. Both existed in the original
/// backend; `Classic` is the older, looser one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleSet {
    /// Name 1–30 chars, no `<>`, iPhone needs face auth, release day not 15.
    #[default]
    Classic,
    /// Name 10–25 chars, no `<>`, iPhone needs face auth, release day 10–19.
    Strict,
}

impl RuleSet {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Strict => "strict",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(Self::Classic),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }

    /// Server validation text for `form`, without the error glyph.
    pub fn check(self, form: &ItemForm) -> Option<String> {
        let name = form.name.as_str();
        if name.trim().is_empty() {
            return Some("製品名は必須です。".to_owned());
        }
        let length = name.chars().count();
        if self == Self::Classic && length > 30 {
            return Some(format!("製品名は 30 文字以内で入力してください。({length} 文字)"));
        }
        if let Some(index) = name.chars().position(|ch| ch == '<' || ch == '>') {
            return Some(match self {
                Self::Classic => "製品名に <> は使用できません。".to_owned(),
                Self::Strict => format!("製品名に <> は使用できません。({index} 文字目)"),
            });
        }
        if self == Self::Strict && !(10..=25).contains(&length) {
            return Some(format!(
                "製品名は 10 〜 25 文字で入力してください。(現在 {length} 文字)"
            ));
        }
        if name.to_lowercase().contains("iphone") && !form.face_auth {
            return Some("iPhone は顔認証を有効にしてください。".to_owned());
        }
        let day = form.release_date.map(Date::day);
        match (self, day) {
            (Self::Classic, Some(15)) => {
                Some("発売日は 15 日以外の日付を入力してください。".to_owned())
            }
            (Self::Strict, Some(day)) if !(10..=19).contains(&day) => {
                Some("発売日の日は 10 〜 19 日の範囲で入力してください。".to_owned())
            }
            _ => None,
        }
    }
}

/// One gateway call as the backend saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Search,
    Count,
    FetchOne(ItemId),
    FetchCompanies,
    Validate,
    Insert,
    Update,
    Delete(ItemId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Failure {
    Status(u16),
    Connection(String),
}

/// In-process stand-in for the catalog server, speaking the same reply
/// contract: 200 + text for input errors, 202 + text for missing records,
/// empty bodies on success.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    rules: RuleSet,
    companies: Vec<Company>,
    items: BTreeMap<ItemId, ItemForm>,
    next_id: i64,
    calls: Vec<Call>,
    failures: VecDeque<Failure>,
    scripted: VecDeque<(u16, String)>,
    session_expired: bool,
}

impl InMemoryCatalog {
    /// Companies seeded, no items.
    pub fn new() -> Self {
        Self {
            companies: COMPANIES
                .iter()
                .map(|(id, name)| Company {
                    id: CompanyId::new(*id),
                    company_name: (*name).to_owned(),
                })
                .collect(),
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn demo() -> Result<Self> {
        let mut catalog = Self::new();
        for (name, (year, month, day), face_auth, company) in DEMO_ITEMS {
            let release_date = Date::from_calendar_date(year, month, day)
                .with_context(|| format!("demo release date for {name}"))?;
            catalog.seed(ItemForm {
                id: None,
                name: name.to_owned(),
                release_date: Some(release_date),
                face_auth,
                company_id: Some(CompanyId::new(company)),
                company_name: None,
            });
        }
        Ok(catalog)
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Stores a record directly, bypassing validation and the call log.
    pub fn seed(&mut self, mut form: ItemForm) -> ItemId {
        let id = ItemId::new(self.next_id);
        self.next_id += 1;
        form.id = Some(id);
        form.company_name = self.company_name(form.company_id);
        self.items.insert(id, form);
        id
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemForm> {
        self.items.values()
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemForm> {
        self.items.get(&id)
    }

    /// Removes a record behind the client's back, as another user would.
    pub fn remove(&mut self, id: ItemId) -> Option<ItemForm> {
        self.items.remove(&id)
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn count_calls(&self, call: Call) -> usize {
        self.calls.iter().filter(|seen| **seen == call).count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// The next call fails with a non-2xx `status`.
    pub fn fail_next_with_status(&mut self, status: u16) {
        self.failures.push_back(Failure::Status(status));
    }

    /// The next call fails before any response arrives.
    pub fn fail_next_with_connection_error(&mut self, detail: &str) {
        self.failures.push_back(Failure::Connection(detail.to_owned()));
    }

    /// The next message-capable call answers `text` with `status` instead of
    /// doing its work. Company lookups ignore scripted replies.
    pub fn reply_next_with(&mut self, status: u16, text: &str) {
        self.scripted.push_back((status, text.to_owned()));
    }

    /// Every call from now on answers 401.
    pub fn expire_session(&mut self) {
        self.session_expired = true;
    }

    fn company_name(&self, id: Option<CompanyId>) -> Option<String> {
        let id = id?;
        self.companies
            .iter()
            .find(|company| company.id == id)
            .map(|company| company.company_name.clone())
    }

    fn matches(form: &ItemForm, criteria: &SearchCriteria) -> bool {
        let name_ok = criteria.name.trim().is_empty() || form.name.contains(criteria.name.trim());
        let date_ok = criteria.release_date.is_none() || form.release_date == criteria.release_date;
        name_ok && date_ok
    }

    fn matching(&self, criteria: &SearchCriteria) -> impl Iterator<Item = &ItemForm> {
        self.items
            .values()
            .filter(move |form| Self::matches(form, criteria))
    }

    fn rejection(&self, form: &ItemForm) -> Option<Message> {
        self.rules
            .check(form)
            .map(|text| Message::error(&text))
    }

    fn scripted(&mut self) -> Option<Response<Message>> {
        self.scripted
            .pop_front()
            .map(|(status, text)| Response::with_status(status, Message::new(text)))
    }

    fn gone() -> Response<Option<Message>> {
        Response::with_status(GONE_STATUS, Some(Message::new(NOT_FOUND_TEXT)))
    }

    fn exchange<T>(
        &mut self,
        call: Call,
        endpoint: &str,
        handle: impl FnOnce(&mut Self) -> Response<T>,
    ) -> Exchange<T> {
        self.calls.push(call);
        let url = format!("{MEMORY_BASE_URL}/{endpoint}");
        if self.session_expired {
            return Err(TransportError::Unauthorized { url });
        }
        match self.failures.pop_front() {
            Some(Failure::Status(401)) => Err(TransportError::Unauthorized { url }),
            Some(Failure::Status(status)) => Err(TransportError::Status { status, url }),
            Some(Failure::Connection(detail)) => Err(TransportError::Connection { url, detail }),
            None => {
                let response = handle(self);
                debug!(?call, status = response.status, "in-memory exchange");
                Ok(response)
            }
        }
    }
}

impl CatalogGateway for InMemoryCatalog {
    fn search(&mut self, criteria: &SearchCriteria) -> Exchange<Reply<Vec<ItemSummary>>> {
        self.exchange(Call::Search, "search", |catalog| {
            if let Some(scripted) = catalog.scripted() {
                return scripted.map(Err);
            }
            let rows = catalog
                .matching(criteria)
                .filter_map(|form| {
                    Some(ItemSummary {
                        id: form.id?,
                        name: form.name.clone(),
                        release_date: form.release_date,
                        face_auth: form.face_auth,
                        company_name: form.company_name.clone(),
                    })
                })
                .collect();
            Response::ok(Ok(rows))
        })
    }

    fn count(&mut self, criteria: &SearchCriteria) -> Exchange<Option<Message>> {
        self.exchange(Call::Count, "count", |catalog| {
            if let Some(scripted) = catalog.scripted() {
                return scripted.map(Some);
            }
            let count = catalog.matching(criteria).count();
            Response::ok(Some(Message::new(format!("結果予想件数: {count} 件"))))
        })
    }

    fn fetch_one(&mut self, id: ItemId) -> Exchange<Reply<ItemForm>> {
        self.exchange(Call::FetchOne(id), "select", |catalog| {
            if let Some(scripted) = catalog.scripted() {
                return scripted.map(Err);
            }
            match catalog.items.get(&id) {
                Some(form) => Response::ok(Ok(form.clone())),
                None => Response::with_status(GONE_STATUS, Err(Message::new(NOT_FOUND_TEXT))),
            }
        })
    }

    fn fetch_companies(&mut self) -> Exchange<Vec<Company>> {
        self.exchange(Call::FetchCompanies, "select-company", |catalog| {
            Response::ok(catalog.companies.clone())
        })
    }

    fn validate(&mut self, form: &ItemForm) -> Exchange<Option<Message>> {
        self.exchange(Call::Validate, "validate", |catalog| {
            if let Some(scripted) = catalog.scripted() {
                return scripted.map(Some);
            }
            Response::ok(catalog.rejection(form))
        })
    }

    fn insert(&mut self, form: &ItemForm) -> Exchange<Option<Message>> {
        self.exchange(Call::Insert, "insert", |catalog| {
            if let Some(scripted) = catalog.scripted() {
                return scripted.map(Some);
            }
            if let Some(message) = catalog.rejection(form) {
                return Response::ok(Some(message));
            }
            catalog.seed(form.clone());
            Response::ok(None)
        })
    }

    fn update(&mut self, form: &ItemForm) -> Exchange<Option<Message>> {
        self.exchange(Call::Update, "update", |catalog| {
            if let Some(scripted) = catalog.scripted() {
                return scripted.map(Some);
            }
            if let Some(message) = catalog.rejection(form) {
                return Response::ok(Some(message));
            }
            let Some(id) = form.id.filter(|id| catalog.items.contains_key(id)) else {
                return Self::gone();
            };
            let mut stored = form.clone();
            stored.company_name = catalog.company_name(stored.company_id);
            catalog.items.insert(id, stored);
            Response::ok(None)
        })
    }

    fn delete(&mut self, id: ItemId) -> Exchange<Option<Message>> {
        self.exchange(Call::Delete(id), "delete", |catalog| {
            if let Some(scripted) = catalog.scripted() {
                return scripted.map(Some);
            }
            match catalog.items.remove(&id) {
                Some(_) => Response::ok(None),
                None => Self::gone(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Call, InMemoryCatalog, RuleSet};
    use catalog_app::{CatalogGateway, ItemForm, SearchCriteria};
    use time::{Date, Month};

    fn form(name: &str, day: u8, face_auth: bool) -> ItemForm {
        ItemForm {
            name: name.to_owned(),
            release_date: Some(
                Date::from_calendar_date(2024, Month::March, day).expect("valid date"),
            ),
            face_auth,
            ..ItemForm::default()
        }
    }

    #[test]
    fn classic_rules_match_older_validator() {
        let rules = RuleSet::Classic;
        assert_eq!(rules.check(&form("Widget", 1, false)), None);
        assert_eq!(
            rules.check(&form("", 1, false)).as_deref(),
            Some("製品名は必須です。")
        );
        assert!(rules.check(&form("a<b", 1, false)).is_some());
        assert!(rules.check(&form("iphone mini", 1, false)).is_some());
        assert!(rules.check(&form("Widget", 15, false)).is_some());
        assert!(rules.check(&form(&"x".repeat(31), 1, false)).is_some());
    }

    #[test]
    fn rule_set_names_parse_case_insensitively() {
        assert_eq!(RuleSet::parse("Strict"), Some(RuleSet::Strict));
        assert_eq!(RuleSet::parse(RuleSet::Classic.as_str()), Some(RuleSet::Classic));
        assert_eq!(RuleSet::parse("lenient"), None);
    }

    #[test]
    fn strict_rules_match_newer_validator() {
        let rules = RuleSet::Strict;
        assert_eq!(
            rules.check(&form("Widget", 12, false)).as_deref(),
            Some("製品名は 10 〜 25 文字で入力してください。(現在 6 文字)")
        );
        assert_eq!(
            rules.check(&form("Widget <b>", 12, false)).as_deref(),
            Some("製品名に <> は使用できません。(7 文字目)")
        );
        assert_eq!(
            rules.check(&form("Widget Pro X", 1, false)).as_deref(),
            Some("発売日の日は 10 〜 19 日の範囲で入力してください。")
        );
        assert_eq!(rules.check(&form("Widget Pro X", 12, false)), None);
        assert_eq!(
            rules.check(&form("iPhone 15 Pro", 12, false)).as_deref(),
            Some("iPhone は顔認証を有効にしてください。")
        );
    }

    #[test]
    fn demo_catalog_is_searchable() {
        let mut catalog = InMemoryCatalog::demo().expect("demo data");
        let criteria = SearchCriteria {
            name: "iPhone".to_owned(),
            release_date: None,
        };
        let rows = catalog
            .search(&criteria)
            .expect("search succeeds")
            .body
            .expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].company_name.as_deref(), Some("Apple"));
        assert_eq!(catalog.calls(), &[Call::Search]);
    }

    #[test]
    fn injected_failures_are_consumed_in_order() {
        let mut catalog = InMemoryCatalog::new();
        catalog.fail_next_with_status(500);
        assert!(catalog.fetch_companies().is_err());
        assert!(catalog.fetch_companies().is_ok());
        assert_eq!(catalog.count_calls(Call::FetchCompanies), 2);
    }
}

// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use url::form_urlencoded;

use crate::dates::format_date;
use crate::{CriteriaField, FormField, ItemForm, ItemId, SearchCriteria};

/// Ordered request parameters. The same value feeds a GET query string and a
/// POST form body, so key order is part of the contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.pairs.push((key, value.into()));
        self
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pairs.iter().map(|(key, _)| *key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded`, spaces as `+`.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

pub trait ToQuery {
    fn to_query(&self) -> QueryParams;
}

impl ToQuery for SearchCriteria {
    fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .with(CriteriaField::Name.as_str(), self.name.clone())
            .with(
                CriteriaField::ReleaseDate.as_str(),
                format_date(self.release_date),
            )
    }
}

impl ToQuery for ItemForm {
    fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .with("id", self.id.map(|id| id.to_string()).unwrap_or_default())
            .with(FormField::Name.as_str(), self.name.clone())
            .with(FormField::ReleaseDate.as_str(), format_date(self.release_date))
            .with(FormField::FaceAuth.as_str(), self.face_auth.to_string())
            .with(
                FormField::CompanyId.as_str(),
                self.company_id.map(|id| id.to_string()).unwrap_or_default(),
            )
    }
}

pub fn id_query(id: ItemId) -> QueryParams {
    QueryParams::new().with("id", id.to_string())
}

#[cfg(test)]
mod tests {
    use super::{QueryParams, ToQuery, id_query};
    use crate::{CompanyId, ItemForm, ItemId, SearchCriteria};
    use time::{Date, Month};

    #[test]
    fn empty_criteria_keep_every_key() {
        let query = SearchCriteria::default().to_query();
        assert_eq!(query.keys().collect::<Vec<_>>(), vec!["name", "releaseDate"]);
        assert_eq!(query.to_query_string(), "name=&releaseDate=");
    }

    #[test]
    fn criteria_encode_like_a_browser_form() {
        let criteria = SearchCriteria {
            name: "Pro Max & mini".to_owned(),
            release_date: Some(
                Date::from_calendar_date(2022, Month::September, 11).expect("valid date"),
            ),
        };
        assert_eq!(
            criteria.to_query().to_query_string(),
            "name=Pro+Max+%26+mini&releaseDate=2022-09-11"
        );
    }

    #[test]
    fn item_form_order_is_fixed() {
        let form = ItemForm {
            id: Some(ItemId::new(8)),
            name: "Widget".to_owned(),
            release_date: Some(
                Date::from_calendar_date(2024, Month::January, 1).expect("valid date"),
            ),
            face_auth: true,
            company_id: Some(CompanyId::new(3)),
            company_name: Some("ignored".to_owned()),
        };
        let query = form.to_query();
        assert_eq!(
            query.keys().collect::<Vec<_>>(),
            vec!["id", "name", "releaseDate", "faceAuth", "companyId"]
        );
        assert_eq!(
            query.to_query_string(),
            "id=8&name=Widget&releaseDate=2024-01-01&faceAuth=true&companyId=3"
        );
    }

    #[test]
    fn new_form_sends_empty_values() {
        let query = ItemForm::default().to_query();
        assert_eq!(query.get("id"), Some(""));
        assert_eq!(query.get("faceAuth"), Some("false"));
        assert_eq!(query.get("companyId"), Some(""));
        assert_eq!(query.get("missing"), None);
    }

    #[test]
    fn id_query_has_single_key() {
        assert_eq!(id_query(ItemId::new(42)).to_query_string(), "id=42");
        assert!(QueryParams::new().is_empty());
    }
}

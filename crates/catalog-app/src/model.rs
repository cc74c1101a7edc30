// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;
use time::Date;

use crate::dates::{self, DateResult};
use crate::ids::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,
    pub company_name: String,
}

/// One row of the search result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "dates::optional_date")]
    pub release_date: Option<Date>,
    #[serde(default)]
    pub face_auth: bool,
    #[serde(default)]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaField {
    Name,
    ReleaseDate,
}

impl CriteriaField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::ReleaseDate => "releaseDate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(Self::Name),
            "releaseDate" => Some(Self::ReleaseDate),
            _ => None,
        }
    }
}

/// Search form state. Lives in the session so it survives list re-entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub name: String,
    pub release_date: Option<Date>,
}

impl SearchCriteria {
    pub fn set(&mut self, field: CriteriaField, raw: &str) -> DateResult<()> {
        match field {
            CriteriaField::Name => self.name = raw.to_owned(),
            CriteriaField::ReleaseDate => self.release_date = dates::parse_optional_date(raw)?,
        }
        Ok(())
    }
}

/// What the edit page was opened for. Route id `0` is the "new item" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    New,
    Existing(ItemId),
}

impl EditTarget {
    pub const NEW_SENTINEL: i64 = 0;

    pub fn from_route_id(id: i64) -> Self {
        if id == Self::NEW_SENTINEL {
            Self::New
        } else {
            Self::Existing(ItemId::new(id))
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse::<i64>().ok().map(Self::from_route_id)
    }

    pub const fn is_new(self) -> bool {
        matches!(self, Self::New)
    }

    pub const fn route_id(self) -> i64 {
        match self {
            Self::New => Self::NEW_SENTINEL,
            Self::Existing(id) => id.get(),
        }
    }
}

/// Hash routes of the single-page front end: `#/` and `#/edit/<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    List,
    Edit(EditTarget),
}

impl Route {
    pub fn parse(hash: &str) -> Option<Self> {
        let path = hash.trim_start_matches('#');
        let path = path.trim_end_matches('/');
        if path.is_empty() {
            return Some(Self::List);
        }
        let id = path.strip_prefix("/edit/")?;
        EditTarget::parse(id).map(Self::Edit)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("#/"),
            Self::Edit(target) => write!(f, "#/edit/{}", target.route_id()),
        }
    }
}

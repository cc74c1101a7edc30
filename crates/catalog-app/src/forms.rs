// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::dates;
use crate::{CompanyId, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    ReleaseDate,
    FaceAuth,
    CompanyId,
}

impl FormField {
    pub const REQUIRED: [Self; 2] = [Self::Name, Self::ReleaseDate];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::ReleaseDate => "releaseDate",
            Self::FaceAuth => "faceAuth",
            Self::CompanyId => "companyId",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(Self::Name),
            "releaseDate" => Some(Self::ReleaseDate),
            "faceAuth" => Some(Self::FaceAuth),
            "companyId" => Some(Self::CompanyId),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "製品名",
            Self::ReleaseDate => "発売日",
            Self::FaceAuth => "顔認証",
            Self::CompanyId => "メーカー",
        }
    }
}

/// The editable product record, in the shape the select/insert/update
/// endpoints exchange it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemForm {
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "dates::optional_date")]
    pub release_date: Option<Date>,
    #[serde(default)]
    pub face_auth: bool,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

impl ItemForm {
    /// Applies one keystroke-level change. Only the touched field moves.
    pub fn set(&mut self, field: FormField, raw: &str) -> Result<()> {
        match field {
            FormField::Name => self.name = raw.to_owned(),
            FormField::ReleaseDate => {
                self.release_date = dates::parse_optional_date(raw)?;
            }
            FormField::FaceAuth => self.face_auth = parse_flag(raw)?,
            FormField::CompanyId => {
                let trimmed = raw.trim();
                self.company_id = if trimmed.is_empty() {
                    None
                } else {
                    match trimmed.parse::<i64>() {
                        Ok(id) => Some(CompanyId::new(id)),
                        Err(_) => bail!("company id {raw:?} is not a number -- pick a listed company"),
                    }
                };
            }
        }
        Ok(())
    }

    /// First required input left empty, in form order. Submission is blocked
    /// locally while this returns `Some`.
    pub fn first_missing(&self) -> Option<FormField> {
        FormField::REQUIRED.into_iter().find(|field| match field {
            FormField::Name => self.name.trim().is_empty(),
            FormField::ReleaseDate => self.release_date.is_none(),
            FormField::FaceAuth | FormField::CompanyId => false,
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim() {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" | "" => Ok(false),
        other => bail!("face auth flag {other:?} must be true or false"),
    }
}

#[cfg(test)]
mod tests {
    use super::{FormField, ItemForm};
    use crate::{CompanyId, ItemId};
    use time::{Date, Month};

    #[test]
    fn blank_form_reports_name_first() {
        let form = ItemForm::default();
        assert_eq!(form.first_missing(), Some(FormField::Name));
    }

    #[test]
    fn whitespace_name_counts_as_missing() {
        let mut form = ItemForm::default();
        form.set(FormField::Name, "   ").expect("name accepted");
        form.set(FormField::ReleaseDate, "2024-01-01")
            .expect("date accepted");
        assert_eq!(form.first_missing(), Some(FormField::Name));
    }

    #[test]
    fn missing_release_date_is_reported() {
        let mut form = ItemForm::default();
        form.set(FormField::Name, "Widget").expect("name accepted");
        assert_eq!(form.first_missing(), Some(FormField::ReleaseDate));
    }

    #[test]
    fn set_touches_only_named_field() {
        let mut form = ItemForm {
            id: Some(ItemId::new(3)),
            name: "Galaxy S24 Ultra".to_owned(),
            ..ItemForm::default()
        };
        form.set(FormField::FaceAuth, "on").expect("flag accepted");
        form.set(FormField::CompanyId, "2").expect("company accepted");

        assert_eq!(form.id, Some(ItemId::new(3)));
        assert_eq!(form.name, "Galaxy S24 Ultra");
        assert!(form.face_auth);
        assert_eq!(form.company_id, Some(CompanyId::new(2)));
        assert_eq!(form.first_missing(), Some(FormField::ReleaseDate));
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut form = ItemForm::default();
        assert!(form.set(FormField::ReleaseDate, "tomorrow").is_err());
        assert!(form.set(FormField::CompanyId, "apple").is_err());
        assert!(form.set(FormField::FaceAuth, "maybe").is_err());
    }

    #[test]
    fn decodes_server_json() {
        let form: ItemForm = serde_json::from_str(
            r#"{"id":9,"name":"iPhone 15 Pro","releaseDate":"2023-09-12","faceAuth":true,"companyId":1,"companyName":"Apple"}"#,
        )
        .expect("item json");
        assert_eq!(form.id, Some(ItemId::new(9)));
        assert_eq!(
            form.release_date,
            Some(Date::from_calendar_date(2023, Month::September, 12).expect("valid date"))
        );
        assert_eq!(form.company_id, Some(CompanyId::new(1)));
        assert_eq!(form.first_missing(), None);
    }
}

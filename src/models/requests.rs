//! Create-request payloads and their normalisation.
//!
//! Each `validate` trims text, applies length limits and returns the cleaned
//! value, so repositories only ever see well-formed input.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::package::validate_package_digits;
use super::profile::validate_email;
use super::{Priority, ReportType, TicketType};
use crate::constants::{
    MAX_BODY_LENGTH, MAX_COMMENT_LENGTH, MAX_TITLE_LENGTH, MIN_PASSWORD_LENGTH, MIN_POLL_OPTIONS,
};
use crate::error::{AppError, Result};
use crate::validation::{clean_tags, optional_text, required_text};

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub user_name: String,
    pub building_address: String,
    #[serde(default)]
    pub unit_number: String,
}

impl NewAccount {
    pub fn validate(self) -> Result<Self> {
        let email = self.email.trim().to_lowercase();
        if !validate_email(&email) {
            return Err(AppError::invalid("A valid email address is required"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::invalid(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        Ok(Self {
            email,
            password: self.password,
            user_name: required_text("Name", &self.user_name, 100)?,
            building_address: required_text("Building", &self.building_address, 200)?,
            unit_number: self.unit_number.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub post_name: String,
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_category() -> String {
    "general".to_string()
}

impl NewPost {
    pub fn validate(self) -> Result<Self> {
        Ok(Self {
            post_name: required_text("Title", &self.post_name, MAX_TITLE_LENGTH)?,
            content: required_text("Content", &self.content, MAX_BODY_LENGTH)?,
            category: required_text("Category", &self.category, 50)?.to_lowercase(),
            tags: clean_tags(&self.tags)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl NewComment {
    pub fn validate(self) -> Result<Self> {
        Ok(Self {
            content: required_text("Comment", &self.content, MAX_COMMENT_LENGTH)?,
            parent_id: self.parent_id.filter(|p| !p.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPackageReport {
    pub report_type: ReportType,
    pub item_description: String,
    pub location_found: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub package_digits: Option<String>,
    #[serde(default)]
    pub is_food: bool,
    #[serde(default)]
    pub additional_notes: Option<String>,
}

impl NewPackageReport {
    pub fn validate(self) -> Result<Self> {
        let package_digits = optional_text("Package digits", self.package_digits.as_deref(), 8)?;
        if let Some(digits) = &package_digits {
            if !validate_package_digits(digits) {
                return Err(AppError::invalid("Package digits must be 1-8 digits"));
            }
        }
        Ok(Self {
            report_type: self.report_type,
            item_description: required_text(
                "Description",
                &self.item_description,
                MAX_TITLE_LENGTH,
            )?,
            location_found: required_text("Location", &self.location_found, MAX_TITLE_LENGTH)?,
            tags: clean_tags(&self.tags)?,
            package_digits,
            is_food: self.is_food,
            additional_notes: optional_text(
                "Notes",
                self.additional_notes.as_deref(),
                MAX_BODY_LENGTH,
            )?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub event_name: String,
    #[serde(default)]
    pub host_organization: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub description: String,
}

impl NewEvent {
    pub fn validate(self) -> Result<Self> {
        if self.end_time < self.start_time {
            return Err(AppError::invalid("Event cannot end before it starts"));
        }
        Ok(Self {
            event_name: required_text("Event name", &self.event_name, MAX_TITLE_LENGTH)?,
            host_organization: self.host_organization.trim().to_string(),
            start_time: self.start_time,
            end_time: self.end_time,
            location: required_text("Location", &self.location, MAX_TITLE_LENGTH)?,
            description: self.description.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPollOption {
    pub option_text: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPoll {
    pub question: String,
    #[serde(default)]
    pub description: String,
    pub options: Vec<NewPollOption>,
}

impl NewPoll {
    pub fn validate(self) -> Result<Self> {
        if self.options.len() < MIN_POLL_OPTIONS {
            return Err(AppError::invalid(format!(
                "A poll needs at least {} options",
                MIN_POLL_OPTIONS
            )));
        }
        let options = self
            .options
            .into_iter()
            .map(|opt| -> Result<NewPollOption> {
                Ok(NewPollOption {
                    option_text: required_text("Option text", &opt.option_text, MAX_TITLE_LENGTH)?,
                    description: optional_text(
                        "Option description",
                        opt.description.as_deref(),
                        MAX_BODY_LENGTH,
                    )?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            question: required_text("Question", &self.question, MAX_TITLE_LENGTH)?,
            description: self.description.trim().to_string(),
            options,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMarketplaceItem {
    pub item_name: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub is_negotiable: bool,
    #[serde(default)]
    pub give_away_by: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl NewMarketplaceItem {
    pub fn validate(self) -> Result<Self> {
        if self.give_away_by.is_none() {
            return Err(AppError::invalid("Please select a \"Give Away By\" date"));
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(AppError::invalid("Price must be a non-negative amount"));
            }
        }
        let contact_email = optional_text("Contact email", self.contact_email.as_deref(), 200)?
            .map(|e| e.to_lowercase());
        if let Some(email) = &contact_email {
            if !validate_email(email) {
                return Err(AppError::invalid("Contact email is not valid"));
            }
        }
        Ok(Self {
            item_name: required_text("Item name", &self.item_name, MAX_TITLE_LENGTH)?,
            description: self.description.trim().to_string(),
            location: required_text("Location", &self.location, MAX_TITLE_LENGTH)?,
            price: self.price,
            is_negotiable: self.is_negotiable,
            give_away_by: self.give_away_by,
            contact_email,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
}

impl NewTicket {
    pub fn validate(self) -> Result<Self> {
        Ok(Self {
            ticket_type: self.ticket_type,
            title: required_text("Title", &self.title, MAX_TITLE_LENGTH)?,
            description: required_text("Description", &self.description, MAX_BODY_LENGTH)?,
            priority: self.priority,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_account_normalises_email() {
        let account = NewAccount {
            email: "  Resident@Hook.Coop ".to_string(),
            password: "long-enough".to_string(),
            user_name: " Ada ".to_string(),
            building_address: "East River".to_string(),
            unit_number: " 4B ".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(account.email, "resident@hook.coop");
        assert_eq!(account.user_name, "Ada");
        assert_eq!(account.unit_number, "4B");
    }

    #[test]
    fn test_account_short_password() {
        let result = NewAccount {
            email: "a@hook.coop".to_string(),
            password: "short".to_string(),
            user_name: "Ada".to_string(),
            building_address: "East River".to_string(),
            unit_number: String::new(),
        }
        .validate();
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_poll_needs_two_filled_options() {
        let poll = |texts: &[&str]| NewPoll {
            question: "Garden day?".to_string(),
            description: String::new(),
            options: texts
                .iter()
                .map(|t| NewPollOption {
                    option_text: t.to_string(),
                    description: None,
                })
                .collect(),
        };
        assert!(poll(&["Yes"]).validate().is_err());
        assert!(poll(&["Yes", "  "]).validate().is_err());
        assert_eq!(poll(&["Yes", "No"]).validate().unwrap().options.len(), 2);
    }

    #[test]
    fn test_event_end_before_start() {
        let start = Utc::now();
        let event = NewEvent {
            event_name: "Potluck".to_string(),
            host_organization: String::new(),
            start_time: start,
            end_time: start - Duration::hours(1),
            location: "Courtyard".to_string(),
            description: String::new(),
        };
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_marketplace_requires_deadline() {
        let item = NewMarketplaceItem {
            item_name: "Couch".to_string(),
            description: String::new(),
            location: "5F".to_string(),
            price: None,
            is_negotiable: false,
            give_away_by: None,
            contact_email: None,
        };
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_ticket_type_field_is_named_type() {
        let ticket: NewTicket = serde_json::from_str(
            r#"{"type":"feature","title":"Dark mode","description":"Please"}"#,
        )
        .unwrap();
        assert_eq!(ticket.ticket_type, TicketType::Feature);
        assert_eq!(ticket.priority, Priority::Medium);
    }
}

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{BrandingTheme, JudgingMode, LifecycleStatus};
use crate::errors::CoreError;

/// A time-boxed community event instance.
///
/// `page_id` may be null — a jam can exist before its external content page
/// does. `creation_request_id` is the idempotency key for the create
/// operation: a repeated create with the same key returns the existing jam.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Jam {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub tagline: Option<String>,
    pub timezone: String,
    pub lifecycle_status: LifecycleStatus,
    pub page_id: Option<String>,
    pub parent_page_id: Option<String>,
    pub creation_request_id: String,
    pub schedule: ScheduleConfig,
    pub rules: RulesConfig,
    pub branding: BrandingConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Phase timestamps a jam's milestone schedule is derived from.
///
/// The declarative-to-milestone expansion itself is a stateless external
/// mapping; the core only stores and orders these instants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub registration_opens_at: DateTime<Utc>,
    pub hacking_starts_at: DateTime<Utc>,
    pub voting_starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl ScheduleConfig {
    /// Reject schedules whose phases are not strictly ascending.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` naming the first out-of-order pair.
    pub fn validate(&self) -> Result<(), CoreError> {
        let phases = [
            ("registration_opens_at", self.registration_opens_at),
            ("hacking_starts_at", self.hacking_starts_at),
            ("voting_starts_at", self.voting_starts_at),
            ("ends_at", self.ends_at),
        ];
        for pair in phases.windows(2) {
            if pair[0].1 >= pair[1].1 {
                return Err(CoreError::Validation(format!(
                    "schedule phase {} must come before {}",
                    pair[0].0, pair[1].0
                )));
            }
        }
        Ok(())
    }
}

const MIN_TEAM_SIZE: u32 = 1;
const MAX_TEAM_SIZE: u32 = 20;
const MAX_SUBMISSIONS_PER_USER: u32 = 10;

/// Participation rules for a jam. Numeric fields are range-checked before any
/// write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RulesConfig {
    pub max_team_size: u32,
    pub max_submissions_per_user: u32,
    pub judging: JudgingMode,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_team_size: 5,
            max_submissions_per_user: 1,
            judging: JudgingMode::Community,
        }
    }
}

impl RulesConfig {
    /// Reject rules outside the supported bounds.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` naming the offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(MIN_TEAM_SIZE..=MAX_TEAM_SIZE).contains(&self.max_team_size) {
            return Err(CoreError::Validation(format!(
                "max_team_size must be between {MIN_TEAM_SIZE} and {MAX_TEAM_SIZE}, got {}",
                self.max_team_size
            )));
        }
        if !(1..=MAX_SUBMISSIONS_PER_USER).contains(&self.max_submissions_per_user) {
            return Err(CoreError::Validation(format!(
                "max_submissions_per_user must be between 1 and {MAX_SUBMISSIONS_PER_USER}, got {}",
                self.max_submissions_per_user
            )));
        }
        Ok(())
    }
}

/// Visual branding for a jam's pages.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BrandingConfig {
    pub theme: BrandingTheme,
    pub banner_url: Option<String>,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            theme: BrandingTheme::System,
            banner_url: None,
        }
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::age::{calculate_age, AgeResult};
use crate::error::ValidationError;

/// Maximum length of the child's name, in characters.
pub const MAX_NAME_LENGTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Single-character Korean label used in reports ("남" / "여").
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "남",
            Gender::Female => "여",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "남" => Ok(Gender::Male),
            "female" | "f" | "여" => Ok(Gender::Female),
            other => Err(ValidationError::UnknownGender(other.to_string())),
        }
    }
}

/// Demographic data entered for one child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildInfo {
    pub name: String,
    pub gender: Gender,
    #[serde(with = "crate::storage::dates")]
    pub birth_date: NaiveDate,
    #[serde(with = "crate::storage::dates")]
    pub test_date: NaiveDate,
}

impl ChildInfo {
    /// Build a validated `ChildInfo`. The name is trimmed.
    pub fn new(
        name: &str,
        gender: Gender,
        birth_date: NaiveDate,
        test_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let info = Self {
            name: name.trim().to_string(),
            gender,
            birth_date,
            test_date,
        };
        info.validate()?;
        Ok(info)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.name.trim().chars().count();
        if len == 0 {
            return Err(ValidationError::EmptyName);
        }
        if len > MAX_NAME_LENGTH {
            return Err(ValidationError::NameTooLong {
                len,
                max: MAX_NAME_LENGTH,
            });
        }
        if self.birth_date > self.test_date {
            return Err(ValidationError::InvalidDateRange);
        }
        Ok(())
    }

    pub fn age(&self) -> Result<AgeResult, ValidationError> {
        calculate_age(self.birth_date, self.test_date)
    }
}

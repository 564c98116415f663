use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum EmploymentType {
    Intern,
    #[strum(to_string = "FullTimer", serialize = "Full Timer", serialize = "Full-Time")]
    FullTimer,
}

/// Employment facts read from the employee directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "employee_id": 1000,
        "employment_type": "Intern",
        "designation": "Software Engineer Intern",
        "joining_date": "2025-01-05",
        "conversion_date": "2025-06-08"
    })
)]
pub struct EmploymentFacts {
    #[schema(example = 1000)]
    pub employee_id: u64,

    #[schema(example = "Intern", nullable = true)]
    pub employment_type: Option<EmploymentType>,

    #[schema(example = "Software Engineer Intern", nullable = true)]
    pub designation: Option<String>,

    #[schema(example = "2025-01-05", value_type = String, format = "date")]
    pub joining_date: NaiveDate,

    /// Intern to full-timer transition date.
    #[schema(example = "2025-06-08", value_type = Option<String>, format = "date")]
    pub conversion_date: Option<NaiveDate>,
}

impl EmploymentFacts {
    /// Recorded type, falling back to the designation text.
    pub fn base_type(&self) -> EmploymentType {
        if let Some(kind) = self.employment_type {
            return kind;
        }
        match &self.designation {
            Some(designation) if designation.to_lowercase().contains("intern") => {
                EmploymentType::Intern
            }
            _ => EmploymentType::FullTimer,
        }
    }
}

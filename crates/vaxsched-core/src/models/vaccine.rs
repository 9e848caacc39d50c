use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_mandatory() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vaccine {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_mandatory")]
    pub is_mandatory: bool,
    /// Month after birth the dose is recommended, e.g. 2, 4, 13
    #[serde(default)]
    pub recommended_month: Option<i32>,
}

/// Start of the booster window in which only 18-month doses are due.
const BOOSTER_WINDOW_START: i32 = 18;

/// End of the booster window (inclusive).
const BOOSTER_WINDOW_END: i32 = 24;

impl Vaccine {
    /// Whether a mandatory dose is due for a patient of `age_months`.
    ///
    /// Between 18 and 24 months only the 18-month boosters count as due.
    /// Doses without a recommended month are never due.
    pub fn is_due(&self, age_months: i32) -> bool {
        if !self.is_mandatory {
            return false;
        }
        let Some(month) = self.recommended_month else {
            return false;
        };
        if (BOOSTER_WINDOW_START..=BOOSTER_WINDOW_END).contains(&age_months) {
            month == BOOSTER_WINDOW_START
        } else {
            age_months >= month
        }
    }

    pub fn month_display(&self) -> String {
        match self.recommended_month {
            Some(m) => format!("{} mo", m),
            None => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Immunization {
    pub id: i64,
    pub patient_id: i64,
    pub vaccine_id: i64,
    pub date_given: NaiveDate,
    #[serde(default)]
    pub doctor_id: Option<i64>,
}

/// Names of given and still-missing mandatory vaccines for one patient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSchedule {
    #[serde(default)]
    pub given: Vec<String>,
    #[serde(default)]
    pub missing: Vec<String>,
}

impl PatientSchedule {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

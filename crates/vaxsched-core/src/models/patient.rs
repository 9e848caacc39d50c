use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A patient as returned by `GET /patients/`.
///
/// Only `id` and the two name fields are guaranteed; the remaining fields are
/// filled in when the service includes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// National identification number
    #[serde(default)]
    pub egn: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Age in whole calendar months on `today`, if the birth date is known.
    pub fn age_months_on(&self, today: NaiveDate) -> Option<i32> {
        self.birth_date.map(|birth| age_in_months(birth, today))
    }

    pub fn age_display(&self, today: NaiveDate) -> String {
        match self.age_months_on(today) {
            Some(months) if months < 0 => "?".to_string(),
            Some(months) if months < 24 => format!("{} mo", months),
            Some(months) => format!("{} yr", months / 12),
            None => "?".to_string(),
        }
    }
}

/// Calendar-month difference between two dates, ignoring the day of month.
pub fn age_in_months(birth: NaiveDate, today: NaiveDate) -> i32 {
    (today.year() - birth.year()) * 12 + (today.month() as i32 - birth.month() as i32)
}

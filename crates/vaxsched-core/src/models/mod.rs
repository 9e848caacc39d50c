//! Data models for the vaccination schedule service.
//!
//! - `Patient`: the records shown in the patient list
//! - `Doctor`: the signed-in account
//! - `Vaccine`, `Immunization`, `PatientSchedule`: schedule data per patient

pub mod doctor;
pub mod patient;
pub mod vaccine;

pub use doctor::Doctor;
pub use patient::{age_in_months, Patient};
pub use vaccine::{Immunization, PatientSchedule, Vaccine};

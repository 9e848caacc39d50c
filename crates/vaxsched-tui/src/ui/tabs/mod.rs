pub mod patients;
pub mod vaccines;

pub mod calendar;
pub mod employee;
pub mod health;
pub mod requests;
pub mod users;

pub mod admin;
pub mod catalog;
pub mod dashboard;
pub mod diary;
pub mod loans;
pub mod login;
pub mod planner;
pub mod wallet;

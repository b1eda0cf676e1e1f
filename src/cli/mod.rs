pub mod catalog;
pub mod rates;
pub mod setup;
pub mod ui;

pub mod currencies;
pub mod history;
pub mod ui;

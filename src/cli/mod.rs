pub mod price;
pub mod products;
pub mod setup;
pub mod ui;

//! Request handlers, one module per resource

pub mod customers;
pub mod health;
pub mod invoices;
pub mod reports;
pub mod settings;
pub mod truck_loads;
pub mod trucks;

pub mod balance;
pub mod error;
pub mod expense;
pub mod participant;
pub mod transfer;

pub mod catalog;
pub mod currency;
pub mod customer;
pub mod errors;
pub mod order;
pub mod pagination;
pub mod ports;
pub mod pricing;

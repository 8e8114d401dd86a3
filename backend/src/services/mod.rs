//! Business logic services for the Store Management Platform

pub mod customer;
pub mod order;
pub mod product;

pub use customer::CustomerService;
pub use order::OrderService;
pub use product::ProductService;

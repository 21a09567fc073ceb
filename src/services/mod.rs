// Core services
pub mod orders;
pub mod users;

// One-to-one order records: identity, contact, institution, prescription
pub mod order_details;

// Catalog and order lines
pub mod catalog;
pub mod products;

// Payments
pub mod vouchers;

// Derived totals
pub mod pricing;

// Multi-entity submission
pub mod tunnel;

//! sea-orm entities for the optical shop.
//!
//! Orders own their one-to-one details (identity, contact, institution,
//! prescription) and their products; products reference the catalog
//! (frames, glass types, lenses); vouchers pay for orders in installments.

pub mod contact;
pub mod frame;
pub mod glass_type;
pub mod identity;
pub mod institution;
pub mod lens;
pub mod order;
pub mod prescription_detail;
pub mod product;
pub mod user;
pub mod voucher;
pub mod voucher_line;
pub mod voucher_order;

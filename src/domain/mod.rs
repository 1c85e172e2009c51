//! Storefront domain: catalog, sale pricing, carts and crypto payments.
pub mod aggregates;
pub mod events;
pub mod pricing;
pub mod value_objects;

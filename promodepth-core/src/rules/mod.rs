// Candidate rule corpus and resolution.
// - context.rs: PromoContext, the read-only view every rule receives
// - percent.rs: percentages, was/now, savings and money-off
// - multibuy.rs: unit-count bundles (buy/get, N for M, ...)
// - pricing.rs: effective unit prices compared against the base price
// - resolver.rs: minimum-candidate resolution
// - engine.rs: rule table, PromoEngine and shared debug utilities

pub mod context;
pub mod engine;
pub mod multibuy;
pub mod percent;
pub mod pricing;
pub mod resolver;

pub use engine::*;

// All scoring functionality is in promo-depth-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod preview;

// Re-export core types for convenience
pub use promo_depth_core::*;

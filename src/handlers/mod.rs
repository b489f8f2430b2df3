// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT auth)

pub mod protected; // JWT authentication required (/api/*)
pub mod public;    // No authentication required (/auth/*)

// handlers/mod.rs - Public (no token) and protected (guarded) handlers
pub mod protected;
pub mod public;
pub mod utils;

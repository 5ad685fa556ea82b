// ==============================================================================
// middleware/mod.rs - Variant API Middleware Modules
// ==============================================================================
// Description: Request extractors guarding mutating endpoints
// Author: Matt Barham
// Created: 2026-10-17
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

pub mod auth;

pub use auth::SharedSecret;

//! Public library API for decoding the SDNA schema of `.blend` files and reflecting block payloads through it.

/// Blend file parsing, SDNA decoding, struct reflection, and pointer strip/restore passes.
pub mod blend;

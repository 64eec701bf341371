//! Read-side query shaping for note lists.
//!
//! # Responsibility
//! - Translate the client-facing `deleted` parameter into a note subset.
//! - Normalize pagination inputs before they reach SQL.

pub mod filter;

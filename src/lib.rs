//! review-roster — pull-request tracking with automated reviewer assignment.
//!
//! The engine picks reviewers when a PR is created, swaps a single reviewer
//! on request, cascades reviewer removal when users or whole teams are
//! deactivated, and keeps a per-user review-statistics ledger consistent
//! with every PR state transition. The HTTP layer in [`api`] is a thin
//! adapter over [`services`].

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

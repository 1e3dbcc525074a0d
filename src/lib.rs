//! Payroll run engine.
//!
//! This crate computes monthly payroll runs: for a calendar month it prorates
//! each active employee's salary by days employed, applies withholding tax
//! and the social security and provident fund contributions, and persists
//! the resulting line items against the run. Recalculating a run replaces its
//! items wholesale.
//!
//! The computation core lives in [`calculation`] and [`materializer`];
//! persistence is abstracted by [`storage::PayrollStore`], with in-memory and
//! PostgreSQL backends; [`api`] exposes everything over HTTP.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod materializer;
pub mod models;
pub mod seed;
pub mod storage;

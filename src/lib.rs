//! Business-operations backend for a vehicle rental and sales shop.
//!
//! Tracks the fleet, customers, rentals, settled sales, insurance policies,
//! legal documents, maintenance and staff over SQLite. The request layer
//! (HTTP, IPC, whatever fronts this) deserializes into the request structs,
//! calls the command functions with an injected [`Database`], and serializes
//! the results.
//!
//! The one piece of real logic is the rental lifecycle: a rental opens
//! against an available car, blocks every overlapping booking while it
//! lives, and closes exactly once through [`rentals::return_rental`], which
//! prices the elapsed days, emits the paired sale, and frees the car.

mod commands;
mod db;
mod error;
mod models;


pub use commands::{cars, compliance, customers, maintenance, rentals, reports, users};
pub use db::Database;
pub use error::{Error, Result};
pub use models::*;

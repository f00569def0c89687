//! Daily and annualized volatility of closing prices, served over HTTP.
//!
//! The numeric pipeline lives in [`calc::calculate_volatility`] and does no I/O.
//! [`data::csv_loader`] turns a CSV table into the ordered close series and
//! [`server`] wires both behind `POST /compute_volatility`.

pub mod calc;
pub mod config;
pub mod data;
pub mod error;
pub mod server;
pub mod util;

//! # Carlot — fixed-slot record store for a car lot
//!
//! Three single-file tables (cars, models, sales) built on the
//! slotfile/lineindex/rectable engine, orchestrated by [`CarService`]:
//! registration, sales with automatic status cascade, sale reversal, VIN
//! rekeying, status listings, the car→model→sale detail join, and the
//! top-selling-models ranking.

pub mod records;
pub mod service;

pub use records::{Car, CarFullInfo, CarStatus, Model, ModelSaleStats, Sale};
pub use service::{CarService, Result, ServiceError};

//! Record schemas for the three carlot tables, plus the read-only views
//! assembled by the service layer.
//!
//! All three records serialize to the JSON payload format stored in the
//! data files; prices use [`rust_decimal::Decimal`] so money stays exact.

use rectable::Record;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

/// Lifecycle status of a car on the lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarStatus {
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "reserved")]
    Reserved,
    #[serde(rename = "sold")]
    Sold,
    #[serde(rename = "in-delivery")]
    InDelivery,
}

/// A vehicle, keyed by VIN. The VIN is mutable through the service's
/// explicit rekey operation only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub vin: String,
    /// Foreign key into the models table.
    pub model: i64,
    pub price: Decimal,
    pub date_start: Date,
    pub status: CarStatus,
}

impl Record for Car {
    type Key = String;

    fn key(&self) -> String {
        self.vin.clone()
    }
}

/// A car model, keyed by its immutable integer id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub name: String,
    pub brand: String,
}

impl Record for Model {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

/// A completed sale, keyed by its sales number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub sales_number: String,
    /// Foreign key into the cars table.
    pub car_vin: String,
    pub sales_date: Date,
    pub cost: Decimal,
}

impl Record for Sale {
    type Key = String;

    fn key(&self) -> String {
        self.sales_number.clone()
    }
}

/// Cross-table detail view of one car: its model, and, when sold, the
/// matching sale's date and cost.
///
/// The sale fields stay `None` for unsold cars, and also for a `sold` car
/// whose sale record cannot be found (a tolerated inconsistency after a
/// manual data edit).
#[derive(Debug, Clone, PartialEq)]
pub struct CarFullInfo {
    pub vin: String,
    pub car_model_name: String,
    pub car_model_brand: String,
    pub price: Decimal,
    pub date_start: Date,
    pub status: CarStatus,
    pub sales_date: Option<Date>,
    pub sales_cost: Option<Decimal>,
}

/// One row of the top-selling-models ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSaleStats {
    pub car_model_name: String,
    pub brand: String,
    pub sales_count: usize,
}

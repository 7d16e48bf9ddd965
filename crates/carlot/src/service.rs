//! The car-lot domain service: the single entry point orchestrating the
//! three record tables.
//!
//! # Status machine
//!
//! `available`, `reserved`, and `in-delivery` move to `sold` only through
//! [`sell_car`](CarService::sell_car); `sold` moves back to `available`
//! only through [`revert_sale`](CarService::revert_sale). No other
//! transitions exist.
//!
//! # Storage
//!
//! The service never touches files directly. Every operation goes through
//! [`rectable::RecordTable`], which resolves keys via the index and reads
//! or writes fixed-stride slots. Failures come back as typed
//! [`ServiceError`] values; nothing here prints or panics on missing data.

use crate::records::{Car, CarFullInfo, CarStatus, Model, ModelSaleStats, Sale};
use rectable::{RecordTable, TableError};
use rust_decimal::Decimal;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Table(#[from] TableError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Orchestrates the cars, models, and sales tables.
///
/// All mutation is `&mut self`; the engine assumes a single writer at a
/// time (the tables provide no cross-process locking).
pub struct CarService {
    cars: RecordTable<Car>,
    models: RecordTable<Model>,
    sales: RecordTable<Sale>,
}

impl CarService {
    /// Opens (bootstrapping if needed) a store rooted at `root`.
    ///
    /// Creates the directory and all six table files if absent; empty
    /// files read as empty tables.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;

        let cars = RecordTable::open(root.join("cars.txt"), root.join("cars_index.txt"))?;
        let models = RecordTable::open(root.join("models.txt"), root.join("models_index.txt"))?;
        let sales = RecordTable::open(root.join("sales.txt"), root.join("sales_index.txt"))?;

        info!(root = %root.display(), "opened car store");
        Ok(Self {
            cars,
            models,
            sales,
        })
    }

    /// Registers a model. Idempotent: a duplicate id is ignored and the
    /// stored model is returned.
    pub fn add_model(&mut self, model: Model) -> Result<Model> {
        Ok(self.models.put_if_new(model)?)
    }

    /// Registers a car. Idempotent: a duplicate VIN is ignored and the
    /// stored car is returned.
    pub fn add_car(&mut self, car: Car) -> Result<Car> {
        Ok(self.cars.put_if_new(car)?)
    }

    /// Records a sale and cascades the referenced car's status to `sold`.
    ///
    /// Fails with `NotFound` if the VIN does not exist. A duplicate sales
    /// number writes nothing and cascades nothing; the car comes back in
    /// its current state.
    pub fn sell_car(&mut self, sale: Sale) -> Result<Car> {
        if !self.cars.contains(&sale.car_vin) {
            return Err(ServiceError::NotFound("car"));
        }
        if self.sales.contains(&sale.sales_number) {
            debug!(sales_number = %sale.sales_number, "duplicate sale ignored");
            return self
                .cars
                .get(&sale.car_vin)?
                .ok_or(ServiceError::NotFound("car"));
        }

        let vin = sale.car_vin.clone();
        self.sales.put_if_new(sale)?;
        self.update_status(&vin, CarStatus::Sold)
    }

    /// Deletes a sale and cascades the car's status back to `available`.
    ///
    /// Fails with `NotFound` if the sale (or the car it references) does
    /// not exist; on the car-missing path the sale entry is left in place
    /// so storage is never half-mutated. The sale's data slot stays behind,
    /// orphaned.
    pub fn revert_sale(&mut self, sales_number: &str) -> Result<Car> {
        let sale = self
            .sales
            .get(&sales_number.to_string())?
            .ok_or(ServiceError::NotFound("sale"))?;

        let car = self.update_status(&sale.car_vin, CarStatus::Available)?;
        self.sales.remove(&sale.sales_number)?;
        Ok(car)
    }

    /// Changes a car's VIN, rewriting the stored payload and the index key
    /// together at the unchanged slot.
    pub fn update_vin(&mut self, vin: &str, new_vin: &str) -> Result<Car> {
        let old_key = vin.to_string();
        let mut car = self
            .cars
            .get(&old_key)?
            .ok_or(ServiceError::NotFound("car"))?;
        car.vin = new_vin.to_string();
        self.cars
            .rekey(&old_key, car)?
            .ok_or(ServiceError::NotFound("car"))
    }

    /// All cars currently in `status`, in slot (arrival) order.
    pub fn get_cars(&self, status: CarStatus) -> Result<Vec<Car>> {
        let mut out = Vec::new();
        for car in self.cars.scan() {
            let car = car?;
            if car.status == status {
                out.push(car);
            }
        }
        Ok(out)
    }

    /// Assembles the car → model → sale detail view for one VIN.
    ///
    /// Fails with `NotFound` if the car or its model is missing. For a
    /// `sold` car the sales table's index is scanned in key order for the
    /// first sale referencing this VIN; if none exists (possible after a
    /// manual edit) the sale fields are simply left `None`.
    pub fn get_car_info(&self, vin: &str) -> Result<CarFullInfo> {
        let car = self
            .cars
            .get(&vin.to_string())?
            .ok_or(ServiceError::NotFound("car"))?;
        let model = self
            .models
            .get(&car.model)?
            .ok_or(ServiceError::NotFound("model"))?;

        let mut sales_date = None;
        let mut sales_cost = None;
        if car.status == CarStatus::Sold {
            for sale in self.sales.scan_by_key() {
                let sale = sale?;
                if sale.car_vin == car.vin {
                    sales_date = Some(sale.sales_date);
                    sales_cost = Some(sale.cost);
                    break;
                }
            }
            if sales_cost.is_none() {
                debug!(vin, "sold car has no matching sale record");
            }
        }

        Ok(CarFullInfo {
            vin: car.vin,
            car_model_name: model.name,
            car_model_brand: model.brand,
            price: car.price,
            date_start: car.date_start,
            status: car.status,
            sales_date,
            sales_cost,
        })
    }

    /// Ranks models by number of sold cars, descending, returning the top
    /// `n` resolved to name and brand.
    ///
    /// Ties on count go to the model whose priciest sold car is higher:
    /// `(price, model id)` pairs are sorted descending before counting, and
    /// the count sort is stable, so first-seen order breaks ties.
    ///
    /// Fails with `NotFound` if a winning model id cannot be resolved.
    pub fn top_models_by_sales(&self, n: usize) -> Result<Vec<ModelSaleStats>> {
        let mut priced: Vec<(Decimal, i64)> = self
            .get_cars(CarStatus::Sold)?
            .iter()
            .map(|car| (car.price, car.model))
            .collect();
        priced.sort_by(|a, b| b.cmp(a));

        // Count occurrences preserving first-seen order.
        let mut counts: Vec<(i64, usize)> = Vec::new();
        for (_, model_id) in priced {
            match counts.iter_mut().find(|(id, _)| *id == model_id) {
                Some(entry) => entry.1 += 1,
                None => counts.push((model_id, 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(n);

        let mut out = Vec::with_capacity(counts.len());
        for (model_id, sales_count) in counts {
            let model = self
                .models
                .get(&model_id)?
                .ok_or(ServiceError::NotFound("model"))?;
            out.push(ModelSaleStats {
                car_model_name: model.name,
                brand: model.brand,
                sales_count,
            });
        }
        Ok(out)
    }

    /// Overwrites one car's status at its existing slot.
    fn update_status(&mut self, vin: &str, status: CarStatus) -> Result<Car> {
        let key = vin.to_string();
        let mut car = self
            .cars
            .get(&key)?
            .ok_or(ServiceError::NotFound("car"))?;
        car.status = status;
        self.cars
            .update_in_place(&key, car)?
            .ok_or(ServiceError::NotFound("car"))
    }
}

//! Demo binary: seeds a sample fleet into a store directory and prints a
//! few queries. The store root comes from the first argument, defaulting
//! to `carlot_database`.

use anyhow::Result;
use carlot::{Car, CarService, CarStatus, Model, Sale};
use time::macros::date;
use time::Date;
use tracing_subscriber::EnvFilter;

fn car(vin: &str, model: i64, price: &str, date_start: Date, status: CarStatus) -> Result<Car> {
    Ok(Car {
        vin: vin.to_string(),
        model,
        price: price.parse()?,
        date_start,
        status,
    })
}

fn sale(number: &str, vin: &str, sales_date: Date, cost: &str) -> Result<Sale> {
    Ok(Sale {
        sales_number: number.to_string(),
        car_vin: vin.to_string(),
        sales_date,
        cost: cost.parse()?,
    })
}

fn model(id: i64, name: &str, brand: &str) -> Model {
    Model {
        id,
        name: name.to_string(),
        brand: brand.to_string(),
    }
}

fn seed_cars() -> Result<Vec<Car>> {
    Ok(vec![
        car("KNAGM4A77D5316538", 1, "2000", date!(2024 - 02 - 08), CarStatus::Available)?,
        car("5XYPH4A10GG021831", 2, "2300", date!(2024 - 02 - 20), CarStatus::Reserved)?,
        car("KNAGH4A48A5414970", 1, "2100", date!(2024 - 04 - 04), CarStatus::Available)?,
        car("JM1BL1TFXD1734246", 3, "2276.65", date!(2024 - 05 - 17), CarStatus::Available)?,
        car("JM1BL1M58C1614725", 3, "2549.10", date!(2024 - 05 - 17), CarStatus::Reserved)?,
        car("KNAGR4A63D5359556", 1, "2376", date!(2024 - 05 - 17), CarStatus::Available)?,
        car("5N1CR2MN9EC641864", 4, "3100", date!(2024 - 06 - 01), CarStatus::Available)?,
        car("JM1BL1L83C1660152", 3, "2635.17", date!(2024 - 06 - 01), CarStatus::Available)?,
        car("5N1CR2TS0HW037674", 4, "3100", date!(2024 - 06 - 01), CarStatus::Available)?,
        car("5N1AR2MM4DC605884", 4, "3200", date!(2024 - 07 - 15), CarStatus::Available)?,
        car("VF1LZL2T4BC242298", 5, "2280.76", date!(2024 - 08 - 31), CarStatus::InDelivery)?,
    ])
}

fn seed_sales() -> Result<Vec<Sale>> {
    Ok(vec![
        sale("20240903#KNAGM4A77D5316538", "KNAGM4A77D5316538", date!(2024 - 09 - 03), "1999.09")?,
        sale("20240903#KNAGH4A48A5414970", "KNAGH4A48A5414970", date!(2024 - 09 - 04), "2100")?,
        sale("20240903#KNAGR4A63D5359556", "KNAGR4A63D5359556", date!(2024 - 09 - 05), "7623")?,
        sale("20240903#JM1BL1M58C1614725", "JM1BL1M58C1614725", date!(2024 - 09 - 06), "2334")?,
        sale("20240903#JM1BL1L83C1660152", "JM1BL1L83C1660152", date!(2024 - 09 - 07), "451")?,
        sale("20240903#5N1CR2TS0HW037674", "5N1CR2TS0HW037674", date!(2024 - 09 - 08), "9876")?,
        sale("20240903#5XYPH4A10GG021831", "5XYPH4A10GG021831", date!(2024 - 09 - 09), "1234")?,
    ])
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let root = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "carlot_database".to_string());
    let mut svc = CarService::open(&root)?;

    for m in [
        model(1, "Optima", "Kia"),
        model(2, "Sorento", "Kia"),
        model(3, "3", "Mazda"),
        model(4, "Pathfinder", "Nissan"),
        model(5, "Logan", "Renault"),
    ] {
        svc.add_model(m)?;
    }
    for c in seed_cars()? {
        svc.add_car(c)?;
    }
    for s in seed_sales()? {
        svc.sell_car(s)?;
    }

    println!("available:");
    for c in svc.get_cars(CarStatus::Available)? {
        println!("  {} (model {}, {})", c.vin, c.model, c.price);
    }

    let info = svc.get_car_info("KNAGH4A48A5414970")?;
    println!(
        "detail: {} {} {} — sold for {:?} on {:?}",
        info.vin, info.car_model_brand, info.car_model_name, info.sales_cost, info.sales_date
    );

    println!("top models:");
    for stat in svc.top_models_by_sales(3)? {
        println!(
            "  {} {} — {} sold",
            stat.brand, stat.car_model_name, stat.sales_count
        );
    }

    Ok(())
}

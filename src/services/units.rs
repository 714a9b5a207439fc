//! Unit conversion and price resolution for sold or moved quantities.
//!
//! Every product carries a base unit (conversion rate 1) plus any number of
//! alternate units such as a box of 12. Stock is always kept in base units, while
//! amounts are charged per unit actually sold.

use std::collections::HashMap;

use sqlx::PgConnection;

use crate::models::product::Product;
use crate::models::product_unit::{ProductUnit, PRODUCT_UNIT_COLUMNS};

/// Name of the unit created with every new product.
pub const BASE_UNIT_NAME: &str = "斤";

/// Where a price came from when the caller did not supply a usable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    SelectedUnit,
    DefaultUnit,
    ProductBase,
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedPrice {
    /// The caller's explicit price was used.
    Resolved(f64),
    Defaulted(f64, PriceSource),
}

impl ResolvedPrice {
    pub fn amount(&self) -> f64 {
        match *self {
            ResolvedPrice::Resolved(price) | ResolvedPrice::Defaulted(price, _) => price,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitResolution {
    /// The unit that was actually matched; `None` means the base unit.
    pub product_unit: Option<ProductUnit>,
    pub conversion_rate: f64,
    pub price: ResolvedPrice,
}

impl UnitResolution {
    pub fn product_unit_id(&self) -> Option<i64> {
        self.product_unit.as_ref().map(|u| u.id)
    }

    pub fn base_quantity(&self, quantity: f64) -> f64 {
        base_quantity(quantity, self.conversion_rate)
    }
}

/// A missing, zero, negative or non-finite rate counts as the base unit.
pub fn normalize_conversion_rate(rate: f64) -> f64 {
    if rate.is_finite() && rate > 0.0 {
        rate
    } else {
        1.0
    }
}

pub fn base_quantity(quantity: f64, conversion_rate: f64) -> f64 {
    quantity * normalize_conversion_rate(conversion_rate)
}

pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Line amount: unit price times quantity in that same unit.
pub fn line_amount(quantity: f64, price: f64) -> f64 {
    round_money(quantity * price)
}

// Clients send 0 for a blank price field, so zero means "not set".
fn usable_price(price: Option<f64>) -> Option<f64> {
    price.filter(|p| p.is_finite() && *p > 0.0)
}

/// Resolves the conversion rate and effective price of one line.
///
/// `units` may contain units of other products; only those of `product` are
/// considered. A unit id that does not belong to the product falls back to the
/// base unit.
pub fn resolve(
    product: &Product,
    units: &[ProductUnit],
    product_unit_id: Option<i64>,
    explicit_price: Option<f64>,
) -> UnitResolution {
    let own_units = || units.iter().filter(|u| u.product_id == product.id);

    let selected = product_unit_id.and_then(|id| own_units().find(|u| u.id == id));
    if let (Some(id), None) = (product_unit_id, selected) {
        tracing::warn!(
            product_id = product.id,
            product_unit_id = id,
            "Unit not found for product, using base unit"
        );
    }

    let conversion_rate = selected
        .map(|u| normalize_conversion_rate(u.conversion_rate))
        .unwrap_or(1.0);

    let price = if let Some(price) = usable_price(explicit_price) {
        ResolvedPrice::Resolved(price)
    } else if let Some(price) = selected.and_then(|u| usable_price(Some(u.price))) {
        ResolvedPrice::Defaulted(price, PriceSource::SelectedUnit)
    } else if let Some(price) = own_units()
        .find(|u| u.is_default)
        .and_then(|u| usable_price(Some(u.price)))
    {
        ResolvedPrice::Defaulted(price, PriceSource::DefaultUnit)
    } else if let Some(price) = usable_price(Some(product.price)) {
        ResolvedPrice::Defaulted(price, PriceSource::ProductBase)
    } else {
        ResolvedPrice::Defaulted(0.0, PriceSource::Zero)
    };

    UnitResolution {
        product_unit: selected.cloned(),
        conversion_rate,
        price,
    }
}

/// Loads the units of the given products, grouped by product id.
pub async fn load_units(
    conn: &mut PgConnection,
    product_ids: &[i64],
) -> Result<HashMap<i64, Vec<ProductUnit>>, sqlx::Error> {
    let units = sqlx::query_as::<_, ProductUnit>(&format!(
        "SELECT {PRODUCT_UNIT_COLUMNS} FROM product_units
         WHERE product_id = ANY($1)
         ORDER BY product_id, is_default DESC, id"
    ))
    .bind(product_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut grouped: HashMap<i64, Vec<ProductUnit>> = HashMap::new();
    for unit in units {
        grouped.entry(unit.product_id).or_default().push(unit);
    }
    Ok(grouped)
}

use std::str::FromStr;
use std::sync::LazyLock;
use derive_more::{Display, Error};
use regex::Regex;
use crate::desk::model::bill::BillItem;

/// One row of the bill form, kept as the raw text the user typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DraftLineItem {
    pub product_name: String,
    pub unit_price: String,
    pub quantity: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum DraftField {
    #[display("product name")]
    ProductName,
    #[display("unit price")]
    UnitPrice,
    #[display("quantity")]
    Quantity,
}

impl FromStr for DraftField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" | "product" | "productName" => Ok(Self::ProductName),
            "price" | "unitPrice" => Ok(Self::UnitPrice),
            "qty" | "quantity" => Ok(Self::Quantity),
            s => Err(format!("Invalid field: {s}")),
        }
    }
}

/// How draft text becomes payload numbers at submit time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub(crate) enum SubmissionPolicy {
    /// reject the submission when any row is incomplete or malformed
    #[default]
    #[display("strict")]
    Strict,
    /// forward unparsable numbers as zero
    #[display("lenient")]
    Lenient,
}

impl FromStr for SubmissionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            s => Err(format!("Invalid SubmissionPolicy: {s}")),
        }
    }
}

/// Malformed input found while building the submission payload.
/// `row` is 1-based, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("row {row}: invalid {field} {value:?}")]
pub(crate) struct ValidationGap {
    pub row: usize,
    pub field: DraftField,
    pub value: String,
}

impl DraftLineItem {
    pub fn new(
        product_name: impl Into<String>,
        unit_price: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            unit_price: unit_price.into(),
            quantity: quantity.into(),
        }
    }

    pub fn field(&self, field: DraftField) -> &str {
        match field {
            DraftField::ProductName => &self.product_name,
            DraftField::UnitPrice => &self.unit_price,
            DraftField::Quantity => &self.quantity,
        }
    }

    pub fn with_field(&self, field: DraftField, value: impl Into<String>) -> Self {
        let mut row = self.clone();
        match field {
            DraftField::ProductName => row.product_name = value.into(),
            DraftField::UnitPrice => row.unit_price = value.into(),
            DraftField::Quantity => row.quantity = value.into(),
        }
        row
    }

    /// price × quantity read from the leading number of each field, so
    /// `"1.5"` counts as quantity 1 and blanks or garbage count as zero
    pub fn subtotal_or_zero(&self) -> f64 {
        leading_price(&self.unit_price).unwrap_or(0.0) * leading_quantity(&self.quantity).unwrap_or(0) as f64
    }

    /// Convert to a payload item. `row` is the 0-based position, used for reporting.
    pub fn to_bill_item(&self, row: usize, policy: SubmissionPolicy) -> Result<BillItem, ValidationGap> {
        match policy {
            SubmissionPolicy::Lenient => Ok(BillItem {
                product_name: self.product_name.clone(),
                unit_price: leading_price(&self.unit_price).unwrap_or(0.0),
                quantity: leading_quantity(&self.quantity).unwrap_or(0),
            }),
            SubmissionPolicy::Strict => {
                let gap = |field: DraftField| ValidationGap {
                    row: row + 1,
                    field,
                    value: self.field(field).to_string(),
                };
                let product_name = self.product_name.trim();
                if product_name.is_empty() {
                    return Err(gap(DraftField::ProductName));
                }
                let unit_price = parse_price(&self.unit_price)
                    .filter(|price| *price >= 0.0)
                    .ok_or_else(|| gap(DraftField::UnitPrice))?;
                let quantity = parse_quantity(&self.quantity)
                    .filter(|qty| *qty > 0)
                    .ok_or_else(|| gap(DraftField::Quantity))?;
                Ok(BillItem {
                    product_name: product_name.to_string(),
                    unit_price,
                    quantity,
                })
            }
        }
    }
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|price| price.is_finite())
}

fn parse_quantity(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

static PRICE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)").expect("valid price pattern")
});
static QUANTITY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?[0-9]+)").expect("valid quantity pattern"));

/// number at the start of `raw`, trailing text ignored
fn leading_price(raw: &str) -> Option<f64> {
    let digits = PRICE_PREFIX.captures(raw)?.get(1)?.as_str();
    digits.parse::<f64>().ok().filter(|price| price.is_finite())
}

/// integer at the start of `raw`, a fraction or trailing text ignored
fn leading_quantity(raw: &str) -> Option<i64> {
    let digits = QUANTITY_PREFIX.captures(raw)?.get(1)?.as_str();
    digits.parse::<i64>().ok()
}

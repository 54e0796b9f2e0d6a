// Copyright 2023 Remi Bernotavicius

use crate::database::models::{Ingredient, UserId};
use crate::database::{self, query};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const CSV_HEADER: [&str; 3] = ["name", "sum", "measurement_unit"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub sum: i64,
    pub measurement_unit: String,
}

impl fmt::Display for ShoppingListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} of {}", self.sum, self.measurement_unit, self.name)
    }
}

/// Folds ingredient usages into one item per `(name, measurement unit)`, summing amounts.
/// Items come out ordered by name, then unit.
pub fn aggregate(usages: impl IntoIterator<Item = (Ingredient, i32)>) -> Vec<ShoppingListItem> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for (ingredient, amount) in usages {
        *totals
            .entry((ingredient.name, ingredient.measurement_unit))
            .or_default() += i64::from(amount);
    }
    totals
        .into_iter()
        .map(|((name, measurement_unit), sum)| ShoppingListItem {
            name,
            sum,
            measurement_unit,
        })
        .collect()
}

pub fn for_user(conn: &mut database::Connection, user: UserId) -> Result<Vec<ShoppingListItem>> {
    let items = aggregate(query::cart_ingredients(conn, user)?);
    log::debug!("shopping list for user {user} has {} item(s)", items.len());
    Ok(items)
}

/// The header row is written even when there are no items.
pub fn render_csv(items: &[ShoppingListItem]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(CSV_HEADER)?;
    for item in items {
        writer.write_record([
            item.name.as_str(),
            item.sum.to_string().as_str(),
            item.measurement_unit.as_str(),
        ])?;
    }
    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

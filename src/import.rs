// Copyright 2023 Remi Bernotavicius

//! Loading the ingredient and tag catalogs from JSON fixture files.

use crate::database::models::{NewIngredient, NewTag};
use crate::database::{self, query};
use crate::Result;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Reads an array of `{name, measurement_unit}` objects. Ingredients already present are
/// skipped. Returns how many were inserted.
pub fn import_ingredients(conn: &mut database::Connection, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    log::info!("importing ingredients from {}", path.display());
    read_ingredients(conn, BufReader::new(File::open(path)?))
}

/// Reads an array of `{name, color, slug}` objects. Tags whose name or slug is already taken
/// are skipped. Returns how many were inserted.
pub fn import_tags(conn: &mut database::Connection, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    log::info!("importing tags from {}", path.display());
    read_tags(conn, BufReader::new(File::open(path)?))
}

fn read_ingredients(conn: &mut database::Connection, reader: impl Read) -> Result<usize> {
    let new_ingredients: Vec<NewIngredient> = serde_json::from_reader(reader)?;
    let inserted =
        conn.immediate_transaction(|conn| query::insert_ingredients(conn, &new_ingredients))?;
    log::info!(
        "imported {inserted} of {} ingredient(s)",
        new_ingredients.len()
    );
    Ok(inserted)
}

fn read_tags(conn: &mut database::Connection, reader: impl Read) -> Result<usize> {
    let new_tags: Vec<NewTag> = serde_json::from_reader(reader)?;
    let inserted = conn.immediate_transaction(|conn| query::insert_tags(conn, &new_tags))?;
    log::info!("imported {inserted} of {} tag(s)", new_tags.len());
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_connection;
    use crate::Error;

    const INGREDIENTS: &[u8] = br#"[
        {"name": "flour", "measurement_unit": "g"},
        {"name": "milk", "measurement_unit": "ml"},
        {"name": "milk", "measurement_unit": "ml"},
        {"name": "eggs", "measurement_unit": "pcs"}
    ]"#;

    #[test]
    fn ingredients() {
        let mut conn = test_connection();
        assert_eq!(read_ingredients(&mut conn, INGREDIENTS).unwrap(), 3);
        assert_eq!(read_ingredients(&mut conn, INGREDIENTS).unwrap(), 0);

        let names: Vec<_> = query::search_ingredients(&mut conn, None)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["eggs", "flour", "milk"]);
    }

    #[test]
    fn tags() {
        let mut conn = test_connection();
        let json = br##"[
            {"name": "Breakfast", "color": "#E26C2D", "slug": "breakfast"},
            {"name": "Lunch", "slug": "lunch"},
            {"name": "Brunch", "color": "#49B64E", "slug": "breakfast"}
        ]"##;
        assert_eq!(read_tags(&mut conn, &json[..]).unwrap(), 2);

        let tags = query::list_tags(&mut conn).unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].color.as_deref(), Some("#E26C2D"));
        assert_eq!(tags[1].slug, "lunch");
        assert_eq!(tags[1].color, None);
    }

    #[test]
    fn malformed_file_imports_nothing() {
        let mut conn = test_connection();
        let json = br#"[{"name": "flour"}]"#;
        assert!(matches!(
            read_ingredients(&mut conn, &json[..]),
            Err(Error::Json(_))
        ));
        assert!(query::search_ingredients(&mut conn, None).unwrap().is_empty());
    }
}

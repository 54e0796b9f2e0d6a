// Copyright 2023 Remi Bernotavicius

//! Fixtures shared by the unit tests.

use crate::account::{self, Registration};
use crate::database::models::{IngredientId, NewIngredient, RecipeId, TagId, UserId};
use crate::database::{self, query};
use crate::recipe::{self, IngredientAmount, RecipeDraft, RecipeFields};
use crate::validation::Limits;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;

pub const IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

pub fn user(conn: &mut database::Connection, username: &str) -> UserId {
    let registration = Registration {
        email: format!("{username}@example.com"),
        username: username.into(),
        first_name: username.into(),
        last_name: "Tester".into(),
    };
    account::create_user(conn, &registration).unwrap().0
}

pub fn tag(conn: &mut database::Connection, tag_slug: &str) -> TagId {
    use database::schema::tags::dsl::*;

    diesel::insert_into(tags)
        .values((
            name.eq(tag_slug.to_uppercase()),
            color.eq(Some("#E26C2D")),
            slug.eq(tag_slug),
        ))
        .returning(id)
        .get_result(conn)
        .unwrap()
}

pub fn ingredient(conn: &mut database::Connection, name: &str, unit: &str) -> IngredientId {
    let new = [NewIngredient {
        name: name.into(),
        measurement_unit: unit.into(),
    }];
    assert_eq!(query::insert_ingredients(conn, &new).unwrap(), 1);

    use database::schema::ingredients::dsl;
    dsl::ingredients
        .filter(dsl::name.eq(name))
        .filter(dsl::measurement_unit.eq(unit))
        .select(dsl::id)
        .get_result(conn)
        .unwrap()
}

pub fn draft(tags: &[TagId], ingredients: &[(IngredientId, i32)]) -> RecipeDraft {
    RecipeDraft {
        fields: RecipeFields {
            name: "Pancakes".into(),
            image: IMAGE.into(),
            text: "Mix and fry.".into(),
            cooking_time: 10,
        },
        ingredients: ingredients
            .iter()
            .map(|&(id, amount)| IngredientAmount { id, amount })
            .collect(),
        tags: tags.to_vec(),
    }
}

pub fn recipe(
    conn: &mut database::Connection,
    author: UserId,
    tags: &[TagId],
    ingredients: &[(IngredientId, i32)],
) -> RecipeId {
    recipe::create(conn, &Limits::default(), author, &draft(tags, ingredients)).unwrap()
}

/// A user owning one tagged recipe with a single ingredient.
pub fn user_with_recipe(conn: &mut database::Connection) -> (UserId, RecipeId) {
    let user = user(conn, "alice");
    let tag = tag(conn, "lunch");
    let salt = ingredient(conn, "salt", "g");
    let recipe = recipe(conn, user, &[tag], &[(salt, 5)]);
    (user, recipe)
}

// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{
    AuthToken, Ingredient, IngredientId, NewIngredient, NewTag, NewUser, Recipe, RecipeId, Tag,
    TagId, User, UserId,
};
use diesel::expression_methods::EscapeExpressionMethods as _;
use diesel::expression_methods::TextExpressionMethods as _;
use diesel::prelude::OptionalExtension as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use std::collections::HashSet;

/// Keeps multi-row inserts well below SQLite's bound parameter limit.
const BATCH_SIZE: usize = 500;

pub fn insert_user(conn: &mut database::Connection, new_user: &NewUser<'_>) -> QueryResult<UserId> {
    use database::schema::users::dsl::*;

    diesel::insert_into(users)
        .values(new_user)
        .returning(id)
        .get_result(conn)
}

pub fn email_taken(conn: &mut database::Connection, candidate: &str) -> QueryResult<bool> {
    use database::schema::users::dsl::*;

    diesel::select(diesel::dsl::exists(users.filter(email.eq(candidate)))).get_result(conn)
}

pub fn username_taken(conn: &mut database::Connection, candidate: &str) -> QueryResult<bool> {
    use database::schema::users::dsl::*;

    diesel::select(diesel::dsl::exists(users.filter(username.eq(candidate)))).get_result(conn)
}

pub fn insert_token(
    conn: &mut database::Connection,
    new_key: &str,
    owner: UserId,
) -> QueryResult<()> {
    use database::schema::auth_tokens::dsl::*;

    diesel::insert_into(auth_tokens)
        .values(AuthToken {
            key: new_key,
            user_id: owner,
        })
        .execute(conn)?;
    Ok(())
}

pub fn user_for_token(
    conn: &mut database::Connection,
    token: &str,
) -> QueryResult<Option<UserId>> {
    use database::schema::auth_tokens::dsl::*;

    auth_tokens
        .filter(key.eq(token))
        .select(user_id)
        .get_result(conn)
        .optional()
}

pub fn get_user(conn: &mut database::Connection, user: UserId) -> QueryResult<Option<User>> {
    use database::schema::users::dsl::*;

    users
        .find(user)
        .select(User::as_select())
        .get_result(conn)
        .optional()
}

pub fn get_users(conn: &mut database::Connection, ids: &[UserId]) -> QueryResult<Vec<User>> {
    use database::schema::users::dsl::*;

    users
        .filter(id.eq_any(ids.to_vec()))
        .select(User::as_select())
        .load(conn)
}

pub fn user_exists(conn: &mut database::Connection, user: UserId) -> QueryResult<bool> {
    use database::schema::users::dsl::*;

    diesel::select(diesel::dsl::exists(users.find(user))).get_result(conn)
}

/// Authors `follower` is subscribed to, oldest subscription first.
pub fn followed_authors(
    conn: &mut database::Connection,
    follower: UserId,
) -> QueryResult<Vec<User>> {
    use database::schema::{follows, users};

    follows::table
        .inner_join(users::table)
        .filter(follows::user_id.eq(follower))
        .order(follows::id)
        .select(User::as_select())
        .load(conn)
}

/// Which of `authors` the `follower` is subscribed to.
pub fn followed_among(
    conn: &mut database::Connection,
    follower: UserId,
    authors: &[UserId],
) -> QueryResult<HashSet<UserId>> {
    use database::schema::follows::dsl::*;

    Ok(follows
        .filter(user_id.eq(follower))
        .filter(author_id.eq_any(authors.to_vec()))
        .select(author_id)
        .load::<UserId>(conn)?
        .into_iter()
        .collect())
}

pub fn list_tags(conn: &mut database::Connection) -> QueryResult<Vec<Tag>> {
    use database::schema::tags::dsl::*;

    tags.select(Tag::as_select()).order(id).load(conn)
}

pub fn get_tag(conn: &mut database::Connection, tag: TagId) -> QueryResult<Option<Tag>> {
    use database::schema::tags::dsl::*;

    tags.find(tag)
        .select(Tag::as_select())
        .get_result(conn)
        .optional()
}

pub fn existing_tag_ids(
    conn: &mut database::Connection,
    candidates: &[TagId],
) -> QueryResult<HashSet<TagId>> {
    use database::schema::tags::dsl::*;

    Ok(tags
        .filter(id.eq_any(candidates.to_vec()))
        .select(id)
        .load::<TagId>(conn)?
        .into_iter()
        .collect())
}

pub fn insert_tags(conn: &mut database::Connection, new_tags: &[NewTag]) -> QueryResult<usize> {
    use database::schema::tags::dsl::*;

    // Row at a time: a missing color is a `DEFAULT` value, which SQLite can't batch.
    let mut inserted = 0;
    for new_tag in new_tags {
        inserted += diesel::insert_or_ignore_into(tags)
            .values(new_tag)
            .execute(conn)?;
    }
    Ok(inserted)
}

/// Tags of every recipe in `recipes`, as `(recipe, tag)` pairs.
pub fn tags_for_recipes(
    conn: &mut database::Connection,
    recipes: &[RecipeId],
) -> QueryResult<Vec<(RecipeId, Tag)>> {
    use database::schema::{recipe_tags, tags};

    recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq_any(recipes.to_vec()))
        .order((recipe_tags::recipe_id, tags::id))
        .select((recipe_tags::recipe_id, Tag::as_select()))
        .load(conn)
}

/// Recipes carrying every tag in `slugs`. A slug no tag has matches nothing.
pub fn recipes_with_all_tags(
    conn: &mut database::Connection,
    slugs: &HashSet<String>,
) -> QueryResult<Vec<RecipeId>> {
    use database::schema::{recipe_tags, tags};
    use diesel::dsl::count;

    recipe_tags::table
        .inner_join(tags::table)
        .filter(tags::slug.eq_any(slugs.iter().cloned().collect::<Vec<_>>()))
        .group_by(recipe_tags::recipe_id)
        .having(count(recipe_tags::tag_id).eq(slugs.len() as i64))
        .select(recipe_tags::recipe_id)
        .load(conn)
}

/// Case-insensitive prefix search over ingredient names.
pub fn search_ingredients(
    conn: &mut database::Connection,
    prefix: Option<&str>,
) -> QueryResult<Vec<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    let mut query = ingredients
        .select(Ingredient::as_select())
        .order((name, id))
        .into_boxed();
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        query = query.filter(name.like(format!("{escaped}%")).escape('\\'));
    }
    query.load(conn)
}

pub fn get_ingredient(
    conn: &mut database::Connection,
    ingredient: IngredientId,
) -> QueryResult<Option<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    ingredients
        .find(ingredient)
        .select(Ingredient::as_select())
        .get_result(conn)
        .optional()
}

pub fn existing_ingredient_ids(
    conn: &mut database::Connection,
    candidates: &[IngredientId],
) -> QueryResult<HashSet<IngredientId>> {
    use database::schema::ingredients::dsl::*;

    Ok(ingredients
        .filter(id.eq_any(candidates.to_vec()))
        .select(id)
        .load::<IngredientId>(conn)?
        .into_iter()
        .collect())
}

pub fn insert_ingredients(
    conn: &mut database::Connection,
    new_ingredients: &[NewIngredient],
) -> QueryResult<usize> {
    use database::schema::ingredients::dsl::*;

    let mut inserted = 0;
    for batch in new_ingredients.chunks(BATCH_SIZE) {
        inserted += diesel::insert_or_ignore_into(ingredients)
            .values(batch)
            .execute(conn)?;
    }
    Ok(inserted)
}

/// Ingredient usages of every recipe in `recipes`, as `(recipe, amount, ingredient)`.
pub fn ingredients_for_recipes(
    conn: &mut database::Connection,
    recipes: &[RecipeId],
) -> QueryResult<Vec<(RecipeId, i32, Ingredient)>> {
    use database::schema::{ingredients, recipe_ingredients};

    recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(recipes.to_vec()))
        .order((recipe_ingredients::recipe_id, recipe_ingredients::id))
        .select((
            recipe_ingredients::recipe_id,
            recipe_ingredients::amount,
            Ingredient::as_select(),
        ))
        .load(conn)
}

pub fn get_recipe(conn: &mut database::Connection, recipe: RecipeId) -> QueryResult<Option<Recipe>> {
    use database::schema::recipes::dsl::*;

    recipes
        .find(recipe)
        .select(Recipe::as_select())
        .get_result(conn)
        .optional()
}

pub fn recipe_author(
    conn: &mut database::Connection,
    recipe: RecipeId,
) -> QueryResult<Option<UserId>> {
    use database::schema::recipes::dsl::*;

    recipes
        .find(recipe)
        .select(author_id)
        .get_result(conn)
        .optional()
}

pub fn recipe_exists(conn: &mut database::Connection, recipe: RecipeId) -> QueryResult<bool> {
    use database::schema::recipes::dsl::*;

    diesel::select(diesel::dsl::exists(recipes.find(recipe))).get_result(conn)
}

/// Newest first, optionally capped at `limit`.
pub fn recipes_by_author(
    conn: &mut database::Connection,
    author: UserId,
    limit: Option<i64>,
) -> QueryResult<Vec<Recipe>> {
    use database::schema::recipes::dsl::*;

    let mut query = recipes
        .filter(author_id.eq(author))
        .select(Recipe::as_select())
        .order(id.desc())
        .into_boxed();
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    query.load(conn)
}

pub fn count_recipes_by_author(conn: &mut database::Connection, author: UserId) -> QueryResult<i64> {
    use database::schema::recipes::dsl::*;

    recipes.filter(author_id.eq(author)).count().get_result(conn)
}

pub fn favorite_recipe_ids(
    conn: &mut database::Connection,
    user: UserId,
) -> QueryResult<Vec<RecipeId>> {
    use database::schema::recipe_favorites::dsl::*;

    recipe_favorites
        .filter(user_id.eq(user))
        .select(recipe_id)
        .load(conn)
}

pub fn cart_recipe_ids(conn: &mut database::Connection, user: UserId) -> QueryResult<Vec<RecipeId>> {
    use database::schema::recipe_carts::dsl::*;

    recipe_carts
        .filter(user_id.eq(user))
        .select(recipe_id)
        .load(conn)
}

/// One `(ingredient, amount)` row per ingredient usage of every recipe in the user's cart.
pub fn cart_ingredients(
    conn: &mut database::Connection,
    user: UserId,
) -> QueryResult<Vec<(Ingredient, i32)>> {
    use database::schema::{ingredients, recipe_ingredients};

    let in_cart = cart_recipe_ids(conn, user)?;
    recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(in_cart))
        .select((Ingredient::as_select(), recipe_ingredients::amount))
        .load(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_connection;
    use crate::testing;

    #[test]
    fn ingredient_prefix_search() {
        let mut conn = test_connection();
        testing::ingredient(&mut conn, "flour", "g");
        testing::ingredient(&mut conn, "Flax seeds", "g");
        testing::ingredient(&mut conn, "sunflower oil", "ml");
        testing::ingredient(&mut conn, "f%ke", "g");

        let names = |found: Vec<Ingredient>| -> Vec<String> {
            found.into_iter().map(|i| i.name).collect()
        };

        assert_eq!(
            names(search_ingredients(&mut conn, Some("FL")).unwrap()),
            vec!["Flax seeds".to_string(), "flour".to_string()]
        );
        assert_eq!(
            names(search_ingredients(&mut conn, Some("f%")).unwrap()),
            vec!["f%ke".to_string()]
        );
        assert_eq!(search_ingredients(&mut conn, None).unwrap().len(), 4);
        assert!(search_ingredients(&mut conn, Some("oil")).unwrap().is_empty());
    }

    #[test]
    fn import_skips_duplicates() {
        let mut conn = test_connection();
        let batch = vec![
            NewIngredient {
                name: "salt".into(),
                measurement_unit: "g".into(),
            },
            NewIngredient {
                name: "salt".into(),
                measurement_unit: "g".into(),
            },
            NewIngredient {
                name: "salt".into(),
                measurement_unit: "pinch".into(),
            },
        ];
        assert_eq!(insert_ingredients(&mut conn, &batch).unwrap(), 2);
        assert_eq!(insert_ingredients(&mut conn, &batch).unwrap(), 0);
    }

    #[test]
    fn tag_intersection() {
        let mut conn = test_connection();
        let author = testing::user(&mut conn, "alice");
        let breakfast = testing::tag(&mut conn, "breakfast");
        let vegan = testing::tag(&mut conn, "vegan");
        let flour = testing::ingredient(&mut conn, "flour", "g");

        let only_breakfast = testing::recipe(&mut conn, author, &[breakfast], &[(flour, 1)]);
        let both = testing::recipe(&mut conn, author, &[breakfast, vegan], &[(flour, 1)]);
        testing::recipe(&mut conn, author, &[vegan], &[(flour, 1)]);

        let slugs = |s: &[&str]| s.iter().map(|s| s.to_string()).collect::<HashSet<_>>();

        assert_eq!(
            recipes_with_all_tags(&mut conn, &slugs(&["breakfast", "vegan"])).unwrap(),
            vec![both]
        );
        let mut found = recipes_with_all_tags(&mut conn, &slugs(&["breakfast"])).unwrap();
        found.sort();
        assert_eq!(found, vec![only_breakfast, both]);
        assert!(
            recipes_with_all_tags(&mut conn, &slugs(&["breakfast", "unknown"]))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn subscriptions() {
        let mut conn = test_connection();
        let alice = testing::user(&mut conn, "alice");
        let bob = testing::user(&mut conn, "bob");
        let carol = testing::user(&mut conn, "carol");

        crate::relation::add::<crate::relation::Follow>(&mut conn, alice, carol).unwrap();
        crate::relation::add::<crate::relation::Follow>(&mut conn, alice, bob).unwrap();

        let followed: Vec<_> = followed_authors(&mut conn, alice)
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(followed, vec![carol, bob]);
        assert_eq!(
            followed_among(&mut conn, alice, &[bob, alice]).unwrap(),
            HashSet::from([bob])
        );
        assert!(followed_authors(&mut conn, bob).unwrap().is_empty());
    }
}

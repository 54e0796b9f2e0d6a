// Copyright 2023 Remi Bernotavicius

//! JSON shapes returned by the API, and the queries that assemble them.

use crate::database::models::{IngredientId, Recipe, RecipeId, Tag, User, UserId};
use crate::database::{self, query};
use crate::error::Entity;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShortRecipeView {
    pub id: RecipeId,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<Recipe> for ShortRecipeView {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredientView {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: RecipeId,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// An author the caller follows, along with their newest recipes.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub author: UserView,
    pub recipes: Vec<ShortRecipeView>,
    pub recipes_count: i64,
}

pub fn user_views(
    conn: &mut database::Connection,
    viewer: Option<UserId>,
    users: Vec<User>,
) -> Result<Vec<UserView>> {
    let followed = match viewer {
        Some(viewer) => {
            let ids: Vec<_> = users.iter().map(|u| u.id).collect();
            query::followed_among(conn, viewer, &ids)?
        }
        None => HashSet::new(),
    };
    Ok(users
        .into_iter()
        .map(|user| UserView {
            is_subscribed: followed.contains(&user.id),
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        })
        .collect())
}

pub fn user_view(
    conn: &mut database::Connection,
    viewer: Option<UserId>,
    user: UserId,
) -> Result<UserView> {
    let user = query::get_user(conn, user)?.ok_or(Error::NotFound(Entity::User))?;
    user_views(conn, viewer, vec![user])?
        .pop()
        .ok_or(Error::NotFound(Entity::User))
}

/// Builds full views for `recipes`, keeping their order. Related rows are fetched per batch
/// rather than per recipe.
pub fn recipe_views(
    conn: &mut database::Connection,
    viewer: Option<UserId>,
    recipes: Vec<Recipe>,
) -> Result<Vec<RecipeView>> {
    let ids: Vec<_> = recipes.iter().map(|r| r.id).collect();

    let mut tags: HashMap<RecipeId, Vec<Tag>> = HashMap::new();
    for (recipe, tag) in query::tags_for_recipes(conn, &ids)? {
        tags.entry(recipe).or_default().push(tag);
    }

    let mut ingredients: HashMap<RecipeId, Vec<RecipeIngredientView>> = HashMap::new();
    for (recipe, amount, ingredient) in query::ingredients_for_recipes(conn, &ids)? {
        ingredients
            .entry(recipe)
            .or_default()
            .push(RecipeIngredientView {
                id: ingredient.id,
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount,
            });
    }

    let mut author_ids: Vec<_> = recipes.iter().map(|r| r.author_id).collect();
    author_ids.sort();
    author_ids.dedup();
    let authors = query::get_users(conn, &author_ids)?;
    let authors: HashMap<UserId, UserView> = user_views(conn, viewer, authors)?
        .into_iter()
        .map(|author| (author.id, author))
        .collect();

    let (favorites, cart): (HashSet<_>, HashSet<_>) = match viewer {
        Some(viewer) => (
            query::favorite_recipe_ids(conn, viewer)?.into_iter().collect(),
            query::cart_recipe_ids(conn, viewer)?.into_iter().collect(),
        ),
        None => Default::default(),
    };

    recipes
        .into_iter()
        .map(|recipe| -> Result<RecipeView> {
            let author = authors
                .get(&recipe.author_id)
                .cloned()
                .ok_or(Error::NotFound(Entity::User))?;
            Ok(RecipeView {
                id: recipe.id,
                tags: tags.remove(&recipe.id).unwrap_or_default(),
                author,
                ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorites.contains(&recipe.id),
                is_in_shopping_cart: cart.contains(&recipe.id),
                name: recipe.name,
                image: recipe.image,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}

pub fn recipe_view(
    conn: &mut database::Connection,
    viewer: Option<UserId>,
    recipe: RecipeId,
) -> Result<RecipeView> {
    let recipe = query::get_recipe(conn, recipe)?.ok_or(Error::NotFound(Entity::Recipe))?;
    recipe_views(conn, viewer, vec![recipe])?
        .pop()
        .ok_or(Error::NotFound(Entity::Recipe))
}

pub fn short_recipe_view(
    conn: &mut database::Connection,
    recipe: RecipeId,
) -> Result<ShortRecipeView> {
    let recipe = query::get_recipe(conn, recipe)?.ok_or(Error::NotFound(Entity::Recipe))?;
    Ok(recipe.into())
}

pub fn subscription_view(
    conn: &mut database::Connection,
    viewer: UserId,
    author: User,
    recipes_limit: Option<i64>,
) -> Result<SubscriptionView> {
    let author_id = author.id;
    let author = user_views(conn, Some(viewer), vec![author])?
        .pop()
        .ok_or(Error::NotFound(Entity::User))?;
    let recipes = query::recipes_by_author(conn, author_id, recipes_limit)?
        .into_iter()
        .map(ShortRecipeView::from)
        .collect();
    Ok(SubscriptionView {
        author,
        recipes,
        recipes_count: query::count_recipes_by_author(conn, author_id)?,
    })
}

// Copyright 2023 Remi Bernotavicius

use super::auth::Viewer;
use super::extract::{Path, Payload, Query};
use super::views::{self, RecipeView, ShortRecipeView};
use super::AppState;
use crate::database::models::{RecipeId, TagId};
use crate::filter::{self, RecipeFilter};
use crate::recipe::{self, IngredientAmount, RecipeChanges, RecipeDraft, RecipeFields};
use crate::relation::{self, Cart, Favorite, Toggle};
use crate::shopping_list;
use crate::validation::ValidationError;
use crate::Result;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

/// Body of a recipe create or update. Every field is optional here so that a missing field
/// is reported the same way as any other validation failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecipePayload {
    name: Option<String>,
    image: Option<String>,
    text: Option<String>,
    cooking_time: Option<i32>,
    tags: Option<Vec<TagId>>,
    ingredients: Option<Vec<IngredientAmount>>,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}

impl RecipePayload {
    fn into_draft(self) -> Result<RecipeDraft, ValidationError> {
        Ok(RecipeDraft {
            fields: RecipeFields {
                name: required(self.name, "name")?,
                image: required(self.image, "image")?,
                text: required(self.text, "text")?,
                cooking_time: required(self.cooking_time, "cooking_time")?,
            },
            ingredients: required(self.ingredients, "ingredients")?,
            tags: self.tags.unwrap_or_default(),
        })
    }

    fn into_changes(self) -> RecipeChanges {
        RecipeChanges {
            name: self.name,
            image: self.image,
            text: self.text,
            cooking_time: self.cooking_time,
            ingredients: self.ingredients,
            tags: self.tags,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<RecipeView>>> {
    let filter =
        RecipeFilter::from_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    let Viewer(viewer) = viewer;
    let recipes = state
        .db
        .interact(move |conn| {
            let recipes = filter::list_recipes(conn, viewer, &filter)?;
            views::recipe_views(conn, viewer, recipes)
        })
        .await?;
    Ok(Json(recipes))
}

pub async fn get(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(id): Path<i32>,
) -> Result<Json<RecipeView>> {
    let id = RecipeId::from(id);
    let recipe = state
        .db
        .interact(move |conn| views::recipe_view(conn, viewer, id))
        .await?;
    Ok(Json(recipe))
}

pub async fn create(
    State(state): State<AppState>,
    viewer: Viewer,
    Payload(payload): Payload<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeView>)> {
    let author = viewer.require()?;
    let draft = payload.into_draft()?;
    let limits = state.limits;
    let recipe = state
        .db
        .interact(move |conn| {
            let id = recipe::create(conn, &limits, author, &draft)?;
            views::recipe_view(conn, Some(author), id)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

pub async fn update(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i32>,
    Payload(payload): Payload<RecipePayload>,
) -> Result<Json<RecipeView>> {
    let editor = viewer.require()?;
    let id = RecipeId::from(id);
    let changes = payload.into_changes();
    let limits = state.limits;
    let recipe = state
        .db
        .interact(move |conn| {
            recipe::update(conn, &limits, editor, id, &changes)?;
            views::recipe_view(conn, Some(editor), id)
        })
        .await?;
    Ok(Json(recipe))
}

pub async fn delete(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let editor = viewer.require()?;
    let id = RecipeId::from(id);
    state
        .db
        .interact(move |conn| recipe::delete(conn, editor, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add<T: Toggle<Target = RecipeId> + 'static>(
    state: AppState,
    viewer: Viewer,
    id: i32,
) -> Result<(StatusCode, Json<ShortRecipeView>)> {
    let user = viewer.require()?;
    let id = RecipeId::from(id);
    let recipe = state
        .db
        .interact(move |conn| {
            relation::add::<T>(conn, user, id)?;
            views::short_recipe_view(conn, id)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn remove<T: Toggle<Target = RecipeId> + 'static>(
    state: AppState,
    viewer: Viewer,
    id: i32,
) -> Result<StatusCode> {
    let user = viewer.require()?;
    let id = RecipeId::from(id);
    state
        .db
        .interact(move |conn| relation::remove::<T>(conn, user, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<ShortRecipeView>)> {
    add::<Favorite>(state, viewer, id).await
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    remove::<Favorite>(state, viewer, id).await
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<ShortRecipeView>)> {
    add::<Cart>(state, viewer, id).await
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    remove::<Cart>(state, viewer, id).await
}

pub async fn download_shopping_cart(
    State(state): State<AppState>,
    viewer: Viewer,
) -> Result<impl IntoResponse> {
    let user = viewer.require()?;
    let csv = state
        .db
        .interact(move |conn| shopping_list::render_csv(&shopping_list::for_user(conn, user)?))
        .await?;
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"cart.csv\""),
        ],
        csv,
    ))
}

// Copyright 2023 Remi Bernotavicius

//! Read-only tag and ingredient endpoints.

use super::extract::{Path, Query};
use super::AppState;
use crate::database::models::{Ingredient, IngredientId, Tag, TagId};
use crate::database::query;
use crate::error::Entity;
use crate::{Error, Result};
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct IngredientSearch {
    name: Option<String>,
}

pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>> {
    let tags = state
        .db
        .interact(|conn| Ok(query::list_tags(conn)?))
        .await?;
    Ok(Json(tags))
}

pub async fn get_tag(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Tag>> {
    let id = TagId::from(id);
    let tag = state
        .db
        .interact(move |conn| query::get_tag(conn, id)?.ok_or(Error::NotFound(Entity::Tag)))
        .await?;
    Ok(Json(tag))
}

pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(search): Query<IngredientSearch>,
) -> Result<Json<Vec<Ingredient>>> {
    let ingredients = state
        .db
        .interact(move |conn| Ok(query::search_ingredients(conn, search.name.as_deref())?))
        .await?;
    Ok(Json(ingredients))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Ingredient>> {
    let id = IngredientId::from(id);
    let ingredient = state
        .db
        .interact(move |conn| {
            query::get_ingredient(conn, id)?.ok_or(Error::NotFound(Entity::Ingredient))
        })
        .await?;
    Ok(Json(ingredient))
}

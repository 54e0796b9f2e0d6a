// Copyright 2023 Remi Bernotavicius

use super::auth::Viewer;
use super::extract::{Path, Query};
use super::views::{self, SubscriptionView, UserView};
use super::AppState;
use crate::database::models::UserId;
use crate::database::query;
use crate::error::Entity;
use crate::relation::{self, Follow};
use crate::validation::ValidationError;
use crate::{Error, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimit {
    recipes_limit: Option<String>,
}

impl RecipesLimit {
    fn parse(&self) -> Result<Option<i64>, ValidationError> {
        let Some(value) = &self.recipes_limit else {
            return Ok(None);
        };
        match value.trim().parse::<i64>() {
            Ok(limit) if limit >= 0 => Ok(Some(limit)),
            _ => Err(ValidationError::InvalidNumber {
                field: "recipes_limit",
                value: value.clone(),
            }),
        }
    }
}

pub async fn me(State(state): State<AppState>, viewer: Viewer) -> Result<Json<UserView>> {
    let me = viewer.require()?;
    let user = state
        .db
        .interact(move |conn| views::user_view(conn, Some(me), me))
        .await?;
    Ok(Json(user))
}

pub async fn get(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(id): Path<i32>,
) -> Result<Json<UserView>> {
    let id = UserId::from(id);
    let user = state
        .db
        .interact(move |conn| views::user_view(conn, viewer, id))
        .await?;
    Ok(Json(user))
}

pub async fn subscriptions(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<RecipesLimit>,
) -> Result<Json<Vec<SubscriptionView>>> {
    let me = viewer.require()?;
    let limit = params.parse()?;
    let authors = state
        .db
        .interact(move |conn| {
            query::followed_authors(conn, me)?
                .into_iter()
                .map(|author| views::subscription_view(conn, me, author, limit))
                .collect::<Result<Vec<_>>>()
        })
        .await?;
    Ok(Json(authors))
}

pub async fn subscribe(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i32>,
    Query(params): Query<RecipesLimit>,
) -> Result<(StatusCode, Json<SubscriptionView>)> {
    let me = viewer.require()?;
    let author = UserId::from(id);
    let limit = params.parse()?;
    let subscription = state
        .db
        .interact(move |conn| {
            relation::add::<Follow>(conn, me, author)?;
            let author = query::get_user(conn, author)?.ok_or(Error::NotFound(Entity::User))?;
            views::subscription_view(conn, me, author, limit)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let me = viewer.require()?;
    let author = UserId::from(id);
    state
        .db
        .interact(move |conn| relation::remove::<Follow>(conn, me, author))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[test]
fn recipes_limit() {
    let parse = |value: Option<&str>| {
        RecipesLimit {
            recipes_limit: value.map(String::from),
        }
        .parse()
    };
    assert_eq!(parse(None), Ok(None));
    assert_eq!(parse(Some("3")), Ok(Some(3)));
    assert!(parse(Some("-1")).is_err());
    assert!(parse(Some("many")).is_err());
}

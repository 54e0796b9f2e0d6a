// Copyright 2023 Remi Bernotavicius

//! Narrowing of recipe listings.

use crate::database::models::{Recipe, RecipeId, UserId};
use crate::database::{self, query};
use crate::validation::ValidationError;
use crate::Result;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use std::collections::HashSet;

type RecipeQuery = database::schema::recipes::BoxedQuery<'static, diesel::sqlite::Sqlite>;

/// A `0`/`1` flag over one of the caller's membership sets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Membership {
    /// `0`: leave out recipes in the set.
    Excluded,
    /// `1`: keep only recipes in the set.
    Required,
}

impl Membership {
    fn parse(field: &'static str, value: &str) -> Result<Self, ValidationError> {
        match value.trim() {
            "0" => Ok(Self::Excluded),
            "1" => Ok(Self::Required),
            other => Err(ValidationError::InvalidChoice {
                field,
                value: other.into(),
            }),
        }
    }

    fn apply(self, query: RecipeQuery, members: Vec<RecipeId>) -> RecipeQuery {
        use database::schema::recipes::dsl::*;

        match self {
            Self::Excluded => query.filter(id.ne_all(members)),
            Self::Required => query.filter(id.eq_any(members)),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<UserId>,
    pub tags: HashSet<String>,
    pub is_favorited: Option<Membership>,
    pub is_in_shopping_cart: Option<Membership>,
}

impl RecipeFilter {
    /// Builds a filter from raw query parameters. `tags` may repeat and may hold a comma
    /// separated list. Unknown parameters are ignored.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ValidationError> {
        let mut filter = Self::default();
        for (key, value) in pairs {
            match key {
                "author" => {
                    let author = value.trim().parse::<i32>().map_err(|_| {
                        ValidationError::InvalidNumber {
                            field: "author",
                            value: value.into(),
                        }
                    })?;
                    filter.author = Some(UserId::from(author));
                }
                "tags" => filter.tags.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|slug| !slug.is_empty())
                        .map(String::from),
                ),
                "is_favorited" => {
                    filter.is_favorited = Some(Membership::parse("is_favorited", value)?)
                }
                "is_in_shopping_cart" => {
                    filter.is_in_shopping_cart = Some(Membership::parse("is_in_shopping_cart", value)?)
                }
                _ => {}
            }
        }
        Ok(filter)
    }

    fn needs_viewer(&self) -> bool {
        self.is_favorited.is_some() || self.is_in_shopping_cart.is_some()
    }
}

/// Recipes matching `filter`, newest first. Membership flags from an anonymous caller match
/// nothing.
pub fn list_recipes(
    conn: &mut database::Connection,
    viewer: Option<UserId>,
    filter: &RecipeFilter,
) -> Result<Vec<Recipe>> {
    use database::schema::recipes::dsl::*;

    if filter.needs_viewer() && viewer.is_none() {
        return Ok(vec![]);
    }

    let mut query: RecipeQuery = recipes.order(id.desc()).into_boxed();
    if let Some(author) = filter.author {
        query = query.filter(author_id.eq(author));
    }
    if !filter.tags.is_empty() {
        query = query.filter(id.eq_any(query::recipes_with_all_tags(conn, &filter.tags)?));
    }
    if let Some(user) = viewer {
        if let Some(membership) = filter.is_favorited {
            query = membership.apply(query, query::favorite_recipe_ids(conn, user)?);
        }
        if let Some(membership) = filter.is_in_shopping_cart {
            query = membership.apply(query, query::cart_recipe_ids(conn, user)?);
        }
    }

    Ok(query.load::<Recipe>(conn)?)
}

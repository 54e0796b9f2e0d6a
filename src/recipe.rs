// Copyright 2023 Remi Bernotavicius

use crate::database::models::{
    IngredientId, NewRecipe, NewRecipeIngredient, NewRecipeTag, RecipeChangeset, RecipeId, TagId,
    UserId,
};
use crate::database::{self, query};
use crate::error::Entity;
use crate::validation::{self, Known, Limits, Submission};
use crate::{Error, Result};
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub id: IngredientId,
    pub amount: i32,
}

#[derive(Debug, Clone)]
pub struct RecipeFields {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Everything needed to create a recipe.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub fields: RecipeFields,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<TagId>,
}

/// A partial update. Supplied ingredient or tag lists replace the stored ones wholesale.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<TagId>>,
}

fn known(
    conn: &mut database::Connection,
    tags: &[TagId],
    ingredients: &[IngredientAmount],
) -> Result<Known> {
    let ingredient_ids: Vec<_> = ingredients.iter().map(|i| i.id).collect();
    Ok(Known {
        tags: query::existing_tag_ids(conn, tags)?,
        ingredients: query::existing_ingredient_ids(conn, &ingredient_ids)?,
    })
}

fn replace_ingredients(
    conn: &mut database::Connection,
    recipe: RecipeId,
    ingredients: &[IngredientAmount],
) -> Result<()> {
    use database::schema::recipe_ingredients::dsl::*;

    diesel::delete(recipe_ingredients.filter(recipe_id.eq(recipe))).execute(conn)?;

    let rows: Vec<_> = ingredients
        .iter()
        .map(|i| NewRecipeIngredient {
            recipe_id: recipe,
            ingredient_id: i.id,
            amount: i.amount,
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(recipe_ingredients)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

fn replace_tags(conn: &mut database::Connection, recipe: RecipeId, tags: &[TagId]) -> Result<()> {
    use database::schema::recipe_tags::dsl::*;

    diesel::delete(recipe_tags.filter(recipe_id.eq(recipe))).execute(conn)?;

    let rows: Vec<_> = tags
        .iter()
        .map(|t| NewRecipeTag {
            recipe_id: recipe,
            tag_id: *t,
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(recipe_tags).values(&rows).execute(conn)?;
    }
    Ok(())
}

/// Only the author may change or delete a recipe.
fn check_author(
    conn: &mut database::Connection,
    recipe: RecipeId,
    editor: UserId,
) -> Result<()> {
    let author = query::recipe_author(conn, recipe)?.ok_or(Error::NotFound(Entity::Recipe))?;
    if author != editor {
        return Err(Error::PermissionDenied);
    }
    Ok(())
}

pub fn create(
    conn: &mut database::Connection,
    limits: &Limits,
    author: UserId,
    draft: &RecipeDraft,
) -> Result<RecipeId> {
    conn.immediate_transaction(|conn| {
        let known = known(conn, &draft.tags, &draft.ingredients)?;
        let submission = Submission {
            name: Some(&draft.fields.name),
            text: Some(&draft.fields.text),
            cooking_time: Some(draft.fields.cooking_time),
            image: Some(&draft.fields.image),
            tags: Some(&draft.tags),
            ingredients: Some(&draft.ingredients),
        };
        validation::run(validation::CREATE, &submission, &known, limits)?;

        let new_recipe = NewRecipe {
            name: &draft.fields.name,
            image: &draft.fields.image,
            text: &draft.fields.text,
            cooking_time: draft.fields.cooking_time,
            author_id: author,
        };
        let id: RecipeId = {
            use database::schema::recipes::dsl::*;
            diesel::insert_into(recipes)
                .values(new_recipe)
                .returning(id)
                .get_result(conn)?
        };

        replace_ingredients(conn, id, &draft.ingredients)?;
        replace_tags(conn, id, &draft.tags)?;

        log::info!("user {author} created recipe {id}");
        Ok(id)
    })
}

pub fn update(
    conn: &mut database::Connection,
    limits: &Limits,
    editor: UserId,
    recipe: RecipeId,
    changes: &RecipeChanges,
) -> Result<()> {
    conn.immediate_transaction(|conn| {
        check_author(conn, recipe, editor)?;

        let known = known(
            conn,
            changes.tags.as_deref().unwrap_or_default(),
            changes.ingredients.as_deref().unwrap_or_default(),
        )?;
        let submission = Submission {
            name: changes.name.as_deref(),
            text: changes.text.as_deref(),
            cooking_time: changes.cooking_time,
            image: changes.image.as_deref(),
            tags: changes.tags.as_deref(),
            ingredients: changes.ingredients.as_deref(),
        };
        validation::run(validation::UPDATE, &submission, &known, limits)?;

        let changeset = RecipeChangeset {
            name: changes.name.as_deref(),
            image: changes.image.as_deref(),
            text: changes.text.as_deref(),
            cooking_time: changes.cooking_time,
        };
        if !changeset.is_empty() {
            use database::schema::recipes::dsl::*;
            diesel::update(recipes.find(recipe))
                .set(&changeset)
                .execute(conn)?;
        }
        if let Some(ingredients) = &changes.ingredients {
            replace_ingredients(conn, recipe, ingredients)?;
        }
        if let Some(tags) = &changes.tags {
            replace_tags(conn, recipe, tags)?;
        }

        log::info!("user {editor} updated recipe {recipe}");
        Ok(())
    })
}

/// Removes the recipe. Ingredient rows, tag links, favorites and cart entries go with it.
pub fn delete(conn: &mut database::Connection, editor: UserId, recipe: RecipeId) -> Result<()> {
    conn.immediate_transaction(|conn| {
        check_author(conn, recipe, editor)?;

        use database::schema::recipes::dsl::*;
        diesel::delete(recipes.find(recipe)).execute(conn)?;

        log::info!("user {editor} deleted recipe {recipe}");
        Ok(())
    })
}

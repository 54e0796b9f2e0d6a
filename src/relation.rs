// Copyright 2023 Remi Bernotavicius

//! Add/remove operations over the unique `(user, target)` relations: subscriptions,
//! favorites and the shopping cart.

use crate::database::models::{NewCartEntry, NewFavorite, NewFollow, RecipeId, UserId};
use crate::database::{self, query};
use crate::error::Entity;
use crate::{Error, Result};
use derive_more::Display;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use thiserror::Error;

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
pub enum Relation {
    #[display("subscription")]
    Follow,
    #[display("favorite")]
    Favorite,
    #[display("shopping cart")]
    Cart,
}

impl Relation {
    fn already_exists(&self) -> &'static str {
        match self {
            Self::Follow => "you are already subscribed to this author",
            Self::Favorite => "the recipe is already in favorites",
            Self::Cart => "the recipe is already in the shopping cart",
        }
    }

    fn missing(&self) -> &'static str {
        match self {
            Self::Follow => "the subscription does not exist",
            Self::Favorite => "the recipe is not in favorites",
            Self::Cart => "the recipe is not in the shopping cart",
        }
    }
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RelationError {
    #[error("{}", .0.already_exists())]
    AlreadyExists(Relation),

    #[error("{}", .0.missing())]
    NotFound(Relation),

    #[error("you cannot subscribe to yourself")]
    SelfReferenceNotAllowed,
}

pub trait Toggle {
    type Target: Copy + std::fmt::Display;

    const RELATION: Relation;
    const TARGET: Entity;

    fn target_exists(conn: &mut database::Connection, target: Self::Target) -> QueryResult<bool>;

    fn insert(
        conn: &mut database::Connection,
        user: UserId,
        target: Self::Target,
    ) -> QueryResult<usize>;

    /// Returns the number of rows removed.
    fn delete(
        conn: &mut database::Connection,
        user: UserId,
        target: Self::Target,
    ) -> QueryResult<usize>;

    fn check(_user: UserId, _target: Self::Target) -> Result<(), RelationError> {
        Ok(())
    }
}

pub struct Follow;

impl Toggle for Follow {
    type Target = UserId;

    const RELATION: Relation = Relation::Follow;
    const TARGET: Entity = Entity::User;

    fn target_exists(conn: &mut database::Connection, target: UserId) -> QueryResult<bool> {
        query::user_exists(conn, target)
    }

    fn insert(conn: &mut database::Connection, user: UserId, target: UserId) -> QueryResult<usize> {
        use database::schema::follows::dsl::*;

        diesel::insert_into(follows)
            .values(NewFollow {
                user_id: user,
                author_id: target,
            })
            .execute(conn)
    }

    fn delete(conn: &mut database::Connection, user: UserId, target: UserId) -> QueryResult<usize> {
        use database::schema::follows::dsl::*;

        diesel::delete(follows.filter(user_id.eq(user)).filter(author_id.eq(target))).execute(conn)
    }

    fn check(user: UserId, target: UserId) -> Result<(), RelationError> {
        if user == target {
            return Err(RelationError::SelfReferenceNotAllowed);
        }
        Ok(())
    }
}

pub struct Favorite;

impl Toggle for Favorite {
    type Target = RecipeId;

    const RELATION: Relation = Relation::Favorite;
    const TARGET: Entity = Entity::Recipe;

    fn target_exists(conn: &mut database::Connection, target: RecipeId) -> QueryResult<bool> {
        query::recipe_exists(conn, target)
    }

    fn insert(
        conn: &mut database::Connection,
        user: UserId,
        target: RecipeId,
    ) -> QueryResult<usize> {
        use database::schema::recipe_favorites::dsl::*;

        diesel::insert_into(recipe_favorites)
            .values(NewFavorite {
                user_id: user,
                recipe_id: target,
            })
            .execute(conn)
    }

    fn delete(
        conn: &mut database::Connection,
        user: UserId,
        target: RecipeId,
    ) -> QueryResult<usize> {
        use database::schema::recipe_favorites::dsl::*;

        diesel::delete(
            recipe_favorites
                .filter(user_id.eq(user))
                .filter(recipe_id.eq(target)),
        )
        .execute(conn)
    }
}

pub struct Cart;

impl Toggle for Cart {
    type Target = RecipeId;

    const RELATION: Relation = Relation::Cart;
    const TARGET: Entity = Entity::Recipe;

    fn target_exists(conn: &mut database::Connection, target: RecipeId) -> QueryResult<bool> {
        query::recipe_exists(conn, target)
    }

    fn insert(
        conn: &mut database::Connection,
        user: UserId,
        target: RecipeId,
    ) -> QueryResult<usize> {
        use database::schema::recipe_carts::dsl::*;

        diesel::insert_into(recipe_carts)
            .values(NewCartEntry {
                user_id: user,
                recipe_id: target,
            })
            .execute(conn)
    }

    fn delete(
        conn: &mut database::Connection,
        user: UserId,
        target: RecipeId,
    ) -> QueryResult<usize> {
        use database::schema::recipe_carts::dsl::*;

        diesel::delete(recipe_carts.filter(user_id.eq(user)).filter(recipe_id.eq(target)))
            .execute(conn)
    }
}

/// The unique index decides whether the pair already exists, so two identical concurrent
/// requests can't both succeed.
pub fn add<T: Toggle>(conn: &mut database::Connection, user: UserId, target: T::Target) -> Result<()> {
    T::check(user, target)?;
    conn.immediate_transaction(|conn| {
        if !T::target_exists(conn, target)? {
            return Err(Error::NotFound(T::TARGET));
        }
        match T::insert(conn, user, target) {
            Ok(_) => {
                log::debug!("user {user} added {} {target}", T::RELATION);
                Ok(())
            }
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(RelationError::AlreadyExists(T::RELATION).into())
            }
            Err(e) => Err(e.into()),
        }
    })
}

pub fn remove<T: Toggle>(
    conn: &mut database::Connection,
    user: UserId,
    target: T::Target,
) -> Result<()> {
    T::check(user, target)?;
    conn.immediate_transaction(|conn| {
        if !T::target_exists(conn, target)? {
            return Err(Error::NotFound(T::TARGET));
        }
        if T::delete(conn, user, target)? == 0 {
            return Err(RelationError::NotFound(T::RELATION).into());
        }
        log::debug!("user {user} removed {} {target}", T::RELATION);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_connection;
    use crate::testing;

    fn relation_error(result: Result<()>) -> RelationError {
        match result {
            Err(Error::Relation(e)) => e,
            other => panic!("expected a relation error, got {other:?}"),
        }
    }

    #[test]
    fn second_favorite_is_rejected() {
        let mut conn = test_connection();
        let (user, recipe) = testing::user_with_recipe(&mut conn);

        add::<Favorite>(&mut conn, user, recipe).unwrap();
        assert_eq!(
            relation_error(add::<Favorite>(&mut conn, user, recipe)),
            RelationError::AlreadyExists(Relation::Favorite)
        );
        assert_eq!(query::favorite_recipe_ids(&mut conn, user).unwrap(), vec![recipe]);
    }

    #[test]
    fn removing_absent_cart_entry() {
        let mut conn = test_connection();
        let (user, recipe) = testing::user_with_recipe(&mut conn);
        let other = testing::user(&mut conn, "bob");
        add::<Cart>(&mut conn, other, recipe).unwrap();

        assert_eq!(
            relation_error(remove::<Cart>(&mut conn, user, recipe)),
            RelationError::NotFound(Relation::Cart)
        );
        assert!(query::cart_recipe_ids(&mut conn, user).unwrap().is_empty());
        assert_eq!(query::cart_recipe_ids(&mut conn, other).unwrap(), vec![recipe]);
    }

    #[test]
    fn cart_round_trip() {
        let mut conn = test_connection();
        let (user, recipe) = testing::user_with_recipe(&mut conn);

        add::<Cart>(&mut conn, user, recipe).unwrap();
        remove::<Cart>(&mut conn, user, recipe).unwrap();
        assert!(query::cart_recipe_ids(&mut conn, user).unwrap().is_empty());
        add::<Cart>(&mut conn, user, recipe).unwrap();
    }

    #[test]
    fn self_follow_always_rejected() {
        let mut conn = test_connection();
        let alice = testing::user(&mut conn, "alice");
        let bob = testing::user(&mut conn, "bob");

        assert_eq!(
            relation_error(add::<Follow>(&mut conn, alice, alice)),
            RelationError::SelfReferenceNotAllowed
        );
        add::<Follow>(&mut conn, bob, alice).unwrap();
        assert_eq!(
            relation_error(add::<Follow>(&mut conn, alice, alice)),
            RelationError::SelfReferenceNotAllowed
        );
        assert_eq!(
            relation_error(add::<Follow>(&mut conn, UserId::from(99), UserId::from(99))),
            RelationError::SelfReferenceNotAllowed
        );
    }

    #[test]
    fn follow_toggle() {
        let mut conn = test_connection();
        let alice = testing::user(&mut conn, "alice");
        let bob = testing::user(&mut conn, "bob");

        add::<Follow>(&mut conn, alice, bob).unwrap();
        assert_eq!(
            relation_error(add::<Follow>(&mut conn, alice, bob)),
            RelationError::AlreadyExists(Relation::Follow)
        );
        remove::<Follow>(&mut conn, alice, bob).unwrap();
        assert_eq!(
            relation_error(remove::<Follow>(&mut conn, alice, bob)),
            RelationError::NotFound(Relation::Follow)
        );
    }

    #[test]
    fn missing_target() {
        let mut conn = test_connection();
        let alice = testing::user(&mut conn, "alice");

        assert!(matches!(
            add::<Favorite>(&mut conn, alice, RecipeId::from(7)),
            Err(Error::NotFound(Entity::Recipe))
        ));
        assert!(matches!(
            remove::<Follow>(&mut conn, alice, UserId::from(7)),
            Err(Error::NotFound(Entity::User))
        ));
    }
}

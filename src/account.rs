// Copyright 2023 Remi Bernotavicius

use crate::database::models::{NewUser, UserId};
use crate::database::{self, query};
use crate::validation::ValidationError;
use crate::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates the user and issues their first API token.
pub fn create_user(
    conn: &mut database::Connection,
    registration: &Registration,
) -> Result<(UserId, String)> {
    let email = normalize_email(&registration.email);
    let username = registration.username.trim();
    for (field, value) in [("email", email.as_str()), ("username", username)] {
        if value.is_empty() {
            return Err(ValidationError::MissingField(field).into());
        }
    }

    conn.immediate_transaction(|conn| {
        if query::email_taken(conn, &email)? {
            return Err(ValidationError::Taken("email").into());
        }
        if query::username_taken(conn, username)? {
            return Err(ValidationError::Taken("username").into());
        }

        let id = query::insert_user(
            conn,
            &NewUser {
                email: &email,
                username,
                first_name: registration.first_name.trim(),
                last_name: registration.last_name.trim(),
            },
        )?;
        let token = issue_token(conn, id)?;

        log::info!("created user {username} ({id})");
        Ok((id, token))
    })
}

pub fn issue_token(conn: &mut database::Connection, user: UserId) -> Result<String> {
    let key = uuid::Uuid::new_v4().simple().to_string();
    query::insert_token(conn, &key, user)?;
    Ok(key)
}

pub fn resolve_token(conn: &mut database::Connection, key: &str) -> Result<UserId> {
    query::user_for_token(conn, key)?.ok_or(Error::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_connection;

    fn registration(email: &str, username: &str) -> Registration {
        Registration {
            email: email.into(),
            username: username.into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        }
    }

    fn validation_error(result: Result<(UserId, String)>) -> ValidationError {
        match result {
            Err(Error::Validation(e)) => e,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn email_is_lowercased() {
        let mut conn = test_connection();
        let (id, _) = create_user(&mut conn, &registration(" Ada@Example.COM ", "ada")).unwrap();

        let user = query::get_user(&mut conn, id).unwrap().unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.username, "ada");
    }

    #[test]
    fn taken_email_or_username() {
        let mut conn = test_connection();
        create_user(&mut conn, &registration("ada@example.com", "ada")).unwrap();

        assert_eq!(
            validation_error(create_user(
                &mut conn,
                &registration("ADA@example.com", "countess")
            )),
            ValidationError::Taken("email")
        );
        assert_eq!(
            validation_error(create_user(&mut conn, &registration("other@example.com", "ada"))),
            ValidationError::Taken("username")
        );
        assert_eq!(
            validation_error(create_user(&mut conn, &registration(" ", "nobody"))),
            ValidationError::MissingField("email")
        );
    }

    #[test]
    fn tokens_resolve_to_their_owner() {
        let mut conn = test_connection();
        let (ada, first) = create_user(&mut conn, &registration("ada@example.com", "ada")).unwrap();
        let (bob, _) = create_user(&mut conn, &registration("bob@example.com", "bob")).unwrap();
        let second = issue_token(&mut conn, ada).unwrap();

        assert_eq!(first.len(), 32);
        assert_ne!(first, second);
        assert_eq!(resolve_token(&mut conn, &first).unwrap(), ada);
        assert_eq!(resolve_token(&mut conn, &second).unwrap(), ada);
        assert_ne!(resolve_token(&mut conn, &first).unwrap(), bob);
        assert!(matches!(
            resolve_token(&mut conn, "nope"),
            Err(Error::Unauthorized)
        ));
    }
}

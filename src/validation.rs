// Copyright 2023 Remi Bernotavicius

//! Consistency checks for recipe submissions.
//!
//! Every write operation has its own ordered list of named validators. They are pure: the
//! caller fetches which of the submitted tag and ingredient ids exist and passes that in as
//! [`Known`], so running the list never touches the database.

use crate::database::models::{IngredientId, TagId};
use crate::recipe::IngredientAmount;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("this field is required")]
    MissingField(&'static str),

    #[error("this field may not be blank")]
    BlankField(&'static str),

    #[error("{message}")]
    Malformed {
        field: &'static str,
        message: String,
    },

    #[error("at least one tag is required")]
    MissingTags,

    #[error("unknown tag id {0}")]
    InvalidTagReference(TagId),

    #[error("tag {0} is listed more than once")]
    DuplicateTag(TagId),

    #[error("unknown ingredient id {0}")]
    InvalidIngredientReference(IngredientId),

    #[error("ingredient {0} is listed more than once")]
    DuplicateIngredient(IngredientId),

    #[error("amount of ingredient {ingredient} must be at least {min}")]
    AmountTooSmall { ingredient: IngredientId, min: i32 },

    #[error("cooking time must be at least {min} minute(s)")]
    CookingTimeTooShort { min: i32 },

    #[error("image must be base64 encoded data")]
    InvalidImage,

    #[error("a user with this {0} already exists")]
    Taken(&'static str),

    #[error("expected 0 or 1, got {value:?}")]
    InvalidChoice { field: &'static str, value: String },

    #[error("expected a whole number, got {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

impl ValidationError {
    /// The request field the error is reported under.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField(field) | Self::BlankField(field) | Self::Taken(field) => field,
            Self::InvalidChoice { field, .. }
            | Self::InvalidNumber { field, .. }
            | Self::Malformed { field, .. } => field,
            Self::MissingTags | Self::InvalidTagReference(_) | Self::DuplicateTag(_) => "tags",
            Self::InvalidIngredientReference(_)
            | Self::DuplicateIngredient(_)
            | Self::AmountTooSmall { .. } => "ingredients",
            Self::CookingTimeTooShort { .. } => "cooking_time",
            Self::InvalidImage => "image",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Limits {
    pub min_cooking_time: i32,
    pub min_ingredient_amount: i32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_cooking_time: 1,
            min_ingredient_amount: 1,
        }
    }
}

/// The parts of a recipe write that need checking. `None` means the field was not supplied.
#[derive(Debug, Default, Clone, Copy)]
pub struct Submission<'a> {
    pub name: Option<&'a str>,
    pub text: Option<&'a str>,
    pub cooking_time: Option<i32>,
    pub image: Option<&'a str>,
    pub tags: Option<&'a [TagId]>,
    pub ingredients: Option<&'a [IngredientAmount]>,
}

/// Which of the submitted ids exist in the store.
#[derive(Debug, Default, Clone)]
pub struct Known {
    pub tags: HashSet<TagId>,
    pub ingredients: HashSet<IngredientId>,
}

pub type Check = fn(&Submission<'_>, &Known, &Limits) -> Result<(), ValidationError>;

pub struct Validator {
    pub name: &'static str,
    pub check: Check,
}

pub const CREATE: &[Validator] = &[
    Validator {
        name: "name_present",
        check: name_present,
    },
    Validator {
        name: "text_present",
        check: text_present,
    },
    Validator {
        name: "tags_present",
        check: tags_present,
    },
    Validator {
        name: "tag_references",
        check: tag_references,
    },
    Validator {
        name: "unique_tags",
        check: unique_tags,
    },
    Validator {
        name: "ingredient_references",
        check: ingredient_references,
    },
    Validator {
        name: "unique_ingredients",
        check: unique_ingredients,
    },
    Validator {
        name: "ingredient_amounts",
        check: ingredient_amounts,
    },
    Validator {
        name: "cooking_time",
        check: cooking_time,
    },
    Validator {
        name: "image",
        check: image,
    },
];

pub const UPDATE: &[Validator] = &[
    Validator {
        name: "name_present",
        check: name_present,
    },
    Validator {
        name: "text_present",
        check: text_present,
    },
    Validator {
        name: "supplied_tags_present",
        check: supplied_tags_present,
    },
    Validator {
        name: "tag_references",
        check: tag_references,
    },
    Validator {
        name: "unique_tags",
        check: unique_tags,
    },
    Validator {
        name: "ingredient_references",
        check: ingredient_references,
    },
    Validator {
        name: "unique_ingredients",
        check: unique_ingredients,
    },
    Validator {
        name: "ingredient_amounts",
        check: ingredient_amounts,
    },
    Validator {
        name: "cooking_time",
        check: cooking_time,
    },
    Validator {
        name: "image",
        check: image,
    },
];

/// Runs `validators` in order and stops at the first failure.
pub fn run(
    validators: &[Validator],
    submission: &Submission<'_>,
    known: &Known,
    limits: &Limits,
) -> Result<(), ValidationError> {
    for Validator { name, check } in validators {
        log::debug!("running validator {name}");
        check(submission, known, limits)?;
    }
    Ok(())
}

/// A supplied text field must have something besides whitespace in it.
fn not_blank(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(value) if value.trim().is_empty() => Err(ValidationError::BlankField(field)),
        _ => Ok(()),
    }
}

fn name_present(s: &Submission<'_>, _: &Known, _: &Limits) -> Result<(), ValidationError> {
    not_blank("name", s.name)
}

fn text_present(s: &Submission<'_>, _: &Known, _: &Limits) -> Result<(), ValidationError> {
    not_blank("text", s.text)
}

fn tags_present(s: &Submission<'_>, _: &Known, _: &Limits) -> Result<(), ValidationError> {
    match s.tags {
        Some(tags) if !tags.is_empty() => Ok(()),
        _ => Err(ValidationError::MissingTags),
    }
}

fn supplied_tags_present(s: &Submission<'_>, _: &Known, _: &Limits) -> Result<(), ValidationError> {
    match s.tags {
        Some([]) => Err(ValidationError::MissingTags),
        _ => Ok(()),
    }
}

fn tag_references(s: &Submission<'_>, known: &Known, _: &Limits) -> Result<(), ValidationError> {
    for tag in s.tags.unwrap_or_default() {
        if !known.tags.contains(tag) {
            return Err(ValidationError::InvalidTagReference(*tag));
        }
    }
    Ok(())
}

fn unique_tags(s: &Submission<'_>, _: &Known, _: &Limits) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for tag in s.tags.unwrap_or_default() {
        if !seen.insert(tag) {
            return Err(ValidationError::DuplicateTag(*tag));
        }
    }
    Ok(())
}

fn ingredient_references(
    s: &Submission<'_>,
    known: &Known,
    _: &Limits,
) -> Result<(), ValidationError> {
    for i in s.ingredients.unwrap_or_default() {
        if !known.ingredients.contains(&i.id) {
            return Err(ValidationError::InvalidIngredientReference(i.id));
        }
    }
    Ok(())
}

fn unique_ingredients(s: &Submission<'_>, _: &Known, _: &Limits) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for i in s.ingredients.unwrap_or_default() {
        if !seen.insert(i.id) {
            return Err(ValidationError::DuplicateIngredient(i.id));
        }
    }
    Ok(())
}

fn ingredient_amounts(
    s: &Submission<'_>,
    _: &Known,
    limits: &Limits,
) -> Result<(), ValidationError> {
    let min = limits.min_ingredient_amount;
    match s.ingredients.unwrap_or_default().iter().find(|i| i.amount < min) {
        Some(i) => Err(ValidationError::AmountTooSmall {
            ingredient: i.id,
            min,
        }),
        None => Ok(()),
    }
}

fn cooking_time(s: &Submission<'_>, _: &Known, limits: &Limits) -> Result<(), ValidationError> {
    let min = limits.min_cooking_time;
    match s.cooking_time {
        Some(t) if t < min => Err(ValidationError::CookingTimeTooShort { min }),
        _ => Ok(()),
    }
}

fn image(s: &Submission<'_>, _: &Known, _: &Limits) -> Result<(), ValidationError> {
    match s.image {
        Some(image) if decode_image(image).is_none() => Err(ValidationError::InvalidImage),
        _ => Ok(()),
    }
}

/// Accepts plain base64 or a `data:<mime>;base64,<payload>` URL.
pub fn decode_image(image: &str) -> Option<Vec<u8>> {
    let payload = match image.strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,")?.1,
        None => image,
    };
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    (!bytes.is_empty()).then_some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashset;

    const IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn known() -> Known {
        Known {
            tags: hashset! { TagId::from(1), TagId::from(2) },
            ingredients: hashset! { IngredientId::from(10), IngredientId::from(11) },
        }
    }

    fn amount(id: i32, amount: i32) -> IngredientAmount {
        IngredientAmount {
            id: IngredientId::from(id),
            amount,
        }
    }

    fn create(tags: &[TagId], ingredients: &[IngredientAmount]) -> Result<(), ValidationError> {
        let submission = Submission {
            name: Some("Pancakes"),
            text: Some("Mix and fry."),
            cooking_time: Some(15),
            image: Some(IMAGE),
            tags: Some(tags),
            ingredients: Some(ingredients),
        };
        run(CREATE, &submission, &known(), &Limits::default())
    }

    #[test]
    fn accepts_consistent_submission() {
        let tags = [TagId::from(1), TagId::from(2)];
        assert_eq!(create(&tags, &[amount(10, 100), amount(11, 2)]), Ok(()));
    }

    #[test]
    fn create_requires_tags() {
        assert_eq!(
            create(&[], &[amount(10, 100)]),
            Err(ValidationError::MissingTags)
        );

        let submission = Submission {
            ingredients: Some(&[]),
            ..Default::default()
        };
        assert_eq!(
            run(CREATE, &submission, &known(), &Limits::default()),
            Err(ValidationError::MissingTags)
        );
    }

    #[test]
    fn update_only_rejects_supplied_empty_tags() {
        let limits = Limits::default();
        assert_eq!(run(UPDATE, &Submission::default(), &known(), &limits), Ok(()));

        let empty = Submission {
            tags: Some(&[]),
            ..Default::default()
        };
        assert_eq!(
            run(UPDATE, &empty, &known(), &limits),
            Err(ValidationError::MissingTags)
        );
    }

    #[test]
    fn unknown_tag_reported_before_duplicate() {
        let tags = [TagId::from(1), TagId::from(1), TagId::from(7)];
        assert_eq!(
            create(&tags, &[amount(10, 1)]),
            Err(ValidationError::InvalidTagReference(TagId::from(7)))
        );
    }

    #[test]
    fn duplicate_tag() {
        let tags = [TagId::from(2), TagId::from(1), TagId::from(2)];
        assert_eq!(
            create(&tags, &[amount(10, 1)]),
            Err(ValidationError::DuplicateTag(TagId::from(2)))
        );
    }

    #[test]
    fn ingredient_checks() {
        let tags = [TagId::from(1)];
        assert_eq!(
            create(&tags, &[amount(10, 1), amount(12, 1)]),
            Err(ValidationError::InvalidIngredientReference(
                IngredientId::from(12)
            ))
        );
        assert_eq!(
            create(&tags, &[amount(11, 1), amount(10, 5), amount(11, 3)]),
            Err(ValidationError::DuplicateIngredient(IngredientId::from(11)))
        );
        assert_eq!(
            create(&tags, &[amount(10, 0)]),
            Err(ValidationError::AmountTooSmall {
                ingredient: IngredientId::from(10),
                min: 1
            })
        );
    }

    #[test]
    fn cooking_time_respects_configured_minimum() {
        let limits = Limits {
            min_cooking_time: 5,
            ..Limits::default()
        };
        let submission = Submission {
            cooking_time: Some(4),
            ..Default::default()
        };
        assert_eq!(
            run(UPDATE, &submission, &known(), &limits),
            Err(ValidationError::CookingTimeTooShort { min: 5 })
        );
    }

    #[test]
    fn blank_name_or_text() {
        let tags = [TagId::from(1)];
        let ingredients = [amount(10, 1)];
        let limits = Limits::default();
        let full = Submission {
            name: Some("Pancakes"),
            text: Some("Mix and fry."),
            cooking_time: Some(15),
            image: Some(IMAGE),
            tags: Some(&tags),
            ingredients: Some(&ingredients),
        };

        let blank_name = Submission {
            name: Some(""),
            ..full
        };
        assert_eq!(
            run(CREATE, &blank_name, &known(), &limits),
            Err(ValidationError::BlankField("name"))
        );
        let blank_text = Submission {
            text: Some("  \n"),
            ..full
        };
        assert_eq!(
            run(CREATE, &blank_text, &known(), &limits),
            Err(ValidationError::BlankField("text"))
        );

        let rename_to_blank = Submission {
            name: Some(" "),
            ..Default::default()
        };
        assert_eq!(
            run(UPDATE, &rename_to_blank, &known(), &limits),
            Err(ValidationError::BlankField("name"))
        );
        let retext_to_blank = Submission {
            text: Some(""),
            ..Default::default()
        };
        assert_eq!(
            run(UPDATE, &retext_to_blank, &known(), &limits),
            Err(ValidationError::BlankField("text"))
        );
        let rename = Submission {
            name: Some("Crepes"),
            ..Default::default()
        };
        assert_eq!(run(UPDATE, &rename, &known(), &limits), Ok(()));
        assert_eq!(ValidationError::BlankField("text").field(), "text");
    }

    #[test]
    fn images() {
        assert!(decode_image(IMAGE).is_some());
        assert!(decode_image("aGVsbG8=").is_some());
        assert!(decode_image("data:image/png,not-base64").is_none());
        assert!(decode_image("***").is_none());
        assert!(decode_image("").is_none());
    }

    #[test]
    fn error_fields() {
        assert_eq!(ValidationError::MissingTags.field(), "tags");
        assert_eq!(
            ValidationError::DuplicateIngredient(IngredientId::from(1)).field(),
            "ingredients"
        );
        assert_eq!(ValidationError::MissingField("name").field(), "name");
    }
}

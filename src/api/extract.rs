// Copyright 2023 Remi Bernotavicius

//! Wrappers around axum's extractors whose rejections are reported through [`Error`], so a
//! malformed body, path or query string gets the same JSON 400 as any other validation
//! failure.

use crate::Error;
use axum::extract::{FromRequest, FromRequestParts};

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Payload<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct Path<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct Query<T>(pub T);

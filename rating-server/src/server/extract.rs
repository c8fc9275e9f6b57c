//! Extractors whose rejections render as [`ApiError`] bodies.
use axum::extract::{FromRequest, FromRequestParts};

use crate::server::error::ApiError;

/// `axum::Json` with malformed bodies reported as `400 { "status": "error", .. }`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with bad path segments reported as `ApiError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `axum::extract::Query` with bad query strings reported as `ApiError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

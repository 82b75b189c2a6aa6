//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for the salon backend, built on the
//! Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Authentication (`/api/v1/auth`)
//! - `POST /api/v1/auth/register` - Create an account and open a session
//! - `POST /api/v1/auth/login` - Open a session with email and password
//! - `POST /api/v1/auth/refresh` - Rotate the refresh token, issue a new pair
//! - `POST /api/v1/auth/logout` - Revoke the refresh token and clear cookies
//! - `GET /api/v1/auth/me` - Current account (protected)
//! - `PATCH /api/v1/auth/me` - Update name, contact number or metadata (protected)
//!
//! ## Health (`/api/v1/health`)
//! - `GET /api/v1/health` - Liveness check
//!
//! # Authentication
//!
//! Tokens travel as HttpOnly cookies (`access-token`, `refresh-token`).
//! Non-browser clients may instead send the access token as:
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! # OpenAPI Documentation
//!
//! The OpenAPI document is served at `/api-docs/openapi.json`. When the
//! `swagger-ui` feature is enabled, interactive documentation is available at
//! `/swagger-ui/`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

//! admin-server — multi-tenant administrative backend
//!
//! Authorization and request-governance core: identity and tokens, RBAC with
//! cached permission lookups, per-IP and policy-driven rate limiting, and a
//! typed repository over PostgreSQL.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod extract;
pub mod governance;
pub mod httpclient;
pub mod service;
pub mod telemetry;

//! Luminarch client hub.
//!
//! This crate wires the portal onto its production adapters: the hosted
//! identity provider and object storage over HTTP, Postgres for tickets and
//! approvals, and a terminal front end.

pub mod auth;
pub mod cli;
pub mod config;
pub mod console;
pub mod db;
pub mod signup;
pub mod storage;

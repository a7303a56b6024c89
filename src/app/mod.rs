//! Core modules of the dashboard backend.
//!
//! # Module Organization
//!
//! ## AWS Integration
//! - [`resource_explorer`] - resource drilldown across regions via the AWS CLI
//! - [`cost_explorer`] - billing overview and per-service costs
//! - [`profiles`] - system vs custom credentials for the CLI
//! - [`commands`] - read-only command catalogue and raw command runner
//!
//! ## Serving
//! - [`api_server`] - JSON API and static front end
//! - [`config`] - environment configuration

pub mod api_server;
pub mod commands;
pub mod config;
pub mod cost_explorer;
pub mod profiles;
pub mod resource_explorer;

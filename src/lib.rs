//! AWS Dash Web - local dashboard backend for AWS costs and resources
//!
//! A small HTTP service that shells out to the `aws` command-line tool for
//! billing (Cost Explorer) and resource data, caches the results briefly, and
//! serves them as JSON to a browser front end whose build output it also
//! serves.
//!
//! # Architecture Overview
//!
//! - **Executor** ([`app::resource_explorer::cli_executor`]): runs
//!   `aws ... --output json` as child processes with the active profile's
//!   environment, cancellation and a per-call deadline.
//! - **Aggregator** ([`app::resource_explorer::aggregator`]): queries one
//!   resource kind in every opted-in region, at most five at a time, skipping
//!   regions that reject the credentials and aborting on any other failure.
//! - **Services** ([`app::resource_explorer::resource_service`],
//!   [`app::cost_explorer`]): turn CLI output into dashboard records, behind
//!   a TTL cache scoped to the active profile.
//! - **API** ([`app::api_server`]): axum router over the services, plus the
//!   profile manager and command catalogue.
//!
//! # Getting Started
//!
//! `awsdash-web` reads its settings from the environment (see
//! [`app::config::AppConfig`]) and listens on port 8080 by default. Log
//! verbosity follows `RUST_LOG`.

#![warn(clippy::all, rust_2018_idioms)]

// Include logging macros first
#[macro_use]
pub mod logging_macros;

pub mod app;

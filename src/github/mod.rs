//! Hosting API module
//!
//! This module contains the quota-aware client used by crawl workers:
//! - Repository search with lazy pagination
//! - Directory listing and raw file fetch
//! - Error classification separating quota exhaustion from connectivity loss

mod client;
mod error;
mod types;

pub use client::{build_http_client, check_response, GithubClient, RepositorySearch, SEARCH_RESULT_WINDOW};
pub use error::{ClientError, ClientResult};
pub use types::{Entry, EntryKind, Repository, SearchPage};

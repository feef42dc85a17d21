pub mod api;
pub mod cache;
pub mod config;
pub mod download;
pub mod error;
pub mod gallery;
pub mod models;
pub mod naming;
pub mod viewer;

#[cfg(test)]
pub mod testutil;

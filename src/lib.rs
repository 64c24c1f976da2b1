//! Cosmo CMS - content management backend for the Cosmo Kids site
//!
//! Staff sign in and manage three collections (classes, news + events,
//! gallery) plus a flat media bucket.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod storage;

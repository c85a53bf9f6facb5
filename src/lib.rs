//! Vessel track segmentation and port proximity search

pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod geometry;
pub mod ingest;
pub mod models;
pub mod ports;
pub mod proximity;
pub mod tracks;

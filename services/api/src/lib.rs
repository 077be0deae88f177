pub mod adapters;
pub mod config;
pub mod error;
pub mod storage;
pub mod web;

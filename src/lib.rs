pub mod api;
pub mod calendar;
pub mod config;
pub mod error;
pub mod filters;
pub mod grades;
pub mod models;
pub mod records;
pub mod seed;
pub mod services;
pub mod state;
pub mod timer;
pub mod views;

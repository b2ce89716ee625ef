pub mod config;
pub mod controller;
pub mod editor;
pub mod error;
pub mod model;
pub mod render;
pub mod storage;
pub mod task_store;
pub mod validate;

//! HTTP handlers

pub mod health;
pub mod catalog;
pub mod predict;
pub mod evaluate;

mod upload;

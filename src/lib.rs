#![doc = "shoplist: shopping-cart aggregation and PDF shopping-list export."]

//! This crate merges the ingredients of every recipe in a user's shopping cart
//! into one list and renders that list as a downloadable PDF.
//!
//! # Usage
//! Build a [`shopping_list::ShoppingListService`] once (from a loaded
//! [`config::Config`]) and call `download` per request with any
//! [`contract::RecipeStore`] implementation.

pub mod aggregate;
pub mod cart;
pub mod cli;
pub mod config;
pub mod contract;
pub mod load_config;
pub mod render;
pub mod shopping_list;
pub mod store;

pub mod cli;
pub mod db;
pub mod error;
pub mod ident;
pub mod models;
pub mod output;
pub mod service;

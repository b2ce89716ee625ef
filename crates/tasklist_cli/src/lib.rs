pub mod cli;
pub mod view;

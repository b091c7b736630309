mod classifiers;
mod cli;
mod common;
mod core;
mod rewrite;

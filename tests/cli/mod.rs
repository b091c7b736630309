mod basic;
mod reset;

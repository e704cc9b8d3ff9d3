pub mod classes;
pub mod decompile;

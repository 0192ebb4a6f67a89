//! Data models shared by the engine, the settings layer and the CLI.

pub mod reference;
pub mod tools;

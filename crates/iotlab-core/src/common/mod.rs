pub mod error;
pub mod idcounter;
pub mod parser;

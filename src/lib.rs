pub mod config;
pub mod error;
pub mod event;
pub mod fetch;
pub mod parse;
pub mod render;
pub mod table;

pub use error::{Error, Result};
pub use event::Event;
pub use parse::RawRecord;
pub use table::{aggregate, EventTable, TableDefinition};

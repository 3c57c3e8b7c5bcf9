pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;
mod student;
pub mod web;

pub use config::{Backend, Config, LogConfig, RemoteConfig, ServerConfig, StoreConfig};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, Verbosity};
pub use store::{
    outcome, InMemoryStore, JsonFileStore, RecordStore, RemoteStore, StoreError,
};
pub use student::{MissingFields, StudentForm, StudentRecord};

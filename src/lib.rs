//! Row projector: turn arbitrary SQL result sets into ordered, self-describing
//! JSON records without knowing the schema up front.

pub mod cursor;
pub mod error;
pub mod handlers;
pub mod projector;
pub mod response;
pub mod routes;
pub mod settings;
pub mod sql;
pub mod state;
pub mod value;

pub use cursor::{Cursor, CursorFault, MemoryCursor};
pub use error::{AppError, ConfigError, ProjectError};
pub use projector::project;
pub use response::{success_many, success_one};
pub use routes::{app, common_routes, common_routes_with_ready, user_routes};
pub use settings::Settings;
pub use sql::{fetch_records, DecodeCell, SqlxCursor};
pub use state::AppState;
pub use value::{format_timestamp, normalize, RawValue, Record};

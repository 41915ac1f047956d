pub mod connection;
pub mod error;
pub mod format;
pub mod name;
pub mod port;
pub mod program;
pub mod render;
pub mod resource;
pub mod routine;
pub mod schema;
pub mod spec;
pub mod types;

// Re-export commonly used types
pub use connection::{Connection, PortRef};
pub use error::CoreError;
pub use format::{load_program_like, Format};
pub use name::{Name, Namespacing, QualifiedName};
pub use port::Port;
pub use program::{Program, ProgramLike};
pub use render::{to_dot, Dot};
pub use resource::{ParamLink, Resource};
pub use routine::{Routine, RoutineBuilder};
pub use schema::generate_program_schema;
pub use spec::SchemaVersion;
pub use types::{Direction, ResourceType, Value};

pub mod connect;
pub mod crud;
pub mod error;
pub mod key;
pub mod model;

pub use crud::Crud;
pub use error::{Error, Result};
pub use key::{KeyField, PrimaryKey};
pub use model::{CrudModel, EagerLoad, FieldDescriptor, FieldKind};

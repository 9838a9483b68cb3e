//! Document model: identifiers, values and stored documents.

mod object_id;
mod record;
mod value;

pub use object_id::{current_millis, ObjectId, OBJECT_ID_SIZE};
pub use record::Document;
pub use value::{Value, OID_KEY};

/// Database plumbing: connection pool and schema migrations
///
/// Query code lives with the models; see [`crate::models`].

pub mod migrations;
pub mod pool;

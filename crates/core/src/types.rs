/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Projects are keyed by UUID (v7, generated at creation time).
pub type ProjectId = uuid::Uuid;

/// Annotation and document identifiers are opaque strings. Server-issued ids
/// are UUIDs; client-side temporary ids carry the [`LOCAL_ID_PREFIX`](crate::annotation::LOCAL_ID_PREFIX).
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

use serde::Serialize;

/// Uniform `{"data": ...}` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

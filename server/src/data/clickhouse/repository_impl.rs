//! QueryBackend trait implementation for ClickHouse
//!
//! Filter values travel as server-side parameters (`{name:Type}` in the SQL,
//! `param_name=value` on the wire). Rows are fetched as `JSONEachRow` so the
//! caller gets every column without a typed row struct per table.

use async_trait::async_trait;

use crate::data::error::StoreError;
use crate::data::query::BoundParams;
use crate::data::traits::{QueryBackend, Row};

use super::ClickhouseService;

/// ClickHouse error codes for rejected credentials
/// (AUTHENTICATION_FAILED, UNKNOWN_USER, WRONG_PASSWORD)
const AUTH_ERROR_CODES: [u32; 3] = [516, 192, 193];

#[async_trait]
impl QueryBackend for ClickhouseService {
    async fn run_query(&self, sql: &str, params: &BoundParams) -> Result<Vec<Row>, StoreError> {
        let mut query = self.client().query(sql);
        for (name, value) in params {
            query = query.param(name, value);
        }

        let fetch = async {
            let mut cursor = query.fetch_bytes("JSONEachRow")?;
            cursor.collect().await
        };

        let body = tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| {
                StoreError::Connection(format!(
                    "query timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(map_clickhouse_error)?;

        parse_json_each_row(&body)
    }
}

/// Map a client failure onto the store taxonomy.
///
/// Transport errors and server error codes are checked first; message text
/// is only inspected when neither says anything.
pub(crate) fn map_clickhouse_error(err: clickhouse::error::Error) -> StoreError {
    use clickhouse::error::Error;

    match err {
        Error::Network(e) => StoreError::Connection(e.to_string()),
        Error::TimedOut => StoreError::Connection("query timed out".to_string()),
        Error::BadResponse(msg) => match server_error_code(&msg) {
            Some(code) if AUTH_ERROR_CODES.contains(&code) => StoreError::Authentication(msg),
            _ => StoreError::from_message(msg),
        },
        other => StoreError::from_message(other.to_string()),
    }
}

/// Extract N from a server message of the form `Code: N. DB::Exception: ...`
fn server_error_code(msg: &str) -> Option<u32> {
    let rest = &msg[msg.find("Code:")? + "Code:".len()..];
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Parse a `JSONEachRow` body into rows
pub(crate) fn parse_json_each_row(body: &[u8]) -> Result<Vec<Row>, StoreError> {
    serde_json::Deserializer::from_slice(body)
        .into_iter::<Row>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::Query(format!("Malformed result row: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clickhouse::error::Error;
    use serde_json::json;

    #[test]
    fn test_parse_json_each_row() {
        let body = b"{\"number\":\"100\",\"hash\":\"0xab\"}\n{\"number\":\"99\",\"hash\":\"0xcd\"}\n";
        let rows = parse_json_each_row(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["number"], json!("100"));
        assert_eq!(rows[1]["hash"], json!("0xcd"));
    }

    #[test]
    fn test_parse_empty_body() {
        assert!(parse_json_each_row(b"").unwrap().is_empty());
        assert!(parse_json_each_row(b"\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_body() {
        let err = parse_json_each_row(b"{\"total\":").unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[test]
    fn test_server_error_code() {
        assert_eq!(
            server_error_code("Code: 516. DB::Exception: default: Authentication failed"),
            Some(516)
        );
        assert_eq!(server_error_code("Code:60. Table does not exist"), Some(60));
        assert_eq!(server_error_code("no code here"), None);
    }

    #[test]
    fn test_bad_response_auth_code() {
        let err = map_clickhouse_error(Error::BadResponse(
            "Code: 516. DB::Exception: default: Authentication failed".to_string(),
        ));
        assert!(matches!(err, StoreError::Authentication(_)));

        let err = map_clickhouse_error(Error::BadResponse(
            "Code: 192. DB::Exception: Unknown user reader".to_string(),
        ));
        assert!(matches!(err, StoreError::Authentication(_)));
    }

    #[test]
    fn test_bad_response_query_error() {
        let msg = "Code: 47. DB::Exception: Missing columns: 'foo'".to_string();
        let err = map_clickhouse_error(Error::BadResponse(msg.clone()));
        assert_eq!(err, StoreError::Query(msg));
    }

    #[test]
    fn test_timed_out_is_connection() {
        let err = map_clickhouse_error(Error::TimedOut);
        assert!(matches!(err, StoreError::Connection(_)));
    }
}

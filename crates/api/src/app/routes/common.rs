use std::str::FromStr;

use axum::http::StatusCode;

use crate::app::errors;

/// Parse a positive numeric path segment into a typed id; anything else is 400.
pub fn parse_id<T: FromStr>(raw: &str, what: &'static str) -> Result<T, axum::response::Response> {
    raw.parse::<T>()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what}")))
}

#[cfg(test)]
mod tests {
    use schoolhouse_core::ClassId;

    use super::*;

    #[test]
    fn positive_integers_parse() {
        let id: ClassId = parse_id("42", "class id").unwrap();
        assert_eq!(id.get(), 42);
    }

    #[test]
    fn other_segments_are_bad_requests() {
        for raw in ["abc", "0", "-3", "1.5", ""] {
            let resp = parse_id::<ClassId>(raw, "class id").unwrap_err();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{raw}");
        }
    }
}

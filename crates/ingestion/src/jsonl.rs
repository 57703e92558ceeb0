//! Reading raw aggregate trades from JSON text.
//!
//! Callers fetch and store trades however they like; this module only turns
//! line-delimited JSON (or a single JSON array) into [`RawAggTrade`] records.

use clab_core::{Error, RawAggTrade, Result};
use std::io::BufRead;

/// Read one raw trade per line. Blank lines are skipped.
///
/// A malformed line fails the whole read with a parse error carrying the
/// zero-based line number.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<RawAggTrade>> {
    let mut records = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: RawAggTrade = serde_json::from_str(line)
            .map_err(|e| Error::parse(line_no, "line", e.to_string()))?;
        records.push(record);
    }

    Ok(records)
}

/// Parse a JSON array of raw trades, as returned by the exchange's REST API.
pub fn parse_json_array(text: &str) -> Result<Vec<RawAggTrade>> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_jsonl() {
        let text = concat!(
            r#"{"a":1,"p":"100","q":"1","T":1700000000000,"m":false}"#,
            "\n\n",
            r#"{"a":2,"p":"110","q":"2","T":1700000001000,"m":true}"#,
            "\n",
        );
        let records = read_jsonl(Cursor::new(text)).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].agg_id, Some(1));
        assert_eq!(records[1].price, "110");
        assert!(records[1].buyer_is_maker);
    }

    #[test]
    fn test_read_jsonl_empty() {
        assert!(read_jsonl(Cursor::new("")).unwrap().is_empty());
    }

    #[test]
    fn test_read_jsonl_bad_line() {
        let text = "{\"p\":\"1\",\"q\":\"1\",\"T\":0,\"m\":false}\n{oops}\n";
        match read_jsonl(Cursor::new(text)) {
            Err(Error::Parse { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_json_array() {
        let text = r#"[{"a":7,"p":"1.5","q":"3","T":60000,"m":true}]"#;
        let records = parse_json_array(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ts_ms, 60_000);
    }

    #[test]
    fn test_parse_json_array_missing_field() {
        let err = parse_json_array(r#"[{"p":"1","q":"1","T":0}]"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}

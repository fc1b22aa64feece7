// ============================================================
// CHUNK ROW PARSER
// ============================================================
// Knowledge-base chunks built from CSV exports look like
// `header1,header2,...:value1,value2,...`. Both halves are CSV records.

use csv::{ReaderBuilder, StringRecord, Trim};

/// Header/value pairs recovered from one chunk, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkRow {
    fields: Vec<(String, String)>,
}

impl ChunkRow {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Exact header match.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == header)
            .map(|(_, v)| v.as_str())
    }
}

pub struct ChunkRowParser {
    delimiter: u8,
    separator: char,
}

impl Default for ChunkRowParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            separator: ':',
        }
    }
}

impl ChunkRowParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `headers:values`. Anything without the separator yields an empty row.
    pub fn parse(&self, text: &str) -> ChunkRow {
        let Some((header_part, value_part)) = text.split_once(self.separator) else {
            return ChunkRow::default();
        };

        let (Some(headers), Some(values)) = (
            self.read_record(header_part),
            self.read_record(value_part),
        ) else {
            return ChunkRow::default();
        };

        let fields = headers
            .iter()
            .zip(values.iter())
            .map(|(h, v)| (h.trim().to_string(), v.trim().to_string()))
            .collect();

        ChunkRow { fields }
    }

    fn read_record(&self, line: &str) -> Option<StringRecord> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(line.trim().as_bytes());

        reader.records().next()?.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_chunk() {
        let row = ChunkRowParser::new().parse("Subgroup,spec:Pumps,brand abc|item pump");
        assert_eq!(row.get("Subgroup"), Some("Pumps"));
        assert_eq!(row.get("spec"), Some("brand abc|item pump"));
    }

    #[test]
    fn test_parse_quoted_values() {
        let row = ChunkRowParser::new()
            .parse(r#""ItemDescription","spec":"pump, 2hp, 220v","item pump|power 2hp""#);
        assert_eq!(row.get("ItemDescription"), Some("pump, 2hp, 220v"));
        assert_eq!(row.get("spec"), Some("item pump|power 2hp"));
    }

    #[test]
    fn test_parse_without_separator() {
        assert!(ChunkRowParser::new().parse("just some text").is_empty());
        assert!(ChunkRowParser::new().parse("").is_empty());
    }

    #[test]
    fn test_parse_uneven_lengths_zip_shortest() {
        let row = ChunkRowParser::new().parse("a,b,c:1,2");
        assert_eq!(row.fields().count(), 2);
        assert_eq!(row.get("c"), None);
    }
}

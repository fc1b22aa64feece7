// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Parsing of CSV-shaped retrieval chunks

mod csv_parser;

pub use csv_parser::{ChunkRow, ChunkRowParser};

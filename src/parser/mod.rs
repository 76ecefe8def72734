//! Marker stream parsing module.

pub mod aux;
mod options;
mod stream;

pub use aux::{parse_aux, parse_aux_file, write_ndjson, AuxOptions};
pub use options::ParseOptions;
pub use stream::{parse_record, read_records, read_records_from_str, RecordSet, RecordStream};

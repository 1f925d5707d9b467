use csv_parser::{records_from_reader, table_from_reader};
use record::{DetectionRecord, PeriodicRecord, TransientRecord};
use types::Error;

use include_dir::{Dir, include_dir};

mod csv_parser;
pub(crate) mod periodic;
mod record;
pub(crate) mod transient;
mod types;

static TEST_DATA: Dir = include_dir!("$CARGO_MANIFEST_DIR/../test-data");

fn test_data_file(name: &str) -> &'static [u8] {
    TEST_DATA
        .get_file(name)
        .unwrap_or_else(|| panic!("test data file {name} is not found"))
        .contents()
}

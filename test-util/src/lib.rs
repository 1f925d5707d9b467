pub use lc_data::periodic::{PERIODIC_PERIODS, PERIODIC_TABLE_F64, periodic_table};
pub use lc_data::transient::{
    TRANSIENT_PARAMETERS, TRANSIENT_TABLE_F64, TransientParameters, transient_table,
};

mod lc_data;

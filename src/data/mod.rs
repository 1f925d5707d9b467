mod band;
pub use band::Band;

mod column;
pub use column::{Column, ColumnSet};

mod data_sample;
pub use data_sample::DataSample;

mod light_curve_table;
pub use light_curve_table::{BandSelection, LightCurveTable, ObjectLightCurve};

mod time_series;
pub use time_series::TimeSeries;

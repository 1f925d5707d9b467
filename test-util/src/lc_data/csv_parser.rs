use crate::lc_data::{DetectionRecord, Error};

use itertools::{Itertools, process_results};
use light_curve_classifier_features::{Float, LightCurveTable};
use serde::de::DeserializeOwned;
use std::io::Read;

pub(super) fn table_from_reader<T, R, Rec>(reader: R) -> Result<LightCurveTable<T>, Error>
where
    T: Float,
    R: Read,
    Rec: DetectionRecord,
{
    let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);
    let iter = csv_reader
        .deserialize()
        .map(|record: Result<Rec, _>| record.map(Rec::into_row));
    let (oid, mjd, fid, rows): (Vec<_>, Vec<_>, Vec<_>, Vec<_>) =
        process_results(iter, |iter| iter.multiunzip())?;

    let mjd = mjd.into_iter().map(T::approx_from_f64).collect();
    let values = Rec::value_columns()
        .iter()
        .enumerate()
        .map(|(i, &column)| {
            let column_values = rows
                .iter()
                .map(|row: &Vec<f64>| T::approx_from_f64(row[i]))
                .collect();
            (column, column_values)
        })
        .collect_vec();
    Ok(LightCurveTable::from_columns(oid, mjd, fid, values)?)
}

pub(super) fn records_from_reader<R, Rec>(reader: R) -> Result<Vec<Rec>, Error>
where
    R: Read,
    Rec: DeserializeOwned,
{
    let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);
    Ok(csv_reader.deserialize::<Rec>().collect::<Result<_, _>>()?)
}

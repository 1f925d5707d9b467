use crate::data::band::Band;
use crate::data::column::{Column, ColumnSet};
use crate::error::TableError;
use crate::float_trait::Float;
use crate::types::ObjectId;

use itertools::Itertools;
use ndarray::{Array1, ArrayView1};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Batch of detections grouped by object
///
/// The table is built once from column vectors and is never mutated by feature extraction.
/// Objects are ordered by their identifiers, detections of every object are ordered by time.
#[derive(Clone, Debug)]
pub struct LightCurveTable<T>
where
    T: Float,
{
    columns: ColumnSet,
    objects: BTreeMap<ObjectId, ObjectLightCurve<T>>,
}

impl<T> LightCurveTable<T>
where
    T: Float,
{
    /// Construct the table from column vectors
    ///
    /// `oid`, `mjd` and `fid` are the mandatory object identifier, time and band columns, `values`
    /// are optional real-valued columns. All vectors must have the same length, every value column
    /// must be given at most once.
    pub fn from_columns<O>(
        oid: Vec<O>,
        mjd: Vec<T>,
        fid: Vec<Band>,
        values: impl IntoIterator<Item = (Column, Vec<T>)>,
    ) -> Result<Self, TableError>
    where
        O: Into<ObjectId>,
    {
        let n = oid.len();
        if mjd.len() != n {
            return Err(TableError::LengthMismatch {
                column: Column::Mjd,
                actual: mjd.len(),
                expected: n,
            });
        }
        if fid.len() != n {
            return Err(TableError::LengthMismatch {
                column: Column::Fid,
                actual: fid.len(),
                expected: n,
            });
        }

        let mut value_columns = BTreeMap::new();
        for (column, data) in values {
            if !column.is_value_column() {
                return Err(TableError::NotValueColumn(column));
            }
            if data.len() != n {
                return Err(TableError::LengthMismatch {
                    column,
                    actual: data.len(),
                    expected: n,
                });
            }
            if value_columns.insert(column, data).is_some() {
                return Err(TableError::DuplicateColumn(column));
            }
        }

        let columns = [Column::Mjd, Column::Fid]
            .into_iter()
            .chain(value_columns.keys().copied())
            .collect();

        let rows_by_object = oid.into_iter().map(Into::into).enumerate().fold(
            BTreeMap::<ObjectId, Vec<usize>>::new(),
            |mut acc, (i, oid)| {
                acc.entry(oid).or_default().push(i);
                acc
            },
        );

        let objects = rows_by_object
            .into_iter()
            .map(|(oid, mut rows)| {
                rows.sort_by(|&a, &b| time_order(mjd[a], mjd[b]));
                let lc = ObjectLightCurve {
                    time: rows.iter().map(|&i| mjd[i]).collect(),
                    band: rows.iter().map(|&i| fid[i]).collect(),
                    values: value_columns
                        .iter()
                        .map(|(&column, data)| (column, rows.iter().map(|&i| data[i]).collect()))
                        .collect(),
                };
                (oid, lc)
            })
            .collect();

        Ok(Self { columns, objects })
    }

    /// Columns available in the table, always includes [Column::Mjd] and [Column::Fid]
    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    /// Number of distinct objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Total number of detections
    pub fn n_detections(&self) -> usize {
        self.objects.values().map(ObjectLightCurve::len).sum()
    }

    pub fn object_ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.keys()
    }

    pub fn get(&self, oid: &str) -> Option<&ObjectLightCurve<T>> {
        self.objects.get(oid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &ObjectLightCurve<T>)> {
        self.objects.iter()
    }

    pub(crate) fn objects(&self) -> &BTreeMap<ObjectId, ObjectLightCurve<T>> {
        &self.objects
    }

    /// All bands present in the table
    pub fn bands(&self) -> BTreeSet<Band> {
        self.objects
            .values()
            .flat_map(|lc| lc.band.iter().copied())
            .collect()
    }
}

/// NaN times go last, so the comparison is a total order
fn time_order<T: Float>(a: T, b: T) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Time-ordered detections of a single object in all bands
#[derive(Clone, Debug)]
pub struct ObjectLightCurve<T>
where
    T: Float,
{
    pub time: Array1<T>,
    pub band: Vec<Band>,
    values: BTreeMap<Column, Array1<T>>,
}

impl<T> ObjectLightCurve<T>
where
    T: Float,
{
    /// Number of detections in all bands
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Bands the object has at least one detection in
    pub fn bands(&self) -> BTreeSet<Band> {
        self.band.iter().copied().collect()
    }

    pub fn has_band(&self, band: Band) -> bool {
        self.band.contains(&band)
    }

    /// Number of detections in the band
    pub fn band_len(&self, band: Band) -> usize {
        self.band.iter().filter(|&&b| b == band).count()
    }

    /// Column values, [None] if the table has no such value column
    ///
    /// [Column::Mjd] gives the time array, [Column::Fid] has no real-valued representation.
    pub fn column(&self, column: Column) -> Option<ArrayView1<'_, T>> {
        match column {
            Column::Mjd => Some(self.time.view()),
            Column::Fid => None,
            _ => self.values.get(&column).map(Array1::view),
        }
    }

    /// Select detections of a single band
    ///
    /// Returns [None] if the object has no detections in the band. Otherwise detections having a
    /// non-finite time or a non-finite value in any of the `columns` are dropped, so the selection
    /// may be empty. A column absent from the table makes every detection invalid.
    pub fn select(&self, band: Band, columns: &[Column]) -> Option<BandSelection<T>> {
        if !self.has_band(band) {
            return None;
        }
        let arrays: Option<Vec<_>> = columns.iter().map(|&c| self.column(c)).collect();
        let Some(arrays) = arrays else {
            return Some(BandSelection::empty(columns.len()));
        };
        let rows = (0..self.len())
            .filter(|&i| {
                self.band[i] == band
                    && self.time[i].is_finite()
                    && arrays.iter().all(|a| a[i].is_finite())
            })
            .collect_vec();
        Some(BandSelection {
            t: rows.iter().map(|&i| self.time[i]).collect(),
            values: arrays
                .iter()
                .map(|a| rows.iter().map(|&i| a[i]).collect())
                .collect(),
        })
    }
}

/// Valid detections of a single object in a single band
#[derive(Clone, Debug, PartialEq)]
pub struct BandSelection<T> {
    pub t: Vec<T>,
    /// Values of the requested columns, in the requested order
    pub values: Vec<Vec<T>>,
}

impl<T> BandSelection<T> {
    fn empty(n_columns: usize) -> Self {
        Self {
            t: vec![],
            values: (0..n_columns).map(|_| vec![]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

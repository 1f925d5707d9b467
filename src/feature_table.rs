use crate::float_trait::Float;
use crate::types::ObjectId;

use itertools::Itertools;
use std::collections::BTreeMap;

/// Feature values indexed by object identifier
///
/// Every row has exactly one value per feature name, NaN marks a missing value.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureTable<T> {
    names: Vec<String>,
    rows: BTreeMap<ObjectId, Vec<T>>,
}

impl<T> FeatureTable<T>
where
    T: Float,
{
    /// Table with given feature names and no rows
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            rows: BTreeMap::new(),
        }
    }

    /// Table without features, but with an index
    pub fn from_index<'a>(oids: impl IntoIterator<Item = &'a ObjectId>) -> Self {
        Self::filled(vec![], oids, T::nan())
    }

    /// Table having every value equal to `value`
    pub fn filled<'a>(
        names: Vec<String>,
        oids: impl IntoIterator<Item = &'a ObjectId>,
        value: T,
    ) -> Self {
        let rows = oids
            .into_iter()
            .map(|oid| (oid.clone(), vec![value; names.len()]))
            .collect();
        Self { names, rows }
    }

    /// Construct table from rows
    ///
    /// # Panics
    /// Panics if a row length differs from the number of names
    pub fn from_rows(names: Vec<String>, rows: impl IntoIterator<Item = (ObjectId, Vec<T>)>) -> Self {
        let rows: BTreeMap<_, _> = rows.into_iter().collect();
        for (oid, row) in rows.iter() {
            assert_eq!(
                row.len(),
                names.len(),
                "row of object {oid} has wrong number of values"
            );
        }
        Self { names, rows }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    pub fn object_ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.rows.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &[T])> {
        self.rows.iter().map(|(oid, row)| (oid, row.as_slice()))
    }

    pub fn row(&self, oid: &str) -> Option<&[T]> {
        self.rows.get(oid).map(Vec::as_slice)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Single value, [None] if either the object or the feature is unknown
    pub fn get(&self, oid: &str, name: &str) -> Option<T> {
        let i = self.column_index(name)?;
        self.row(oid).map(|row| row[i])
    }

    /// Column values in object order
    pub fn column(&self, name: &str) -> Option<Vec<T>> {
        let i = self.column_index(name)?;
        Some(self.rows.values().map(|row| row[i]).collect())
    }

    /// Horizontal join on the object index
    ///
    /// The result has the union of both indexes, values absent from either side are NaN.
    pub fn hstack(self, other: Self) -> Self {
        let left_size = self.names.len();
        let right_size = other.names.len();
        let names = self.names.into_iter().chain(other.names).collect();
        let mut right = other.rows;
        let mut rows: BTreeMap<_, _> = self
            .rows
            .into_iter()
            .map(|(oid, mut row)| {
                match right.remove(&oid) {
                    Some(values) => row.extend(values),
                    None => row.extend(std::iter::repeat_n(T::nan(), right_size)),
                }
                (oid, row)
            })
            .collect();
        rows.extend(right.into_iter().map(|(oid, values)| {
            let row = std::iter::repeat_n(T::nan(), left_size)
                .chain(values)
                .collect_vec();
            (oid, row)
        }));
        Self { names, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oids(ids: &[&str]) -> Vec<ObjectId> {
        ids.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn get_and_column() {
        let table = FeatureTable::from_rows(
            vec!["x".into(), "y".into()],
            [("b".into(), vec![3.0, 4.0]), ("a".into(), vec![1.0, 2.0])],
        );
        assert_eq!(table.object_ids().collect_vec(), ["a", "b"]);
        assert_eq!(table.get("b", "x"), Some(3.0));
        assert_eq!(table.get("c", "x"), None);
        assert_eq!(table.get("a", "z"), None);
        assert_eq!(table.column("y"), Some(vec![2.0, 4.0]));
    }

    #[test]
    fn hstack_fills_nan() {
        let left = FeatureTable::from_rows(vec!["x".into()], [("a".into(), vec![1.0_f64])]);
        let right = FeatureTable::from_rows(vec!["y".into()], [("b".into(), vec![2.0])]);
        let joined = left.hstack(right);
        assert_eq!(joined.names(), ["x", "y"]);
        assert_eq!(joined.len(), 2);
        assert_eq!(joined.get("a", "x"), Some(1.0));
        assert!(joined.get("a", "y").unwrap().is_nan());
        assert!(joined.get("b", "x").unwrap().is_nan());
        assert_eq!(joined.get("b", "y"), Some(2.0));
    }

    #[test]
    fn index_only_table() {
        let ids = oids(&["a", "b"]);
        let table = FeatureTable::<f32>::from_index(&ids);
        assert_eq!(table.len(), 2);
        assert_eq!(table.n_features(), 0);
        let filled = table.hstack(FeatureTable::filled(vec!["x".into()], &ids, 0.0));
        assert_eq!(filled.column("x"), Some(vec![0.0, 0.0]));
    }

    #[test]
    #[should_panic(expected = "row of object a has wrong number of values")]
    fn wrong_row_size() {
        let _ = FeatureTable::from_rows(vec!["x".into()], [("a".into(), vec![1.0_f64, 2.0])]);
    }
}

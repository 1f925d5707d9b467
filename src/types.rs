use ndarray::{CowArray, Ix1};

pub type CowArray1<'a, T> = CowArray<'a, T, Ix1>;

/// Object identifier, the key of every feature table
pub type ObjectId = String;

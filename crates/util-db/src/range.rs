use std::ops;

use bincode::{Decode, Encode};
use redb_bincode::{ReadableTable, StorageError};

/// Collect all the entries of `range` into a `Vec`
pub fn collect_range<K, V>(
    tbl: &impl ReadableTable<K, V>,
    range: impl ops::RangeBounds<K>,
) -> Result<Vec<(K, V)>, StorageError>
where
    K: Decode<()> + Encode,
    V: Decode<()> + Encode,
{
    tbl.range(range)?
        .map(|kv| {
            let (k, v) = kv?;
            Ok((k.value(), v.value()))
        })
        .collect()
}

/// Collect only the keys of `range`
pub fn collect_range_keys<K, V>(
    tbl: &impl ReadableTable<K, V>,
    range: impl ops::RangeBounds<K>,
) -> Result<Vec<K>, StorageError>
where
    K: Decode<()> + Encode,
    V: Decode<()> + Encode,
{
    tbl.range(range)?
        .map(|kv| {
            let (k, _) = kv?;
            Ok(k.value())
        })
        .collect()
}

pub fn get_first_in_range<K, V>(
    tbl: &impl ReadableTable<K, V>,
    range: impl ops::RangeBounds<K>,
) -> Result<Option<(K, V)>, StorageError>
where
    K: Decode<()> + Encode,
    V: Decode<()> + Encode,
{
    Ok(tbl
        .range(range)?
        .next()
        .transpose()?
        .map(|(k, v)| (k.value(), v.value())))
}

pub fn get_last_in_range<K, V>(
    tbl: &impl ReadableTable<K, V>,
    range: impl ops::RangeBounds<K>,
) -> Result<Option<(K, V)>, StorageError>
where
    K: Decode<()> + Encode,
    V: Decode<()> + Encode,
{
    Ok(tbl
        .range(range)?
        .next_back()
        .transpose()?
        .map(|(k, v)| (k.value(), v.value())))
}

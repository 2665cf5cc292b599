//! Record encoding and the small set of table helpers every repo shares.

use redb::{ReadableTable, Table};
use serde::{de::DeserializeOwned, Serialize};

use crate::db::tables::prefix_of;
use crate::error::Result;

const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(value, BINCODE_CONFIG)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(value)
}

/// Load and decode a single record
pub fn load<T, Tb>(table: &Tb, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    Tb: ReadableTable<&'static str, &'static [u8]>,
{
    table
        .get(key)?
        .map(|guard| decode(guard.value()))
        .transpose()
}

/// Whether a key is present, without decoding the value
pub fn exists<Tb>(table: &Tb, key: &str) -> Result<bool>
where
    Tb: ReadableTable<&'static str, &'static [u8]>,
{
    Ok(table.get(key)?.is_some())
}

/// Encode and insert a record, replacing any previous value
pub fn store<T: Serialize>(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = encode(value)?;
    table.insert(key, bytes.as_slice())?;
    Ok(())
}

/// Remove a key; returns whether it existed
pub fn remove(table: &mut Table<'_, &'static str, &'static [u8]>, key: &str) -> Result<bool> {
    Ok(table.remove(key)?.is_some())
}

/// Decode every record in a table
pub fn load_all<T, Tb>(table: &Tb) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    Tb: ReadableTable<&'static str, &'static [u8]>,
{
    let mut records = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        records.push(decode(value.value())?);
    }
    Ok(records)
}

/// Decode every record whose composite key starts with `parent:`
pub fn load_children<T, Tb>(table: &Tb, parent: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    Tb: ReadableTable<&'static str, &'static [u8]>,
{
    let prefix = prefix_of(parent);
    let mut records = Vec::new();
    for entry in table.range(prefix.as_str()..)? {
        let (key, value) = entry?;
        if !key.value().starts_with(prefix.as_str()) {
            break;
        }
        records.push(decode(value.value())?);
    }
    Ok(records)
}

/// Count composite keys under `parent:` without decoding values
pub fn count_children<Tb>(table: &Tb, parent: &str) -> Result<usize>
where
    Tb: ReadableTable<&'static str, &'static [u8]>,
{
    let prefix = prefix_of(parent);
    let mut count = 0;
    for entry in table.range(prefix.as_str()..)? {
        let (key, _) = entry?;
        if !key.value().starts_with(prefix.as_str()) {
            break;
        }
        count += 1;
    }
    Ok(count)
}

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// One compact JSON object per line, keys sorted at every level.
///
/// Going through `Value` sorts keys because its map is a `BTreeMap`.
pub fn format_jsonl<T: Serialize>(records: &[T]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        let value: Value = serde_json::to_value(record)?;
        out.push_str(&serde_json::to_string(&value)?);
        out.push('\n');
    }
    Ok(out)
}

/// Pretty-printed object with sorted keys and no trailing newline.
pub fn format_pretty<T: Serialize>(record: &T) -> Result<String> {
    let value: Value = serde_json::to_value(record)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

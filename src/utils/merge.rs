//! Recursive structural merge of JSON values.
//!
//! Used to combine per-call request options with the request the client
//! computes for each operation. When both sides hold an object at the same
//! key the objects are merged; in every other case the override wins,
//! including arrays and `null`. No shape is validated here.

use serde_json::Value;

/// Merge `overlay` on top of `base`, returning a new value.
///
/// ```
/// use serde_json::json;
/// use vault_client::utils::deep_merge;
///
/// let base = json!({ "headers": { "a": "1" }, "method": "GET" });
/// let overlay = json!({ "headers": { "b": "2" }, "method": "PUT" });
/// assert_eq!(
///     deep_merge(&base, &overlay),
///     json!({ "headers": { "a": "1", "b": "2" }, "method": "PUT" })
/// );
/// ```
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    let mut merged = base.clone();
    merge_into(&mut merged, overlay);
    merged
}

/// In-place variant of [`deep_merge`].
pub fn merge_into(target: &mut Value, overlay: &Value) {
    match (target, overlay) {
        (Value::Object(target_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match target_map.get_mut(key) {
                    Some(existing) => merge_into(existing, overlay_value),
                    None => {
                        target_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (target, overlay) => *target = overlay.clone(),
    }
}

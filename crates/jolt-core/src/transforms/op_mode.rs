use serde_json::{Map, Value};

use crate::traversr::grow_to;

/// When a value-producing transform is allowed to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMode {
    /// Always.
    Overwrite,
    /// When the target is absent or null. For arrays: past the current end,
    /// or a null element.
    Default,
    /// When the target is absent. For arrays: at or past the length the
    /// array had before the transform touched it.
    Define,
}

impl OpMode {
    pub fn allows_map(self, map: &Map<String, Value>, key: &str) -> bool {
        match self {
            OpMode::Overwrite => true,
            OpMode::Default => map.get(key).map_or(true, Value::is_null),
            OpMode::Define => !map.contains_key(key),
        }
    }

    pub fn allows_list(self, list: &[Value], index: usize, orig_size: usize) -> bool {
        match self {
            OpMode::Overwrite => true,
            OpMode::Default => list.get(index).map_or(true, Value::is_null),
            OpMode::Define => index >= orig_size,
        }
    }

    /// Writes `value` into `container` under `key`/`index` if this mode
    /// allows it. Arrays grow with nulls to reach the index, up to
    /// [`MAX_ARRAY_INDEX`](crate::traversr::MAX_ARRAY_INDEX).
    ///
    /// `orig_size` is the array's length before the transform started on
    /// it; it defaults to the current length.
    pub(crate) fn write(
        self,
        container: &mut Value,
        key: &str,
        index: Option<usize>,
        value: Value,
        orig_size: Option<usize>,
    ) -> bool {
        match container {
            Value::Object(map) => {
                if !self.allows_map(map, key) {
                    return false;
                }
                map.insert(key.to_string(), value);
                true
            }
            Value::Array(list) => {
                let Some(index) = index.or_else(|| key.parse().ok()) else {
                    return false;
                };
                if !self.allows_list(list, index, orig_size.unwrap_or(list.len())) {
                    return false;
                }
                if !grow_to(list, index) {
                    return false;
                }
                list[index] = value;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_modes() {
        let mut tree = json!({"present": 1, "nil": null});
        assert!(!OpMode::Default.write(&mut tree, "present", None, json!(2), None));
        assert!(OpMode::Default.write(&mut tree, "nil", None, json!(2), None));
        assert!(!OpMode::Define.write(&mut tree, "nil", None, json!(3), None));
        assert!(OpMode::Define.write(&mut tree, "new", None, json!(3), None));
        assert!(OpMode::Overwrite.write(&mut tree, "present", None, json!(9), None));
        assert_eq!(tree, json!({"present": 9, "nil": 2, "new": 3}));
    }

    #[test]
    fn test_list_modes() {
        let mut list = json!([1, null]);
        assert!(!OpMode::Default.write(&mut list, "0", Some(0), json!(5), None));
        assert!(OpMode::Default.write(&mut list, "1", Some(1), json!(5), None));
        assert!(OpMode::Default.write(&mut list, "3", Some(3), json!(7), None));
        assert_eq!(list, json!([1, 5, null, 7]));

        // Define only writes past the original length.
        assert!(OpMode::Define.write(&mut list, "2", Some(2), json!(0), Some(2)));
        assert!(!OpMode::Define.write(&mut list, "1", Some(1), json!(0), Some(2)));
        assert_eq!(list, json!([1, 5, 0, 7]));
    }

    #[test]
    fn test_list_index_past_limit_is_skipped() {
        let mut list = json!([1]);
        let index = crate::traversr::MAX_ARRAY_INDEX + 1;
        assert!(!OpMode::Overwrite.write(&mut list, "", Some(index), json!(2), None));
        assert!(!OpMode::Define.write(&mut list, "", Some(usize::MAX), json!(2), None));
        assert_eq!(list, json!([1]));
    }

    #[test]
    fn test_scalar_container_is_not_written() {
        let mut scalar = json!("text");
        assert!(!OpMode::Overwrite.write(&mut scalar, "a", None, json!(1), None));
    }
}

use serde_json::{Map, Value};

/// Largest index an array write may grow an array to. Indices can come from
/// input data (`[&0]`, `[@(1,id)]`); anything past this is skipped.
pub const MAX_ARRAY_INDEX: usize = 1 << 20;

/// Pads `list` with nulls so `index` is in bounds. Returns false, leaving
/// `list` alone, when `index` is past [`MAX_ARRAY_INDEX`].
pub(crate) fn grow_to(list: &mut Vec<Value>, index: usize) -> bool {
    if index > MAX_ARRAY_INDEX {
        tracing::trace!(index, "array index past the growth limit, skipping write");
        return false;
    }
    match index.checked_add(1) {
        Some(len) if list.len() < len => list.resize(len, Value::Null),
        Some(_) => {}
        None => return false,
    }
    true
}

/// How one path segment addresses its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Object key.
    Map,
    /// Explicit array index; the array grows with nulls to reach it.
    Array,
    /// `[]`: append to the array.
    AutoExpand,
}

impl StepKind {
    /// Classifies a canonical segment: `[]` auto-expands, any other bracketed
    /// segment is an array index, everything else is an object key.
    pub fn classify(canonical: &str) -> Self {
        if canonical == "[]" {
            StepKind::AutoExpand
        } else if canonical.starts_with('[') && canonical.ends_with(']') {
            StepKind::Array
        } else {
            StepKind::Map
        }
    }
}

/// One link of a compiled path; owns the step after it.
#[derive(Debug, Clone)]
pub struct TraversalStep {
    kind: StepKind,
    child: Option<Box<TraversalStep>>,
}

impl TraversalStep {
    pub(crate) fn new(kind: StepKind, child: Option<Box<TraversalStep>>) -> Self {
        Self { kind, child }
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn child(&self) -> Option<&TraversalStep> {
        self.child.as_deref()
    }

    /// Whether `tree` is the container this step walks.
    pub fn accepts(&self, tree: &Value) -> bool {
        match self.kind {
            StepKind::Map => tree.is_object(),
            StepKind::Array | StepKind::AutoExpand => tree.is_array(),
        }
    }

    /// An empty container of the kind this step walks.
    pub fn new_container(&self) -> Value {
        match self.kind {
            StepKind::Map => Value::Object(Map::new()),
            StepKind::Array | StepKind::AutoExpand => Value::Array(Vec::new()),
        }
    }

    pub fn get<'t>(&self, tree: &'t Value, key: &str) -> Option<&'t Value> {
        match (self.kind, tree) {
            (StepKind::Map, Value::Object(map)) => map.get(key),
            (StepKind::Array, Value::Array(list)) => list.get(key.parse::<usize>().ok()?),
            _ => None,
        }
    }

    pub fn get_mut<'t>(&self, tree: &'t mut Value, key: &str) -> Option<&'t mut Value> {
        match (self.kind, tree) {
            (StepKind::Map, Value::Object(map)) => map.get_mut(key),
            (StepKind::Array, Value::Array(list)) => list.get_mut(key.parse::<usize>().ok()?),
            _ => None,
        }
    }

    /// Unconditionally stores `data` under `key` and returns the stored slot.
    pub fn overwrite_set<'t>(&self, tree: &'t mut Value, key: &str, data: Value) -> Option<&'t mut Value> {
        match (self.kind, tree) {
            (StepKind::Map, Value::Object(map)) => {
                map.insert(key.to_string(), data);
                map.get_mut(key)
            }
            (StepKind::Array, Value::Array(list)) => {
                let index = key.parse::<usize>().ok()?;
                if !grow_to(list, index) {
                    return None;
                }
                list[index] = data;
                list.get_mut(index)
            }
            (StepKind::AutoExpand, Value::Array(list)) => {
                if key != "[]" {
                    return None;
                }
                list.push(data);
                list.last_mut()
            }
            _ => None,
        }
    }

    pub fn remove(&self, tree: &mut Value, key: &str) -> Option<Value> {
        match (self.kind, tree) {
            (StepKind::Map, Value::Object(map)) => map.shift_remove(key),
            (StepKind::Array, Value::Array(list)) => {
                let index = key.parse::<usize>().ok()?;
                (index < list.len()).then(|| list.remove(index))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify() {
        assert_eq!(StepKind::classify("[]"), StepKind::AutoExpand);
        assert_eq!(StepKind::classify("[3]"), StepKind::Array);
        assert_eq!(StepKind::classify("[&(1,0)]"), StepKind::Array);
        assert_eq!(StepKind::classify("photos"), StepKind::Map);
        assert_eq!(StepKind::classify(r"\[x]"), StepKind::Map);
    }

    #[test]
    fn test_array_overwrite_grows_with_nulls() {
        let step = TraversalStep::new(StepKind::Array, None);
        let mut tree = json!(["a"]);
        step.overwrite_set(&mut tree, "3", json!("d"));
        assert_eq!(tree, json!(["a", null, null, "d"]));
        assert!(step.overwrite_set(&mut tree, "x", json!(1)).is_none());
    }

    #[test]
    fn test_array_growth_is_bounded() {
        let step = TraversalStep::new(StepKind::Array, None);
        let mut tree = json!([]);
        let past_limit = (MAX_ARRAY_INDEX + 1).to_string();
        assert!(step.overwrite_set(&mut tree, &past_limit, json!(1)).is_none());
        assert!(step.overwrite_set(&mut tree, &usize::MAX.to_string(), json!(1)).is_none());
        assert_eq!(tree, json!([]));

        let mut list = vec![json!("a")];
        assert!(grow_to(&mut list, 2));
        assert_eq!(list, vec![json!("a"), json!(null), json!(null)]);
        assert!(grow_to(&mut list, 0));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_map_remove_keeps_order() {
        let step = TraversalStep::new(StepKind::Map, None);
        let mut tree = json!({"a": 1, "b": 2, "c": 3});
        assert_eq!(step.remove(&mut tree, "b"), Some(json!(2)));
        let keys: Vec<&String> = tree.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}

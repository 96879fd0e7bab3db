use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

/// Type-keyed per-frame storage, used to hand data from declaration time to
/// execution time without going through the resource tables. Holds at most
/// one value per type and is emptied when the graph resets.
#[derive(Default)]
pub struct Blackboard {
    values: HashMap<TypeId, Box<dyn Any>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: 'static>(&mut self, value: T) {
        let previous = self.values.insert(TypeId::of::<T>(), Box::new(value));
        assert!(
            previous.is_none(),
            "blackboard already holds a value of type {}",
            type_name::<T>()
        );
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.values
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut())
    }

    pub fn expect<T: 'static>(&self) -> &T {
        self.get().unwrap_or_else(|| {
            panic!("blackboard has no value of type {}", type_name::<T>())
        })
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct DrawList(Vec<u32>);

    #[test]
    fn stores_one_value_per_type() {
        let mut blackboard = Blackboard::new();
        blackboard.insert(DrawList(vec![1, 2, 3]));
        blackboard.insert(42u32);
        assert_eq!(blackboard.get::<DrawList>(), Some(&DrawList(vec![1, 2, 3])));
        assert_eq!(blackboard.get::<u32>(), Some(&42));
        assert_eq!(blackboard.get::<i64>(), None);
        assert_eq!(blackboard.len(), 2);
    }

    #[test]
    #[should_panic(expected = "already holds a value")]
    fn duplicate_insert_panics() {
        let mut blackboard = Blackboard::new();
        blackboard.insert(1u32);
        blackboard.insert(2u32);
    }

    #[test]
    #[should_panic(expected = "no value of type")]
    fn expect_missing_panics() {
        let blackboard = Blackboard::new();
        blackboard.expect::<DrawList>();
    }

    #[test]
    fn get_mut_and_clear() {
        let mut blackboard = Blackboard::new();
        blackboard.insert(DrawList(Vec::new()));
        blackboard.get_mut::<DrawList>().unwrap().0.push(7);
        assert_eq!(blackboard.expect::<DrawList>().0, vec![7]);
        blackboard.clear();
        assert!(blackboard.is_empty());
    }
}

use indexmap::IndexSet;

pub trait Combine {
    /// Combine two values, preferring the values in `self`.
    ///
    /// Scalars from the higher precedence layer win. Sets are merged, with
    /// the items of the higher precedence layer placed first.
    #[must_use]
    fn combine(self, other: Self) -> Self;
}

macro_rules! impl_combine_or {
    ($name:ty) => {
        impl Combine for Option<$name> {
            fn combine(self, other: Option<$name>) -> Option<$name> {
                self.or(other)
            }
        }
    };
}

impl_combine_or!(bool);

impl<T> Combine for Option<IndexSet<T>>
where
    T: Eq + std::hash::Hash,
{
    /// Combine two IndexSets by extending the set in `self` with the set in `other`, if they're
    /// both `Some`.
    fn combine(self, other: Option<IndexSet<T>>) -> Option<IndexSet<T>> {
        match (self, other) {
            (Some(mut a), Some(b)) => {
                a.extend(b);
                Some(a)
            }
            (a, b) => a.or(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_prefer_self() {
        assert_eq!(Some(false).combine(Some(true)), Some(false));
        assert_eq!(None.combine(Some(true)), Some(true));
        assert_eq!(None::<bool>.combine(None), None);
    }

    #[test]
    fn test_sets_merge_with_self_first() {
        let high: IndexSet<&str> = ["b", "a"].into_iter().collect();
        let low: IndexSet<&str> = ["a", "c"].into_iter().collect();
        let merged = Some(high).combine(Some(low)).unwrap();
        assert_eq!(merged.into_iter().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }
}

/// Remove the first element matching `pred`, keeping the order of the rest.
///
/// Returns the removed element, or `None` if nothing matched.
pub(crate) fn remove_first<T, F>(items: &mut Vec<T>, pred: F) -> Option<T>
where
    F: FnMut(&T) -> bool,
{
    let index = items.iter().position(pred)?;
    Some(items.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_only_first_match() {
        let mut items = vec![1, 2, 3, 2];
        assert_eq!(remove_first(&mut items, |x| *x == 2), Some(2));
        assert_eq!(items, vec![1, 3, 2]);
    }

    #[test]
    fn missing_is_noop() {
        let mut items = vec![1, 2, 3];
        assert_eq!(remove_first(&mut items, |x| *x == 9), None);
        assert_eq!(items, vec![1, 2, 3]);
    }
}

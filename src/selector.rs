//! Argument selection for key computation

use std::borrow::Cow;

use serde_json::Value;

use crate::KeyError;

/// Reduce a call's arguments to the candidates named by `indices`.
///
/// With no indices every argument is a candidate, in call order, and the
/// input is borrowed as-is. Otherwise the result follows the order of
/// `indices`, which may reorder or repeat positions.
pub fn select<'a>(args: &'a [Value], indices: &[usize]) -> Result<Cow<'a, [Value]>, KeyError> {
    if indices.is_empty() {
        return Ok(Cow::Borrowed(args));
    }

    indices
        .iter()
        .map(|&index| {
            args.get(index).cloned().ok_or(KeyError::IndexOutOfRange {
                index,
                len: args.len(),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Cow::Owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_indices_borrow_all_arguments() {
        let args = vec![json!(1), json!("two"), json!({ "three": 3 })];
        let selected = select(&args, &[]).expect("no indices");
        assert!(matches!(selected, Cow::Borrowed(_)));
        assert_eq!(selected.as_ref(), args.as_slice());
    }

    #[test]
    fn test_indices_reorder_and_repeat() {
        let args = vec![json!("a"), json!("b"), json!("c")];
        assert_eq!(
            select(&args, &[2, 0]).expect("in range").as_ref(),
            &[json!("c"), json!("a")]
        );
        assert_eq!(
            select(&args, &[1, 1]).expect("in range").as_ref(),
            &[json!("b"), json!("b")]
        );
    }

    #[test]
    fn test_out_of_range_index() {
        let args = vec![json!("only")];
        assert_eq!(
            select(&args, &[0, 3]),
            Err(KeyError::IndexOutOfRange { index: 3, len: 1 })
        );
    }
}

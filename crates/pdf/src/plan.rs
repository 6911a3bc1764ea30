//! Ordered page edit transactions.

use crate::{EditError, PaperSize, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageEdit {
    Remove,
    InsertBlank(PaperSize),
}

/// One edit at a zero-based page index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageOp {
    pub index: usize,
    pub edit: PageEdit,
}

/// Plan that blanks `indices`: for each index in ascending order, remove the
/// page there and insert a blank one at the same index. Each pair leaves the
/// page count unchanged, so later indices keep their meaning.
pub fn blank_out_plan(indices: &[usize], size: PaperSize) -> Vec<PageOp> {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    sorted
        .into_iter()
        .flat_map(|index| {
            [
                PageOp {
                    index,
                    edit: PageEdit::Remove,
                },
                PageOp {
                    index,
                    edit: PageEdit::InsertBlank(size),
                },
            ]
        })
        .collect()
}

/// Applies `plan` left to right to a page sequence. `blank` builds the
/// element for an inserted page.
pub fn apply_plan<T>(
    pages: &mut Vec<T>,
    plan: &[PageOp],
    mut blank: impl FnMut(PaperSize) -> T,
) -> Result<()> {
    for op in plan {
        match op.edit {
            PageEdit::Remove => {
                if op.index >= pages.len() {
                    return Err(EditError::PageOutOfRange {
                        index: op.index,
                        count: pages.len(),
                    });
                }
                pages.remove(op.index);
            }
            PageEdit::InsertBlank(size) => {
                if op.index > pages.len() {
                    return Err(EditError::PageOutOfRange {
                        index: op.index,
                        count: pages.len(),
                    });
                }
                pages.insert(op.index, blank(size));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_is_sorted_pairs() {
        let plan = blank_out_plan(&[4, 1, 4], PaperSize::A4);
        let indices: Vec<usize> = plan.iter().map(|op| op.index).collect();
        assert_eq!(indices, vec![1, 1, 4, 4]);
        assert_eq!(plan[0].edit, PageEdit::Remove);
        assert_eq!(plan[1].edit, PageEdit::InsertBlank(PaperSize::A4));
    }

    #[test]
    fn test_blanking_does_not_drift() {
        let mut pages: Vec<String> = (1..=10).map(|n| format!("p{}", n)).collect();
        let plan = blank_out_plan(&[1, 4], PaperSize::A4);
        apply_plan(&mut pages, &plan, |_| "blank".to_string()).unwrap();

        assert_eq!(
            pages,
            vec!["p1", "blank", "p3", "p4", "blank", "p6", "p7", "p8", "p9", "p10"]
        );
    }

    #[test]
    fn test_out_of_range_op_fails() {
        let mut pages = vec![1, 2, 3];
        let plan = blank_out_plan(&[3], PaperSize::A4);
        let err = apply_plan(&mut pages, &plan, |_| 0).unwrap_err();
        assert!(matches!(err, EditError::PageOutOfRange { index: 3, count: 3 }));
        assert_eq!(pages, vec![1, 2, 3]);
    }
}

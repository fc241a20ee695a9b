//! 规则树变更原语
//!
//! 每个原语都是纯函数：输入树和路径，返回新树，原树不变。
//! 路径是从根开始的子节点下标序列，必须指向规则组；条件节点通过其父组的 `update_child` 编辑。

use crate::error::{Result, SegmentError};
use crate::models::{MAX_NESTING_DEPTH, RuleChild, RuleNode, RuleTree};

/// 复制整棵树并在路径指向的规则组上执行修改
fn modify_group<F>(tree: &RuleTree, path: &[usize], f: F) -> Result<RuleTree>
where
    F: FnOnce(&mut RuleTree) -> Result<()>,
{
    let mut next = tree.clone();
    let group = next
        .group_at_mut(path)
        .ok_or_else(|| SegmentError::InvalidPath {
            path: path.to_vec(),
        })?;
    f(group)?;
    Ok(next)
}

fn check_index(group: &RuleTree, index: usize) -> Result<()> {
    if index >= group.children.len() {
        return Err(SegmentError::IndexOutOfBounds {
            index,
            len: group.children.len(),
        });
    }
    Ok(())
}

/// 在路径处新增规则组是否仍在层数限制内
pub fn can_add_group(path: &[usize]) -> bool {
    path.len() + 1 < MAX_NESTING_DEPTH
}

/// 切换 AND/OR
pub fn toggle_logic(tree: &RuleTree, path: &[usize]) -> Result<RuleTree> {
    modify_group(tree, path, |group| {
        group.logic = group.logic.toggled();
        Ok(())
    })
}

/// 追加一个默认条件
pub fn add_condition(tree: &RuleTree, path: &[usize]) -> Result<RuleTree> {
    modify_group(tree, path, |group| {
        group.children.push(RuleChild::Condition(RuleNode::default_node()));
        Ok(())
    })
}

/// 追加一个空规则组，超过层数限制时拒绝
pub fn add_group(tree: &RuleTree, path: &[usize]) -> Result<RuleTree> {
    if !can_add_group(path) {
        return Err(SegmentError::DepthExceeded {
            depth: path.len() + 1,
            max: MAX_NESTING_DEPTH,
        });
    }

    modify_group(tree, path, |group| {
        group.children.push(RuleChild::Group(RuleTree::empty()));
        Ok(())
    })
}

/// 替换路径下第 index 个子节点
///
/// 替换为规则组时同样检查层数，不会静默截断。
pub fn update_child(
    tree: &RuleTree,
    path: &[usize],
    index: usize,
    child: RuleChild,
) -> Result<RuleTree> {
    if let RuleChild::Group(group) = &child {
        let levels = path.len() + 1 + group.depth();
        if levels > MAX_NESTING_DEPTH {
            return Err(SegmentError::DepthExceeded {
                depth: levels - 1,
                max: MAX_NESTING_DEPTH,
            });
        }
    }

    modify_group(tree, path, |group| {
        check_index(group, index)?;
        group.children[index] = child;
        Ok(())
    })
}

/// 整树替换（导入建议等），超过层数限制的树整体拒绝
pub fn replace_tree(next: &RuleTree) -> Result<RuleTree> {
    let levels = next.depth();
    if levels > MAX_NESTING_DEPTH {
        return Err(SegmentError::DepthExceeded {
            depth: levels - 1,
            max: MAX_NESTING_DEPTH,
        });
    }
    Ok(next.clone())
}

/// 删除路径下第 index 个子节点，允许删到空树
pub fn remove_child(tree: &RuleTree, path: &[usize], index: usize) -> Result<RuleTree> {
    modify_group(tree, path, |group| {
        check_index(group, index)?;
        group.children.remove(index);
        Ok(())
    })
}

/// 同级拖拽排序：把 from 位置的子节点移动到 to 位置
pub fn reorder(tree: &RuleTree, path: &[usize], from: usize, to: usize) -> Result<RuleTree> {
    modify_group(tree, path, |group| {
        check_index(group, from)?;
        check_index(group, to)?;
        let child = group.children.remove(from);
        group.children.insert(to, child);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Operator;
    use crate::models::{LogicalOperator, RuleValue};

    fn node(field: &str, n: f64) -> RuleChild {
        RuleNode::new(field, Operator::Gte, RuleValue::Number(n)).into()
    }

    fn sample_tree() -> RuleTree {
        RuleTree::and(vec![
            node("arr", 1.0),
            RuleTree::or(vec![node("health_score", 2.0)]).into(),
            node("mrr", 3.0),
        ])
    }

    #[test]
    fn test_toggle_logic_nested() {
        let tree = sample_tree();
        let next = toggle_logic(&tree, &[1]).unwrap();

        assert_eq!(next.group_at(&[1]).unwrap().logic, LogicalOperator::And);
        assert_eq!(next.logic, LogicalOperator::And);
        // 原树不变
        assert_eq!(tree.group_at(&[1]).unwrap().logic, LogicalOperator::Or);
    }

    #[test]
    fn test_add_condition_appends_default() {
        let next = add_condition(&sample_tree(), &[1]).unwrap();
        let group = next.group_at(&[1]).unwrap();
        assert_eq!(group.children.len(), 2);
        assert_eq!(group.children[1], RuleChild::Condition(RuleNode::default_node()));
    }

    #[test]
    fn test_add_group_depth_limit() {
        let tree = sample_tree();
        let level2 = add_group(&tree, &[1]).unwrap();
        assert_eq!(level2.depth(), 3);

        let err = add_group(&level2, &[1, 1]).unwrap_err();
        assert!(matches!(err, SegmentError::DepthExceeded { depth: 3, max: 3 }));
        assert!(!can_add_group(&[1, 1]));
        assert!(can_add_group(&[1]));
    }

    #[test]
    fn test_path_to_condition_is_invalid() {
        let err = add_condition(&sample_tree(), &[0]).unwrap_err();
        assert!(matches!(err, SegmentError::InvalidPath { .. }));
    }

    #[test]
    fn test_update_child() {
        let next = update_child(&sample_tree(), &[], 2, node("nps_score", 9.0)).unwrap();
        assert_eq!(next.children[2], node("nps_score", 9.0));

        let err = update_child(&sample_tree(), &[], 7, node("arr", 0.0)).unwrap_err();
        assert!(matches!(err, SegmentError::IndexOutOfBounds { index: 7, len: 3 }));
    }

    #[test]
    fn test_update_child_rejects_too_deep_group() {
        let deep = RuleTree::and(vec![RuleTree::and(vec![node("arr", 1.0)]).into()]);
        let err = update_child(&sample_tree(), &[1], 0, deep.into()).unwrap_err();
        assert!(matches!(err, SegmentError::DepthExceeded { .. }));
    }

    #[test]
    fn test_replace_tree_depth_limit() {
        let level3 = RuleTree::and(vec![
            RuleTree::and(vec![RuleTree::and(vec![node("arr", 1.0)]).into()]).into(),
        ]);
        assert_eq!(replace_tree(&level3).unwrap(), level3);

        let level4 = RuleTree::and(vec![level3.into()]);
        let err = replace_tree(&level4).unwrap_err();
        assert!(matches!(err, SegmentError::DepthExceeded { depth: 3, max: 3 }));
    }

    #[test]
    fn test_remove_last_child_leaves_empty_tree() {
        let tree = RuleTree::and(vec![node("arr", 1.0)]);
        let next = remove_child(&tree, &[], 0).unwrap();
        assert!(next.is_empty());
    }

    #[test]
    fn test_reorder_within_siblings() {
        let next = reorder(&sample_tree(), &[], 0, 2).unwrap();
        assert_eq!(
            next.children[0],
            RuleChild::Group(RuleTree::or(vec![node("health_score", 2.0)]))
        );
        assert_eq!(next.children[2], node("arr", 1.0));

        let err = reorder(&sample_tree(), &[], 0, 3).unwrap_err();
        assert!(matches!(err, SegmentError::IndexOutOfBounds { .. }));
    }
}

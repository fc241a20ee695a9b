//! 规则树编辑器
//!
//! 在变更原语之上维护线性撤销/重做历史。每次变更把变更前的树压入撤销栈并清空重做栈；
//! 历史中存的是整棵树的快照而不是增量。

use segment_shared::config::EditorConfig;
use std::collections::VecDeque;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::models::{RuleChild, RuleTree};
use crate::mutations;

/// 一次编辑操作
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    ToggleLogic {
        path: Vec<usize>,
    },
    AddCondition {
        path: Vec<usize>,
    },
    AddGroup {
        path: Vec<usize>,
    },
    UpdateChild {
        path: Vec<usize>,
        index: usize,
        child: RuleChild,
    },
    RemoveChild {
        path: Vec<usize>,
        index: usize,
    },
    Reorder {
        path: Vec<usize>,
        from: usize,
        to: usize,
    },
    /// 整树替换（导入 NL 解析结果等）
    ReplaceTree(RuleTree),
}

impl Mutation {
    /// 对给定树执行变更，返回新树
    pub fn apply_to(&self, tree: &RuleTree) -> Result<RuleTree> {
        match self {
            Self::ToggleLogic { path } => mutations::toggle_logic(tree, path),
            Self::AddCondition { path } => mutations::add_condition(tree, path),
            Self::AddGroup { path } => mutations::add_group(tree, path),
            Self::UpdateChild { path, index, child } => {
                mutations::update_child(tree, path, *index, child.clone())
            }
            Self::RemoveChild { path, index } => mutations::remove_child(tree, path, *index),
            Self::Reorder { path, from, to } => mutations::reorder(tree, path, *from, *to),
            Self::ReplaceTree(next) => mutations::replace_tree(next),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ToggleLogic { .. } => "toggle_logic",
            Self::AddCondition { .. } => "add_condition",
            Self::AddGroup { .. } => "add_group",
            Self::UpdateChild { .. } => "update_child",
            Self::RemoveChild { .. } => "remove_child",
            Self::Reorder { .. } => "reorder",
            Self::ReplaceTree(_) => "replace_tree",
        }
    }
}

/// 带历史的规则树编辑器
///
/// 单个编辑会话独占，不支持跨会话并发访问。
#[derive(Debug, Clone)]
pub struct TreeEditor {
    current: RuleTree,
    undo_stack: VecDeque<RuleTree>,
    redo_stack: Vec<RuleTree>,
    history_limit: usize,
    /// 每次提交（apply/undo/redo/reset）加 1，供预览协调器识别新版本
    revision: u64,
}

impl TreeEditor {
    pub fn new(initial: RuleTree) -> Self {
        Self::with_history_limit(initial, EditorConfig::default().history_limit)
    }

    pub fn from_config(initial: RuleTree, config: &EditorConfig) -> Self {
        Self::with_history_limit(initial, config.history_limit)
    }

    pub fn with_history_limit(initial: RuleTree, history_limit: usize) -> Self {
        Self {
            current: initial,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            history_limit: history_limit.max(1),
            revision: 0,
        }
    }

    pub fn current(&self) -> &RuleTree {
        &self.current
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// 执行一次变更
    ///
    /// 失败（如层数超限）时状态完全不变，历史也不变。
    #[instrument(skip(self, mutation), fields(mutation = mutation.name()))]
    pub fn apply(&mut self, mutation: Mutation) -> Result<&RuleTree> {
        let next = mutation.apply_to(&self.current)?;
        let previous = std::mem::replace(&mut self.current, next);

        self.undo_stack.push_back(previous);
        if self.undo_stack.len() > self.history_limit {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
        self.revision += 1;

        debug!(
            revision = self.revision,
            undo_depth = self.undo_stack.len(),
            "mutation committed"
        );
        Ok(&self.current)
    }

    /// 撤销，撤销栈为空时返回 false
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.current, previous);
        self.redo_stack.push(current);
        self.revision += 1;
        true
    }

    /// 重做，重做栈为空时返回 false
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.current, next);
        self.undo_stack.push_back(current);
        if self.undo_stack.len() > self.history_limit {
            self.undo_stack.pop_front();
        }
        self.revision += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// 放弃编辑：清空两个栈并回到给定的树
    pub fn reset(&mut self, initial: RuleTree) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current = initial;
        self.revision += 1;
    }

    /// 给定路径上能否再新增规则组（供界面禁用按钮）
    pub fn can_add_group(&self, path: &[usize]) -> bool {
        mutations::can_add_group(path) && self.current.group_at(path).is_some()
    }
}

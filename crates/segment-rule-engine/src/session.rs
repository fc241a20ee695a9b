//! 分群编辑会话
//!
//! 一个会话对应用户打开一次分群编辑器：独占一个 `TreeEditor`，
//! 把每次提交的树转交给预览协调器，并在保存前做结构校验。
//! 会话结束（保存或取消）后规则树即被丢弃。

use segment_shared::config::EditorConfig;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::describe::describe_tree;
use crate::editor::{Mutation, TreeEditor};
use crate::error::{Result, SegmentError};
use crate::models::RuleTree;
use crate::preview::{PreviewHandle, PreviewSnapshot};
use crate::segment::{NlSuggestion, SegmentDefinition, SegmentMetadata, SegmentRepository};
use crate::validator::{ValidationReport, validate};

/// 低于该置信度的 NL 建议会记录告警，仍然允许导入
const LOW_CONFIDENCE: f64 = 0.5;

pub struct SegmentSession {
    id: Uuid,
    segment_id: Option<String>,
    initial: RuleTree,
    editor: TreeEditor,
    preview: Option<PreviewHandle>,
}

impl SegmentSession {
    /// 新建分群的会话
    pub fn new(initial: RuleTree, config: &EditorConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            segment_id: None,
            editor: TreeEditor::from_config(initial.clone(), config),
            initial,
            preview: None,
        }
    }

    /// 打开已保存的分群
    #[instrument(skip(repo, config))]
    pub async fn open(
        repo: &dyn SegmentRepository,
        segment_id: &str,
        config: &EditorConfig,
    ) -> Result<Self> {
        let definition = repo
            .load(segment_id)
            .await?
            .ok_or_else(|| SegmentError::SegmentNotFound(segment_id.to_string()))?;

        let mut session = Self::new(definition.rules, config);
        session.segment_id = Some(definition.id);

        info!(
            session_id = %session.id,
            conditions = session.tree().condition_count(),
            "segment opened for editing"
        );
        Ok(session)
    }

    /// 绑定预览协调器，并立即提交当前树
    pub fn with_preview(mut self, preview: PreviewHandle) -> Self {
        preview.commit(self.editor.current().clone());
        self.preview = Some(preview);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn segment_id(&self) -> Option<&str> {
        self.segment_id.as_deref()
    }

    pub fn tree(&self) -> &RuleTree {
        self.editor.current()
    }

    pub fn editor(&self) -> &TreeEditor {
        &self.editor
    }

    /// 当前是否与打开时的树不同
    pub fn is_dirty(&self) -> bool {
        self.editor.current() != &self.initial
    }

    pub fn preview(&self) -> Option<PreviewSnapshot> {
        self.preview.as_ref().map(PreviewHandle::snapshot)
    }

    #[instrument(skip(self, mutation), fields(session_id = %self.id))]
    pub fn apply(&mut self, mutation: Mutation) -> Result<&RuleTree> {
        self.editor.apply(mutation)?;
        self.commit();
        Ok(self.editor.current())
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.editor.undo();
        if changed {
            self.commit();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.editor.redo();
        if changed {
            self.commit();
        }
        changed
    }

    /// 放弃全部编辑，回到打开时的树
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn discard(&mut self) {
        self.editor.reset(self.initial.clone());
        self.commit();
    }

    pub fn can_add_group(&self, path: &[usize]) -> bool {
        self.editor.can_add_group(path)
    }

    pub fn validate(&self) -> ValidationReport {
        validate(self.editor.current())
    }

    pub fn describe(&self) -> String {
        describe_tree(self.editor.current())
    }

    /// 导入 NL 解析器的建议
    ///
    /// 建议整体替换当前树（可撤销），返回其校验结果，由用户决定是否继续修改。
    #[instrument(skip(self, suggestion), fields(session_id = %self.id, confidence = suggestion.confidence))]
    pub fn import_suggestion(&mut self, suggestion: NlSuggestion) -> Result<ValidationReport> {
        if suggestion.confidence < LOW_CONFIDENCE {
            warn!("low confidence rule suggestion imported");
        }

        self.apply(Mutation::ReplaceTree(suggestion.rules))?;
        Ok(self.validate())
    }

    /// 校验通过后保存，结构问题会阻止保存
    #[instrument(skip(self, repo, metadata), fields(session_id = %self.id, name = %metadata.name))]
    pub async fn save(
        &mut self,
        repo: &dyn SegmentRepository,
        metadata: SegmentMetadata,
    ) -> Result<SegmentDefinition> {
        let report = self.validate();
        if !report.valid {
            warn!(errors = report.errors.len(), "save blocked by validation errors");
            return Err(SegmentError::Validation(report));
        }

        let saved = repo
            .save(
                self.segment_id.clone(),
                metadata,
                self.editor.current().clone(),
            )
            .await?;

        // 保存后的树成为新的基线
        self.segment_id = Some(saved.id.clone());
        self.initial = saved.rules.clone();

        info!(segment_id = %saved.id, "segment saved");
        Ok(saved)
    }

    /// 结束会话，通知预览协调器退出
    pub fn close(self) {
        if let Some(preview) = &self.preview {
            preview.shutdown();
        }
    }

    fn commit(&self) {
        if let Some(preview) = &self.preview {
            if !preview.commit(self.editor.current().clone()) {
                warn!(session_id = %self.id, "preview coordinator is no longer running");
            }
        }
    }
}

//! 改写引擎
//!
//! 分类器把确定无误的匹配转换为 [`RewriteOp`] 并累积在 [`Plan`] 中：
//!
//! - 每个操作在入队时计算它覆盖的节点集合，与已有操作重叠的会被拒绝
//! - 被“收养”的子树（例如 figure 内容单元格的子节点）不计入覆盖范围，
//!   其中的节点仍可被其他操作改写
//! - figure/main 替换会丢弃原表格结构；完全落在被丢弃节点内的早先操作由它取代
//! - [`Plan::commit`] 在文档副本上按文档逆序（内层先于外层）执行全部操作，
//!   全部成功后才替换原文档
//!
//! - `builders`: 替换子树的构建
//! - `guard`: 幂等性检查与共享资源

pub mod builders;
pub mod guard;

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::error::{Context, RetrofitError, RetrofitResult};
use crate::parsers::html::{Document, NodeId};

pub use builders::{FigureSpec, MainSpec, PopupSpec, FOOTER_HTML};
pub use guard::Resource;

/// 替换结构
#[derive(Clone, Debug, PartialEq)]
pub enum Replacement {
    Figure(FigureSpec),
    Main(MainSpec),
    PopupAnchor(PopupSpec),
}

/// 单条改写操作
#[derive(Clone, Debug, PartialEq)]
pub enum RewriteOp {
    /// 用新结构替换整棵子树
    Replace { target: NodeId, replacement: Replacement },
    /// 用单个文本节点替换元素的全部内容
    ReplaceChildren { parent: NodeId, text: String },
    /// 替换文本节点的内容
    ReplaceText { target: NodeId, text: String },
    Remove { target: NodeId },
    /// 设置或删除属性（`None` 表示删除）
    SetAttrs {
        target: NodeId,
        attrs: Vec<(String, Option<String>)>,
    },
}

impl RewriteOp {
    pub fn anchor(&self) -> NodeId {
        match self {
            RewriteOp::Replace { target, .. }
            | RewriteOp::ReplaceText { target, .. }
            | RewriteOp::Remove { target }
            | RewriteOp::SetAttrs { target, .. } => *target,
            RewriteOp::ReplaceChildren { parent, .. } => *parent,
        }
    }

    /// 操作在结构上覆盖的节点
    fn covered(&self, document: &Document) -> HashSet<NodeId> {
        let subtree = |id: NodeId| -> Vec<NodeId> {
            std::iter::once(id).chain(document.descendants(id)).collect()
        };

        match self {
            RewriteOp::Replace {
                target,
                replacement,
            } => {
                let mut covered: HashSet<NodeId> = subtree(*target).into_iter().collect();
                let adopted_from: Vec<NodeId> = match replacement {
                    Replacement::Figure(spec) => {
                        spec.caption.into_iter().chain([spec.content_cell]).collect()
                    }
                    Replacement::Main(spec) => {
                        for removed in &spec.remove {
                            covered.extend(subtree(*removed));
                        }
                        covered.extend(spec.banner);
                        vec![spec.content_cell]
                    }
                    Replacement::PopupAnchor(spec) => vec![spec.anchor],
                };
                for from in adopted_from {
                    for child in document.children(from) {
                        for id in subtree(*child) {
                            covered.remove(&id);
                        }
                    }
                }
                covered
            }
            RewriteOp::ReplaceChildren { parent, .. } => document.descendants(*parent).into_iter().collect(),
            RewriteOp::ReplaceText { target, .. } => HashSet::from([*target]),
            RewriteOp::Remove { target } => subtree(*target).into_iter().collect(),
            RewriteOp::SetAttrs { .. } => HashSet::new(),
        }
    }

    /// 替换后连同属性一起丢弃的节点；横幅表格整体移入 `<main>`，不算丢弃
    fn discarded(&self, covered: &HashSet<NodeId>) -> Option<HashSet<NodeId>> {
        match self {
            RewriteOp::Replace {
                replacement: Replacement::Figure(_),
                ..
            } => Some(covered.clone()),
            RewriteOp::Replace {
                replacement: Replacement::Main(spec),
                ..
            } => {
                let mut discarded = covered.clone();
                if let Some(banner) = spec.banner {
                    discarded.remove(&banner);
                }
                Some(discarded)
            }
            _ => None,
        }
    }

    fn apply(&self, document: &mut Document) -> RetrofitResult<()> {
        match self {
            RewriteOp::Replace {
                target,
                replacement,
            } => {
                let new = match replacement {
                    Replacement::Figure(spec) => builders::build_figure(document, spec)?,
                    Replacement::Main(spec) => builders::build_main(document, spec)?,
                    Replacement::PopupAnchor(spec) => builders::build_popup_anchor(document, spec)?,
                };
                document.replace_with(*target, &[new])
            }
            RewriteOp::ReplaceChildren { parent, text } => {
                for child in document.children(*parent).to_vec() {
                    document.detach(child);
                }
                let text = document.create_text(text.clone());
                document.append(*parent, text)
            }
            RewriteOp::ReplaceText { target, text } => document.set_text(*target, text.clone()),
            RewriteOp::Remove { target } => {
                if document.parent(*target).is_none() {
                    return Err(RetrofitError::precondition("removal target is detached"));
                }
                document.detach(*target);
                Ok(())
            }
            RewriteOp::SetAttrs { target, attrs } => {
                if !document.is_element(*target) {
                    return Err(RetrofitError::precondition("attribute target is not an element"));
                }
                for (name, value) in attrs {
                    document.set_attr(*target, name, value.clone());
                }
                Ok(())
            }
        }
    }
}

struct Planned {
    op: RewriteOp,
    covered: HashSet<NodeId>,
}

impl Planned {
    /// 操作的目标和覆盖范围是否都在 `nodes` 之内
    fn within(&self, nodes: &HashSet<NodeId>) -> bool {
        nodes.contains(&self.op.anchor()) && self.covered.is_subset(nodes)
    }
}

/// 一份文档的改写计划
#[derive(Default)]
pub struct Plan {
    ops: Vec<Planned>,
    resources: BTreeSet<Resource>,
}

/// 提交结果
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub applied: usize,
    pub injected: Vec<Resource>,
}

impl CommitSummary {
    /// 文档是否被修改
    pub fn changed(&self) -> bool {
        self.applied > 0 || !self.injected.is_empty()
    }
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.resources.is_empty()
    }

    pub fn ops(&self) -> impl Iterator<Item = &RewriteOp> {
        self.ops.iter().map(|p| &p.op)
    }

    /// 操作是否与已接受的操作重叠
    fn conflict(
        earlier: &[&Planned],
        document: &Document,
        op: &RewriteOp,
        covered: &HashSet<NodeId>,
    ) -> Option<String> {
        for planned in earlier {
            if !covered.is_disjoint(&planned.covered) {
                return Some("overlaps the nodes of an earlier rewrite".to_string());
            }
            if let RewriteOp::SetAttrs { target, attrs } = op {
                if planned.covered.contains(target) {
                    return Some("changes attributes of a node replaced by an earlier rewrite".to_string());
                }
                if let RewriteOp::SetAttrs {
                    target: other,
                    attrs: other_attrs,
                } = &planned.op
                {
                    if other == target && attrs.iter().any(|(n, _)| other_attrs.iter().any(|(o, _)| o == n)) {
                        return Some("sets an attribute already changed by an earlier rewrite".to_string());
                    }
                }
            }
            if let RewriteOp::SetAttrs { target, .. } = &planned.op {
                if covered.contains(target) {
                    return Some("replaces a node whose attributes an earlier rewrite changes".to_string());
                }
            }
        }
        if !document.is_attached(op.anchor()) {
            return Some("target is not part of the document".to_string());
        }
        None
    }

    /// 加入一条操作；与已有操作重叠时返回前置条件错误，计划保持不变
    ///
    /// 早先的操作若完全落在本操作丢弃的节点内，则被本操作取代。
    pub fn push(&mut self, document: &Document, op: RewriteOp) -> RetrofitResult<()> {
        let covered = op.covered(document);
        let superseded: Vec<bool> = match op.discarded(&covered) {
            Some(discarded) => self.ops.iter().map(|p| p.within(&discarded)).collect(),
            None => vec![false; self.ops.len()],
        };

        let kept: Vec<&Planned> = self
            .ops
            .iter()
            .zip(&superseded)
            .filter(|(_, s)| !**s)
            .map(|(p, _)| p)
            .collect();
        if let Some(reason) = Self::conflict(&kept, document, &op, &covered) {
            return Err(RetrofitError::precondition(reason));
        }

        let dropped = superseded.iter().filter(|s| **s).count();
        if dropped > 0 {
            debug!(dropped, "earlier rewrites superseded");
            let ops = std::mem::take(&mut self.ops);
            self.ops = ops
                .into_iter()
                .zip(superseded)
                .filter_map(|(p, s)| (!s).then_some(p))
                .collect();
        }
        debug!(?op, "rewrite accepted");
        self.ops.push(Planned { op, covered });
        Ok(())
    }

    /// 声明依赖的共享资源；同一资源只记录一次
    pub fn require(&mut self, resource: Resource) {
        self.resources.insert(resource);
    }

    /// 在文档副本上执行全部操作，全部成功后才替换原文档
    pub fn commit(self, document: &mut Document) -> RetrofitResult<CommitSummary> {
        let mut working = document.clone();
        let order: HashMap<NodeId, usize> = working.document_order();

        let mut ops: Vec<&RewriteOp> = self.ops.iter().map(|p| &p.op).collect();
        // 内层先改：文本改写要在外层结构移走单元格内容之前完成
        ops.sort_by_key(|op| Reverse(order.get(&op.anchor()).copied().unwrap_or(0)));

        for op in &ops {
            op.apply(&mut working).context("Rewrite", format!("{:?}", op))?;
        }
        working.rebuild_index();

        let mut injected = Vec::new();
        for resource in &self.resources {
            if guard::inject(&mut working, resource)? {
                injected.push(resource.clone());
            }
        }

        let summary = CommitSummary {
            applied: ops.len(),
            injected,
        };
        if summary.changed() {
            *document = working;
        }
        Ok(summary)
    }
}

//! 文档树模型
//!
//! html5ever 先把字节解析为 `RcDom`，随后整棵树被导入到一个扁平的节点表（arena）中：
//!
//! - 每个节点由 [`NodeId`] 索引，子节点列表按文档顺序保存
//! - 父节点只是一个不拥有所有权的索引，用于祖先查询，从不用于传播修改
//! - 标签索引在每次提交改写后重建，不会被持久化
//!
//! 引擎对树只读；修改只能通过显式的替换/插入操作完成（见 `rewrite` 模块）。

use std::collections::HashMap;

use encoding_rs::Encoding;
use html5ever::tendril::TendrilSink;
use html5ever::{namespace_url, ns, parse_document, parse_fragment, LocalName, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::error::{RetrofitError, RetrofitResult};

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> RetrofitResult<RcDom> {
    let s: String = if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
        let (string, _, _) = encoding.decode(data);
        string.to_string()
    } else {
        String::from_utf8_lossy(data).to_string()
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
        .map_err(|e| RetrofitError::parse(format!("unable to parse document: {}", e)))
}

/// 节点索引
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// 元素属性
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attr {
    pub name: QualName,
    pub value: String,
}

impl Attr {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Attr {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        }
    }

    pub fn local(&self) -> &str {
        &self.name.local
    }
}

/// 节点内容
#[derive(Clone, Debug)]
pub enum NodeKind {
    Document,
    Doctype { name: String },
    Element { name: QualName, attrs: Vec<Attr> },
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, contents: String },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Clone, Debug, Default)]
struct TagIndex {
    by_tag: HashMap<String, Vec<NodeId>>,
}

/// 已解析的文档，拥有唯一的根节点
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    index: TagIndex,
}

impl Document {
    /// 解析字节流；编码未知时退回到有损 UTF-8 解码
    pub fn parse(data: &[u8], document_encoding: &str) -> RetrofitResult<Document> {
        let dom = html_to_dom(data, document_encoding)?;
        Ok(Document::from_rcdom(&dom))
    }

    pub fn from_rcdom(dom: &RcDom) -> Document {
        let mut document = Document {
            nodes: Vec::new(),
            root: NodeId(0),
            index: TagIndex::default(),
        };
        document.root = document.import(&dom.document);
        document.rebuild_index();
        document
    }

    fn import(&mut self, handle: &Handle) -> NodeId {
        let kind = match handle.data {
            NodeData::Document => NodeKind::Document,
            NodeData::Doctype { ref name, .. } => NodeKind::Doctype {
                name: name.to_string(),
            },
            NodeData::Text { ref contents } => NodeKind::Text(contents.borrow().to_string()),
            NodeData::Comment { ref contents } => NodeKind::Comment(contents.to_string()),
            NodeData::Element {
                ref name,
                ref attrs,
                ..
            } => NodeKind::Element {
                name: name.clone(),
                attrs: attrs
                    .borrow()
                    .iter()
                    .map(|a| Attr {
                        name: a.name.clone(),
                        value: a.value.to_string(),
                    })
                    .collect(),
            },
            NodeData::ProcessingInstruction {
                ref target,
                ref contents,
            } => NodeKind::ProcessingInstruction {
                target: target.to_string(),
                contents: contents.to_string(),
            },
        };
        let id = self.push(kind);

        // <template> 的内容保存在 template_contents 中，而不是 children
        let children: Vec<Handle> = match handle.data {
            NodeData::Element {
                ref template_contents,
                ..
            } => match template_contents.borrow().as_ref() {
                Some(contents) => contents.children.borrow().clone(),
                None => handle.children.borrow().clone(),
            },
            _ => handle.children.borrow().clone(),
        };
        for child in children.iter() {
            let child_id = self.import(child);
            self.link(id, child_id);
        }

        id
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// 重建标签索引（按文档顺序）
    pub(crate) fn rebuild_index(&mut self) {
        let mut index = TagIndex::default();
        for id in self.descendants(self.root) {
            if let Some(tag) = self.tag_name(id) {
                index.by_tag.entry(tag.to_string()).or_default().push(id);
            }
        }
        self.index = index;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// 仅返回元素子节点
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| self.is_element(*c))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    /// 获取节点名称
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        }
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id) == Some(tag)
    }

    pub fn attrs(&self, id: NodeId) -> &[Attr] {
        match self.kind(id) {
            NodeKind::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    /// 获取节点属性值
    pub fn attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.local() == attr_name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, id: NodeId, attr_name: &str) -> bool {
        self.attr(id, attr_name).is_some()
    }

    /// 以空白分隔的 class 列表
    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attr(id, "class")
            .map(|c| c.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// 所有后代文本节点拼接而成的文本
    pub fn text_content(&self, id: NodeId) -> String {
        self.text_content_with(id, None)
    }

    /// 同 [`Document::text_content`]，但用 `substitute` 替换某个文本节点的内容
    pub fn text_content_with(&self, id: NodeId, substitute: Option<(NodeId, &str)>) -> String {
        let mut out = String::new();
        if let Some((sub_id, sub_text)) = substitute {
            if sub_id == id {
                return sub_text.to_string();
            }
        }
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        for d in self.descendants(id) {
            match substitute {
                Some((sub_id, sub_text)) if sub_id == d => out.push_str(sub_text),
                _ => {
                    if let Some(text) = self.text(d) {
                        out.push_str(text);
                    }
                }
            }
        }
        out
    }

    /// 先序遍历的全部后代（不含自身）
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            found.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        found
    }

    /// 节点在文档先序遍历中的位置
    pub fn document_order(&self) -> HashMap<NodeId, usize> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .enumerate()
            .map(|(pos, id)| (id, pos))
            .collect()
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |p| self.parent(*p))
    }

    /// 最近的指定标签祖先
    pub fn nearest_ancestor(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.ancestors(id).find(|a| self.is_tag(*a, tag))
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// 节点是否仍挂在文档根上
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    /// 按文档顺序返回指定标签的全部元素
    pub fn elements_by_tag(&self, tag: &str) -> &[NodeId] {
        self.index
            .by_tag
            .get(tag)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.elements_by_tag(tag).first().copied()
    }

    /// 查找属性值满足条件的元素
    pub fn find_by_attr<'a>(
        &'a self,
        attr_name: &'a str,
        predicate: impl Fn(&str) -> bool + 'a,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(self.root)
            .into_iter()
            .filter(move |id| self.attr(*id, attr_name).is_some_and(|v| predicate(v)))
    }

    /// 同一父节点下的前一个/后一个元素兄弟（跳过空白文本和注释）
    pub fn element_sibling(&self, id: NodeId, forward: bool) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == id)?;
        let candidates: Box<dyn Iterator<Item = &NodeId>> = if forward {
            Box::new(siblings[pos + 1..].iter())
        } else {
            Box::new(siblings[..pos].iter().rev())
        };
        for sibling in candidates {
            match self.kind(*sibling) {
                NodeKind::Element { .. } => return Some(*sibling),
                NodeKind::Text(text) if text.trim().is_empty() => continue,
                NodeKind::Comment(_) => continue,
                _ => return None,
            }
        }
        None
    }

    /// 创建游离的元素节点
    pub fn create_element(&mut self, tag: &str, attrs: Vec<Attr>) -> NodeId {
        self.push(NodeKind::Element {
            name: QualName::new(None, ns!(html), LocalName::from(tag)),
            attrs,
        })
    }

    /// 创建游离的文本节点
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    /// 将 HTML 片段解析为一组游离节点
    pub fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        let dom = parse_fragment(
            RcDom::default(),
            Default::default(),
            QualName::new(None, ns!(html), LocalName::from("body")),
            vec![],
        )
        .one(html);

        // 片段解析器把内容放在一个合成的 <html> 元素下
        let container: Option<Handle> = dom.document.children.borrow().first().cloned();
        let mut imported = Vec::new();
        if let Some(container) = container {
            for child in container.children.borrow().iter() {
                imported.push(self.import(child));
            }
        }
        imported
    }

    /// 追加子节点；子节点必须是游离的
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> RetrofitResult<()> {
        if self.parent(child).is_some() {
            return Err(RetrofitError::precondition(
                "cannot append a node that already has a parent",
            ));
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(RetrofitError::precondition(
                "cannot append a node into its own subtree",
            ));
        }
        self.link(parent, child);
        Ok(())
    }

    /// 将节点从父节点上摘下
    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// 用一组游离节点原位替换 `target`，保持兄弟顺序
    pub(crate) fn replace_with(&mut self, target: NodeId, replacement: &[NodeId]) -> RetrofitResult<()> {
        let parent = self
            .parent(target)
            .ok_or_else(|| RetrofitError::precondition("replacement target is detached"))?;
        for r in replacement {
            if self.parent(*r).is_some() || *r == target || self.is_ancestor_of(*r, parent) {
                return Err(RetrofitError::precondition(
                    "replacement node is already part of the tree",
                ));
            }
        }
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == target)
            .ok_or_else(|| RetrofitError::precondition("target missing from its parent"))?;
        self.nodes[parent.0]
            .children
            .splice(pos..=pos, replacement.iter().copied());
        for r in replacement {
            self.nodes[r.0].parent = Some(parent);
        }
        self.nodes[target.0].parent = None;
        Ok(())
    }

    /// 把 `from` 的全部子节点按顺序移动到 `into` 的末尾
    pub(crate) fn move_children(&mut self, from: NodeId, into: NodeId) -> RetrofitResult<()> {
        if from == into || self.is_ancestor_of(from, into) {
            return Err(RetrofitError::precondition(
                "cannot move children into their own subtree",
            ));
        }
        let moved = std::mem::take(&mut self.nodes[from.0].children);
        for child in moved.iter() {
            self.nodes[child.0].parent = Some(into);
        }
        self.nodes[into.0].children.extend(moved);
        Ok(())
    }

    /// 替换文本节点内容
    pub(crate) fn set_text(&mut self, id: NodeId, text: String) -> RetrofitResult<()> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Text(existing) => {
                *existing = text;
                Ok(())
            }
            _ => Err(RetrofitError::precondition("target is not a text node")),
        }
    }

    /// 设置节点属性；值为 `None` 时删除该属性
    pub(crate) fn set_attr(&mut self, id: NodeId, attr_name: &str, attr_value: Option<String>) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            match attr_value {
                Some(value) => match attrs.iter_mut().find(|a| a.local() == attr_name) {
                    Some(existing) => existing.value = value,
                    None => attrs.push(Attr::new(attr_name, value)),
                },
                None => attrs.retain(|a| a.local() != attr_name),
            }
        }
    }
}

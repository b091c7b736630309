use super::dom::{Document, NodeId};

/// ASCII 空白字符
pub const WHITESPACES: &[char] = &[' ', '\t', '\n', '\x0c', '\r'];

/// 行内元素；查找“最近的结构容器”时会越过它们
pub const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "big", "br", "cite", "code", "em", "font", "i", "img", "small", "span",
    "strong", "sub", "sup", "tt", "u",
];

pub fn is_inline(tag: &str) -> bool {
    INLINE_ELEMENTS.contains(&tag)
}

/// 越过行内元素，返回最近的结构容器
pub fn structural_container(document: &Document, id: NodeId) -> Option<NodeId> {
    let mut current = document.parent(id)?;
    while let Some(tag) = document.tag_name(current) {
        if !is_inline(tag) {
            return Some(current);
        }
        current = document.parent(current)?;
    }
    Some(current)
}

/// 折叠连续空白
pub fn collapse_whitespace(text: &str) -> String {
    text.split(WHITESPACES)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

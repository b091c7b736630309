//! HTML 文档元数据处理模块
//!
//! - 提取字符编码声明，用于决定第二次解析与回写时的编码
//! - 检测文档中已存在的共享资源（样式表、脚本），供幂等检查使用
//! - 检测 frames/noframes 页面与自动生成的页面

use super::dom::{Document, NodeKind};

/// 解析 Content-Type 值，返回 (媒体类型, 字符集)
pub fn parse_content_type(content_type: &str) -> (String, String) {
    let mut parts = content_type.split(';');
    let media_type = parts.next().unwrap_or("").trim().to_lowercase();
    let mut charset = String::new();

    for part in parts {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("charset=") {
            charset = value.trim_matches('"').to_string();
        }
    }

    (media_type, charset)
}

/// 获取文档字符编码
///
/// 支持 `<meta charset="...">` 和
/// `<meta http-equiv="content-type" content="text/html; charset=...">` 两种格式。
pub fn get_charset(document: &Document) -> Option<String> {
    for meta in document.elements_by_tag("meta") {
        if let Some(charset) = document.attr(*meta, "charset") {
            return Some(charset.to_string());
        }

        if document
            .attr(*meta, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type")
        {
            if let Some(content) = document.attr(*meta, "content") {
                let (_media_type, charset) = parse_content_type(content);
                return Some(charset);
            }
        }
    }

    None
}

/// 文档中是否已有指向 `href` 的样式表链接
pub fn has_stylesheet(document: &Document, href: &str) -> bool {
    document
        .elements_by_tag("link")
        .iter()
        .any(|l| document.attr(*l, "href") == Some(href))
}

/// 文档中是否已有指向 `src` 的外部脚本
pub fn has_script(document: &Document, src: &str) -> bool {
    document
        .elements_by_tag("script")
        .iter()
        .any(|s| document.attr(*s, "src") == Some(src))
}

/// frames/noframes 页面不做处理
pub fn has_noframes(document: &Document) -> bool {
    document.first_by_tag("noframes").is_some() || document.first_by_tag("frameset").is_some()
}

/// 是否包含标记“autogenerated”的注释
pub fn is_autogenerated(document: &Document) -> bool {
    document.descendants(document.root()).iter().any(|id| {
        matches!(document.kind(*id), NodeKind::Comment(c) if c.to_lowercase().contains("autogenerated"))
    })
}

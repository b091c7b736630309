//! 替换子树的构建
//!
//! 构建函数只在提交阶段、针对文档副本调用；被“收养”的原有节点按原顺序移动进新结构。

use crate::error::RetrofitResult;
use crate::parsers::html::{Attr, Document, NodeId};

/// 标准化的 CC-BY-SA 页脚
pub const FOOTER_HTML: &str = r#"<footer class="standalone">
<p class="copyright"><a rel="license" href="https://creativecommons.org/licenses/by-sa/4.0/"><img alt="Creative Commons License" title="Creative Commons License" style="border-width:0" src="https://i.creativecommons.org/l/by-sa/4.0/88x31.png"></a>
 This work is licensed under a <br> <a rel="license" href="https://creativecommons.org/licenses/by-sa/4.0/">Creative Commons Attribution-ShareAlike 4.0 International License</a>.</p>
</footer>"#;

/// figure/figcaption 结构
#[derive(Clone, Debug, PartialEq)]
pub struct FigureSpec {
    /// 内容单元格，其子节点移入内层 div
    pub content_cell: NodeId,
    /// 标题，其子节点移入 figcaption
    pub caption: Option<NodeId>,
    pub caption_after: bool,
    pub figure_classes: Vec<String>,
    pub figure_style: Option<String>,
    pub inner_classes: Vec<String>,
    pub inner_style: Option<String>,
    pub caption_classes: Vec<String>,
}

/// 语义化的 `<main>` 容器
#[derive(Clone, Debug, PartialEq)]
pub struct MainSpec {
    pub content_cell: NodeId,
    /// 原样移入 `<main>` 开头的横幅表格
    pub banner: Option<NodeId>,
    /// 被整体删除的其他组成员
    pub remove: Vec<NodeId>,
    pub footer: bool,
}

/// 带 `popup` 类的普通链接
#[derive(Clone, Debug, PartialEq)]
pub struct PopupSpec {
    pub anchor: NodeId,
    pub href: String,
    pub title: Option<String>,
    pub classes: Vec<String>,
    /// 保留下来的其他属性，排在 href/title/class 之后
    pub rest: Vec<Attr>,
}

fn class_attr(classes: &[String]) -> Option<Attr> {
    if classes.is_empty() {
        None
    } else {
        Some(Attr::new("class", classes.join(" ")))
    }
}

fn element(document: &mut Document, tag: &str, classes: &[String], style: &Option<String>) -> NodeId {
    let mut attrs: Vec<Attr> = class_attr(classes).into_iter().collect();
    if let Some(style) = style {
        attrs.push(Attr::new("style", style.clone()));
    }
    document.create_element(tag, attrs)
}

pub fn build_figure(document: &mut Document, spec: &FigureSpec) -> RetrofitResult<NodeId> {
    let figure = element(document, "figure", &spec.figure_classes, &spec.figure_style);
    let inner = element(document, "div", &spec.inner_classes, &spec.inner_style);
    document.move_children(spec.content_cell, inner)?;

    let figcaption = match spec.caption {
        Some(caption) => {
            let figcaption = element(document, "figcaption", &spec.caption_classes, &None);
            document.move_children(caption, figcaption)?;
            Some(figcaption)
        }
        None => None,
    };

    match (figcaption, spec.caption_after) {
        (Some(figcaption), true) => {
            document.append(figure, inner)?;
            document.append(figure, figcaption)?;
        }
        (Some(figcaption), false) => {
            document.append(figure, figcaption)?;
            document.append(figure, inner)?;
        }
        (None, _) => document.append(figure, inner)?,
    }
    Ok(figure)
}

pub fn build_main(document: &mut Document, spec: &MainSpec) -> RetrofitResult<NodeId> {
    let main = document.create_element("main", vec![]);
    if let Some(banner) = spec.banner {
        document.detach(banner);
        document.append(main, banner)?;
    }
    document.move_children(spec.content_cell, main)?;
    if spec.footer {
        for node in document.parse_fragment(FOOTER_HTML) {
            document.append(main, node)?;
        }
    }
    for removed in &spec.remove {
        document.detach(*removed);
    }
    Ok(main)
}

pub fn build_popup_anchor(document: &mut Document, spec: &PopupSpec) -> RetrofitResult<NodeId> {
    let mut attrs = vec![Attr::new("href", spec.href.clone())];
    if let Some(title) = &spec.title {
        attrs.push(Attr::new("title", title.clone()));
    }
    attrs.extend(class_attr(&spec.classes));
    attrs.extend(spec.rest.iter().cloned());

    let anchor = document.create_element("a", attrs);
    document.move_children(spec.anchor, anchor)?;
    Ok(anchor)
}

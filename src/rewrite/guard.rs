//! 幂等性检查与共享资源注入
//!
//! 每个改写都留下可检测的完成标记；分类器在提出改写之前先检查这些标记，
//! 因此对同一文档重复运行不会产生新的改动。

use crate::config::EngineConfig;
use crate::error::{RetrofitError, RetrofitResult};
use crate::parsers::html::{has_script, has_stylesheet, Attr, Document};

use super::builders::FOOTER_HTML;

/// 多个改写共用、每份文档只注入一次的资源
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resource {
    Stylesheet(String),
    Script(String),
    /// 标准化页脚，追加到 `<main>`（若存在）否则 `<body>`
    Footer,
}

/// 文档是否已带有指向本站许可协议的 `rel=license` 链接
pub fn has_license_marker(document: &Document, config: &EngineConfig) -> bool {
    let hrefs = config.license_hrefs();
    document
        .find_by_attr("rel", |rel| rel.eq_ignore_ascii_case("license"))
        .any(|id| document.attr(id, "href").is_some_and(|h| hrefs.iter().any(|l| l == h)))
}

pub fn has_footer(document: &Document) -> bool {
    document.first_by_tag("footer").is_some()
}

pub fn has_main(document: &Document) -> bool {
    document.first_by_tag("main").is_some()
}

/// 资源是否已经存在
pub fn is_present(document: &Document, resource: &Resource) -> bool {
    match resource {
        Resource::Stylesheet(href) => has_stylesheet(document, href),
        Resource::Script(src) => has_script(document, src),
        Resource::Footer => has_footer(document),
    }
}

/// 注入缺失的资源；返回是否做了修改
pub fn inject(document: &mut Document, resource: &Resource) -> RetrofitResult<bool> {
    if is_present(document, resource) {
        return Ok(false);
    }

    match resource {
        Resource::Stylesheet(href) => {
            let head = document
                .first_by_tag("head")
                .ok_or_else(|| RetrofitError::precondition("document has no <head>"))?;
            let link = document.create_element(
                "link",
                vec![
                    Attr::new("href", href.clone()),
                    Attr::new("rel", "stylesheet"),
                    Attr::new("type", "text/css"),
                ],
            );
            document.append(head, link)?;
        }
        Resource::Script(src) => {
            let head = document
                .first_by_tag("head")
                .ok_or_else(|| RetrofitError::precondition("document has no <head>"))?;
            let script = document.create_element(
                "script",
                vec![
                    Attr::new("src", src.clone()),
                    Attr::new("type", "text/javascript"),
                ],
            );
            document.append(head, script)?;
        }
        Resource::Footer => {
            let container = document
                .first_by_tag("main")
                .or_else(|| document.first_by_tag("body"))
                .ok_or_else(|| RetrofitError::precondition("document has no <body>"))?;
            for node in document.parse_fragment(FOOTER_HTML) {
                document.append(container, node)?;
            }
        }
    }
    document.rebuild_index();
    Ok(true)
}

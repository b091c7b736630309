//! JavaScript 片段处理
//!
//! - `lexer`: 词法分析
//! - `ast`: 表达式树
//! - `parser`: 递归下降解析器
//!
//! 事件处理器属性的识别遵循 WHATWG HTML 规范中的事件处理器列表。

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Expr, Literal, Program, Stmt};
pub use parser::{parse_handler, parse_script};

/// DOM 事件处理器属性（全局、`<body>`/`<frameset>` 以及 `<html>` 特有）
const JS_DOM_EVENT_ATTRS: &[&str] = &[
    "onabort", "onauxclick", "onblur", "oncancel", "oncanplay", "oncanplaythrough", "onchange",
    "onclick", "onclose", "oncontextmenu", "oncuechange", "ondblclick", "ondrag", "ondragend",
    "ondragenter", "ondragexit", "ondragleave", "ondragover", "ondragstart", "ondrop",
    "ondurationchange", "onemptied", "onended", "onerror", "onfocus", "onformdata", "oninput",
    "oninvalid", "onkeydown", "onkeypress", "onkeyup", "onload", "onloadeddata",
    "onloadedmetadata", "onloadstart", "onmousedown", "onmouseenter", "onmouseleave",
    "onmousemove", "onmouseout", "onmouseover", "onmouseup", "onwheel", "onpause", "onplay",
    "onplaying", "onprogress", "onratechange", "onreset", "onresize", "onscroll",
    "onsecuritypolicyviolation", "onseeked", "onseeking", "onselect", "onslotchange", "onstalled",
    "onsubmit", "onsuspend", "ontimeupdate", "ontoggle", "onvolumechange", "onwaiting",
    "onwebkitanimationend", "onwebkitanimationiteration", "onwebkitanimationstart",
    "onwebkittransitionend", "onafterprint", "onbeforeprint", "onbeforeunload", "onhashchange",
    "onlanguagechange", "onmessage", "onmessageerror", "onoffline", "ononline", "onpagehide",
    "onpageshow", "onpopstate", "onrejectionhandled", "onstorage", "onunhandledrejection",
    "onunload", "oncut", "oncopy", "onpaste",
];

/// 检查属性名是否为事件处理器，不区分大小写
pub fn attr_is_event_handler(attr_name: &str) -> bool {
    JS_DOM_EVENT_ATTRS
        .iter()
        .any(|a| attr_name.eq_ignore_ascii_case(a))
}

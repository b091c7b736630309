//! # 解析器模块
//!
//! - `html` - HTML 文档解析、文档树操作、元数据查询、序列化
//! - `js` - JavaScript 片段解析与事件处理器属性识别

pub mod html;
pub mod js;

pub use html::{html_to_dom, serialize_document, Document, NodeId};
pub use js::{attr_is_event_handler, parse_handler, parse_script};

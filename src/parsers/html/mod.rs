//! HTML解析和处理模块
//!
//! - `dom`: 文档树模型（节点表、索引、替换/插入原语）
//! - `metadata`: 文档元数据与共享资源检测
//! - `serializer`: 序列化功能
//! - `utils`: 基础工具函数和常量

pub mod dom;
pub mod metadata;
pub mod serializer;
pub mod utils;

pub use dom::{html_to_dom, Attr, Document, Node, NodeId, NodeKind};
pub use metadata::{get_charset, has_noframes, has_script, has_stylesheet, is_autogenerated};
pub use serializer::serialize_document;
pub use utils::{collapse_whitespace, structural_container, WHITESPACES};

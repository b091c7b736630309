//! # Retrofit Library
//!
//! 识别旧式 HTML 写法（版权声明、弹窗脚本链接、排版表格、缺失的图片标题），
//! 对能够确定分类的实例改写为语义化结构，其余的写入复查日志。
//!
//! ## 模块组织
//!
//! - `core` - 单个文档的处理流程
//! - `parsers` - HTML 文档树与 JavaScript 片段解析
//! - `classifiers` - 各关注点的分类器
//! - `rewrite` - 改写计划、替换结构与幂等性检查
//! - `report` - 汇总计数与复查日志
//! - `batch` - 目录遍历与并行批处理
//! - `config` - 引擎配置
//! - `env` - 环境变量

pub mod batch;
pub mod classifiers;
pub mod config;
pub mod core;
pub mod env;
pub mod error;
pub mod parsers;
pub mod report;
pub mod rewrite;

// Re-export commonly used items for convenience
pub use crate::core::{DocumentProcessor, Outcome};
pub use config::EngineConfig;
pub use error::{ErrorKind, RetrofitError, RetrofitResult};

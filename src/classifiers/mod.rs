//! 旧式标记的分类器
//!
//! 每个关注点一个分类器，依次查询同一份文档：
//!
//! - `copyright`: 版权声明文本及其残留
//! - `script`: `javascript:` 链接和事件处理器属性
//! - `table`: 用作排版的表格
//! - `images`: 缺少 title/alt 的图片
//!
//! 分类器只读文档；确定无误的匹配被加入 [`Plan`](crate::rewrite::Plan)，其余结果写入报告。

pub mod copyright;
pub mod images;
pub mod script;
pub mod table;

use std::fmt;

use serde::Serialize;

pub use copyright::CopyrightClassifier;
pub use images::ImageClassifier;
pub use script::ScriptClassifier;
pub use table::TableClassifier;

/// 关注点
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Concern {
    Copyright,
    Scripts,
    Tables,
    Images,
}

impl Concern {
    pub const ALL: [Concern; 4] = [
        Concern::Copyright,
        Concern::Scripts,
        Concern::Tables,
        Concern::Images,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Concern::Copyright => "copyright",
            Concern::Scripts => "scripts",
            Concern::Tables => "tables",
            Concern::Images => "images",
        }
    }
}

impl fmt::Display for Concern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

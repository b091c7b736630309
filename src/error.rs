//! 统一错误处理
//!
//! 提供结构化错误类型和错误上下文（面包屑）机制。
//!
//! 错误在调用链中向上传播时，每一层都可以通过 [`Context::context`]
//! 附加一条 `(标签, 内容)` 记录，最终在顶层一次性渲染，例如：
//!
//! ```text
//! File name: site/gilbert/index.html
//! Element: <a href="javascript:openPopImg(">
//! JS code: openPopImg(
//! parse error: unexpected end of input at offset 11
//! ```

use std::fmt;

use thiserror::Error;

/// 错误种类
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// 文档或脚本片段无法解析；该文档被跳过且不做任何修改
    #[error("parse error: {0}")]
    Parse(String),

    /// 分类器无法确定匹配结果
    #[error("ambiguous match: {0}")]
    Ambiguous(String),

    /// 改写所依赖的前置条件不成立；仅放弃该条改写
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// 读写文件失败
    #[error("I/O error: {0}")]
    Io(String),

    /// 配置错误
    #[error("configuration error: {0}")]
    Config(String),
}

impl ErrorKind {
    /// 报告中使用的类别名称
    pub fn category(&self) -> &'static str {
        match self {
            ErrorKind::Parse(_) => "ParseFailure",
            ErrorKind::Ambiguous(_) => "AmbiguousMatch",
            ErrorKind::Precondition(_) => "PreconditionViolation",
            ErrorKind::Io(_) => "IoFailure",
            ErrorKind::Config(_) => "ConfigError",
        }
    }
}

/// 带上下文面包屑的错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrofitError {
    pub kind: ErrorKind,
    context: Vec<(String, String)>,
}

pub type RetrofitResult<T> = Result<T, RetrofitError>;

impl RetrofitError {
    pub fn new(kind: ErrorKind) -> Self {
        RetrofitError {
            kind,
            context: Vec::new(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse(msg.into()))
    }

    pub fn ambiguous(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Ambiguous(msg.into()))
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Precondition(msg.into()))
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config(msg.into()))
    }

    /// 附加一条上下文记录（由内向外依次追加）
    pub fn with_context(mut self, label: impl Into<String>, ctx: impl fmt::Display) -> Self {
        self.context.push((label.into(), ctx.to_string()));
        self
    }

    /// 按追加顺序返回全部上下文
    pub fn breadcrumbs(&self) -> &[(String, String)] {
        &self.context
    }

    /// 查找指定标签的上下文内容
    pub fn context_value(&self, label: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for RetrofitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 最外层的上下文最先输出
        for (label, ctx) in self.context.iter().rev() {
            writeln!(f, "{}: {}", label, ctx)?;
        }
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for RetrofitError {}

impl From<ErrorKind> for RetrofitError {
    fn from(kind: ErrorKind) -> Self {
        RetrofitError::new(kind)
    }
}

impl From<std::io::Error> for RetrofitError {
    fn from(err: std::io::Error) -> Self {
        RetrofitError::new(ErrorKind::Io(err.to_string()))
    }
}

impl From<toml::de::Error> for RetrofitError {
    fn from(err: toml::de::Error) -> Self {
        RetrofitError::config(err.to_string())
    }
}

impl From<regex::Error> for RetrofitError {
    fn from(err: regex::Error) -> Self {
        RetrofitError::config(err.to_string())
    }
}

/// 为 `Result` 附加上下文的扩展特性
pub trait Context<T> {
    fn context(self, label: &str, ctx: impl fmt::Display) -> RetrofitResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: Into<RetrofitError>,
{
    fn context(self, label: &str, ctx: impl fmt::Display) -> RetrofitResult<T> {
        self.map_err(|e| e.into().with_context(label, ctx))
    }
}

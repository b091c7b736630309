//! 分类结果汇总与复查日志
//!
//! - 每份文档产生一个 [`DocumentReport`]
//! - [`Aggregator`] 按类别计数，并按内容哈希对反复出现的异常去重
//! - [`ReviewLog`] 是只追加的 JSON Lines 日志，供人工复查

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::classifiers::Concern;
use crate::error::{Context, RetrofitError, RetrofitResult};

/// 分类结果的处理方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// 已加入改写计划
    Fixed,
    /// 需要人工复查，写入复查日志
    Review,
    /// 仅计数
    Noted,
}

/// 单个分类结果
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Finding {
    pub concern: Concern,
    pub category: String,
    pub disposition: Disposition,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub detail: Value,
    /// 用于去重的异常内容（例如无法识别的脚本）
    #[serde(skip)]
    pub anomaly: Option<String>,
}

impl Finding {
    fn new(concern: Concern, category: impl Into<String>, disposition: Disposition, detail: Value) -> Self {
        Finding {
            concern,
            category: category.into(),
            disposition,
            detail,
            anomaly: None,
        }
    }

    pub fn fixed(concern: Concern, category: impl Into<String>, detail: Value) -> Self {
        Self::new(concern, category, Disposition::Fixed, detail)
    }

    pub fn review(concern: Concern, category: impl Into<String>, detail: Value) -> Self {
        Self::new(concern, category, Disposition::Review, detail)
    }

    pub fn noted(concern: Concern, category: impl Into<String>) -> Self {
        Self::new(concern, category, Disposition::Noted, Value::Null)
    }

    /// 标记为可去重的异常；相同内容在整个批次中只记录一次
    pub fn with_anomaly(mut self, content: impl Into<String>) -> Self {
        self.anomaly = Some(content.into());
        self
    }

    /// 改写前置条件不成立
    pub fn rejected(concern: Concern, category: &str, err: &RetrofitError) -> Self {
        Self::review(
            concern,
            format!("{} (blocked)", category),
            json!({ "reason": err.kind.to_string() }),
        )
    }

    pub fn key(&self) -> String {
        format!("{}/{}", self.concern, self.category)
    }
}

/// 一份文档的处理结果
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentReport {
    pub file: String,
    pub findings: Vec<Finding>,
    /// 已提交的改动数（操作数加注入的资源数）
    pub changes: usize,
    pub persisted: bool,
    /// 页面由工具生成（含 "autogenerated" 注释）
    pub generated: bool,
    pub error: Option<RetrofitError>,
}

impl DocumentReport {
    pub fn new(file: impl Into<String>) -> Self {
        DocumentReport {
            file: file.into(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn categories(&self, concern: Concern) -> Vec<&str> {
        self.findings
            .iter()
            .filter(|f| f.concern == concern)
            .map(|f| f.category.as_str())
            .collect()
    }
}

/// 复查日志中的一条记录
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewEntry {
    pub timestamp: String,
    pub file: String,
    pub category: String,
    pub payload: Value,
}

impl ReviewEntry {
    pub fn new(file: impl Into<String>, category: impl Into<String>, payload: Value) -> Self {
        ReviewEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            file: file.into(),
            category: category.into(),
            payload,
        }
    }
}

/// 去重后的异常
#[derive(Clone, Debug, PartialEq)]
pub struct Anomaly {
    pub category: String,
    pub sample: String,
    pub first_file: String,
    pub occurrences: u64,
}

/// 批次级汇总
#[derive(Debug, Default)]
pub struct Aggregator {
    counts: BTreeMap<String, u64>,
    anomalies: BTreeMap<String, Anomaly>,
    documents: u64,
    changed: u64,
    failed: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一份文档，返回需要立即写入复查日志的条目
    pub fn record(&mut self, report: &DocumentReport) -> Vec<ReviewEntry> {
        let mut entries = Vec::new();
        self.documents += 1;
        if report.persisted {
            self.changed += 1;
        }

        if let Some(err) = &report.error {
            self.failed += 1;
            let category = format!("error/{}", err.kind.category());
            *self.counts.entry(category.clone()).or_default() += 1;
            entries.push(ReviewEntry::new(
                &report.file,
                category,
                json!({ "error": err.to_string() }),
            ));
            return entries;
        }

        for finding in &report.findings {
            *self.counts.entry(finding.key()).or_default() += 1;

            if let Some(content) = &finding.anomaly {
                let hash = blake3::hash(format!("{}\0{}", finding.key(), content).as_bytes())
                    .to_hex()
                    .to_string();
                self.anomalies
                    .entry(hash)
                    .and_modify(|a| a.occurrences += 1)
                    .or_insert_with(|| Anomaly {
                        category: finding.key(),
                        sample: content.clone(),
                        first_file: report.file.clone(),
                        occurrences: 1,
                    });
                continue;
            }

            if finding.disposition == Disposition::Review {
                let mut payload = finding.detail.clone();
                if report.generated {
                    if let Value::Object(map) = &mut payload {
                        map.insert("generated".to_string(), Value::Bool(true));
                    }
                }
                entries.push(ReviewEntry::new(&report.file, finding.key(), payload));
            }
        }
        entries
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or_default()
    }

    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    pub fn anomalies(&self) -> impl Iterator<Item = &Anomaly> {
        self.anomalies.values()
    }

    pub fn documents(&self) -> u64 {
        self.documents
    }

    pub fn changed(&self) -> u64 {
        self.changed
    }

    /// 每个不同的异常一条记录，附出现次数
    pub fn anomaly_entries(&self) -> Vec<ReviewEntry> {
        self.anomalies
            .values()
            .map(|a| {
                ReviewEntry::new(
                    &a.first_file,
                    &a.category,
                    json!({ "sample": a.sample, "occurrences": a.occurrences }),
                )
            })
            .collect()
    }
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} documents, {} changed, {} failed",
            self.documents, self.changed, self.failed
        )?;
        for (category, count) in &self.counts {
            writeln!(f, "  {:<48} {}", category, count)?;
        }
        if !self.anomalies.is_empty() {
            write!(f, "  {} distinct anomalies", self.anomalies.len())?;
        }
        Ok(())
    }
}

/// 只追加的复查日志
pub struct ReviewLog<W: Write> {
    writer: W,
}

impl ReviewLog<BufWriter<File>> {
    pub fn open(path: &Path) -> RetrofitResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context("Review log", path.display())?;
        Ok(ReviewLog::new(BufWriter::new(file)))
    }
}

impl<W: Write> ReviewLog<W> {
    pub fn new(writer: W) -> Self {
        ReviewLog { writer }
    }

    pub fn append(&mut self, entry: &ReviewEntry) -> RetrofitResult<()> {
        let line = serde_json::to_string(entry)
            .map_err(|e| RetrofitError::new(crate::error::ErrorKind::Io(e.to_string())))?;
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    pub fn flush(&mut self) -> RetrofitResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

//! 单个文档的处理流程
//!
//! 1. 按 `<meta charset>` 嗅探编码并解析
//! 2. 各关注点的分类器依次查询同一份文档，累积改写计划
//! 3. 提交计划；只有实际发生改动时才序列化

use encoding_rs::Encoding;
use tracing::{debug, info, warn};

use crate::classifiers::{Concern, CopyrightClassifier, ImageClassifier, ScriptClassifier, TableClassifier};
use crate::config::EngineConfig;
use crate::error::{Context, RetrofitResult};
use crate::parsers::html::{get_charset, is_autogenerated, serialize_document, Document};
use crate::report::DocumentReport;
use crate::rewrite::Plan;

const DEFAULT_ENCODING: &str = "utf-8";

/// 处理一份文档的结果
#[derive(Debug)]
pub struct Outcome {
    pub report: DocumentReport,
    /// 改写后的字节；文档未改动时为 `None`
    pub output: Option<Vec<u8>>,
}

/// 编码处理器
pub struct EncodingProcessor;

impl EncodingProcessor {
    pub fn new() -> Self {
        Self
    }

    /// 先按 UTF-8 解析，文档声明了有效字符集时按该字符集重新解析
    pub fn process_encoding(&self, input_data: &[u8]) -> RetrofitResult<(Document, String)> {
        let mut document_encoding = DEFAULT_ENCODING.to_string();
        let mut document = Document::parse(input_data, &document_encoding)?;

        if let Some(html_charset) = get_charset(&document) {
            if let Some(charset) = Encoding::for_label_no_replacement(html_charset.as_bytes()) {
                if charset != encoding_rs::UTF_8 {
                    document_encoding = charset.name().to_string();
                    document = Document::parse(input_data, &document_encoding)?;
                }
            }
        }

        Ok((document, document_encoding))
    }
}

impl Default for EncodingProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// 文档处理器，按固定顺序运行启用的分类器
pub struct DocumentProcessor {
    concerns: Vec<Concern>,
    copyright: CopyrightClassifier,
    scripts: ScriptClassifier,
    tables: TableClassifier,
    images: ImageClassifier,
}

impl DocumentProcessor {
    /// `concerns` 为空时启用全部关注点
    pub fn new(config: &EngineConfig, concerns: &[Concern]) -> RetrofitResult<Self> {
        let concerns = if concerns.is_empty() {
            Concern::ALL.to_vec()
        } else {
            Concern::ALL
                .into_iter()
                .filter(|c| concerns.contains(c))
                .collect()
        };

        Ok(DocumentProcessor {
            concerns,
            copyright: CopyrightClassifier::new(config)?,
            scripts: ScriptClassifier::new(config),
            tables: TableClassifier::new(config),
            images: ImageClassifier::new(config),
        })
    }

    pub fn concerns(&self) -> &[Concern] {
        &self.concerns
    }

    /// 处理一份文档；失败只影响这份文档，错误记录在报告中
    pub fn process_document(&self, file: &str, input_data: &[u8]) -> Outcome {
        let mut report = DocumentReport::new(file);
        match self.rewrite(input_data, &mut report).context("File name", file) {
            Ok(output) => Outcome { report, output },
            Err(err) => {
                warn!(file, kind = err.kind.category(), "document skipped");
                debug!("{}", err);
                // 失败的文档不保留部分分类结果
                report.findings.clear();
                report.changes = 0;
                report.error = Some(err);
                Outcome { report, output: None }
            }
        }
    }

    fn rewrite(&self, input_data: &[u8], report: &mut DocumentReport) -> RetrofitResult<Option<Vec<u8>>> {
        // 1. 编码与解析
        let encoding_processor = EncodingProcessor::new();
        let (mut document, document_encoding) = encoding_processor.process_encoding(input_data)?;
        report.generated = is_autogenerated(&document);

        // 2. 分类
        let mut plan = Plan::new();
        for concern in &self.concerns {
            match concern {
                Concern::Copyright => self.copyright.run(&document, &mut plan, report)?,
                Concern::Scripts => self.scripts.run(&document, &mut plan, report)?,
                Concern::Tables => self.tables.run(&document, &mut plan, report)?,
                Concern::Images => self.images.run(&document, &mut plan, report)?,
            }
        }

        // 3. 提交
        let summary = plan.commit(&mut document)?;
        if !summary.changed() {
            return Ok(None);
        }
        report.changes = summary.applied + summary.injected.len();
        info!(
            file = report.file.as_str(),
            applied = summary.applied,
            injected = summary.injected.len(),
            "document rewritten"
        );

        serialize_document(&document, &document_encoding).map(Some)
    }
}

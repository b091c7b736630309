// 集成测试公共模块
//
// 提供测试辅助工具和共享功能

#![allow(dead_code)]

use retrofit::classifiers::Concern;
use retrofit::report::DocumentReport;
use retrofit::{DocumentProcessor, EngineConfig};

pub fn processor() -> DocumentProcessor {
    DocumentProcessor::new(&EngineConfig::default(), &[]).unwrap()
}

pub fn processor_for(concerns: &[Concern]) -> DocumentProcessor {
    DocumentProcessor::new(&EngineConfig::default(), concerns).unwrap()
}

/// 包装成完整页面
pub fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Test</title></head><body>{}</body></html>",
        body
    )
}

/// 处理一次；返回处理后的文本（未改动时为原文）、报告和是否改动
pub fn run(processor: &DocumentProcessor, html: &str) -> (String, DocumentReport, bool) {
    let outcome = processor.process_document("fixture.html", html.as_bytes());
    match outcome.output {
        Some(bytes) => (String::from_utf8(bytes).unwrap(), outcome.report, true),
        None => (html.to_string(), outcome.report, false),
    }
}

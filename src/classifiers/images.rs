//! 图片标题补全
//!
//! `src` 在配置表中的 `<img>` 缺少 `title`/`alt` 时补上；已有的值不覆盖。

use std::collections::BTreeMap;

use serde_json::json;

use crate::config::EngineConfig;
use crate::error::RetrofitResult;
use crate::parsers::html::Document;
use crate::report::{DocumentReport, Finding};
use crate::rewrite::{Plan, RewriteOp};

use super::Concern;

pub struct ImageClassifier {
    titles: BTreeMap<String, String>,
}

impl ImageClassifier {
    pub fn new(config: &EngineConfig) -> Self {
        ImageClassifier {
            titles: config.images.titles.clone(),
        }
    }

    pub fn title_for(&self, src: &str) -> Option<&str> {
        self.titles.get(src).map(String::as_str)
    }

    pub fn run(&self, document: &Document, plan: &mut Plan, report: &mut DocumentReport) -> RetrofitResult<()> {
        for &img in document.elements_by_tag("img") {
            let Some(src) = document.attr(img, "src") else {
                continue;
            };
            let Some(title) = self.title_for(src) else {
                report.push(
                    Finding::review(Concern::Images, "Unknown", json!({ "src": src })).with_anomaly(src),
                );
                continue;
            };
            if title.is_empty() {
                report.push(Finding::noted(Concern::Images, "Untitled"));
                continue;
            }

            let attrs: Vec<(String, Option<String>)> = ["title", "alt"]
                .into_iter()
                .filter(|name| document.attr(img, name).map_or(true, |v| v.trim().is_empty()))
                .map(|name| (name.to_string(), Some(title.to_string())))
                .collect();
            if attrs.is_empty() {
                report.push(Finding::noted(Concern::Images, "Titled"));
                continue;
            }

            match plan.push(document, RewriteOp::SetAttrs { target: img, attrs }) {
                Ok(()) => report.push(Finding::fixed(Concern::Images, "Titled", json!({ "src": src }))),
                Err(err) => report.push(Finding::rejected(Concern::Images, "Titled", &err)),
            }
        }
        Ok(())
    }
}

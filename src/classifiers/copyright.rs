//! 版权声明分类
//!
//! 在文本节点中查找 `Copyright … <所有者> [All Rights Reserved]` 形式的声明，
//! 把声明从所在元素的文本中去掉后，按残留内容决定能否自动修复：
//!
//! | 残留 | 结果 |
//! |------|------|
//! | 日期 | 规范化为 `Page modified D Mon YYYY` |
//! | 固定标签（如 `MIDI files`） | 删除声明 |
//! | 空白 | 删除声明 |
//! | 其他 | 不修改，写入复查日志 |

use std::ops::Range;

use regex::Regex;
use serde_json::json;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{Context, RetrofitResult};
use crate::parsers::html::{collapse_whitespace, has_noframes, structural_container, Document, NodeId, NodeKind};
use crate::report::{DocumentReport, Finding};
use crate::rewrite::guard::has_license_marker;
use crate::rewrite::{Plan, Resource, RewriteOp};

use super::Concern;

const DATE_PATTERN: &str = r"(?ix)^
    \s*(?:Date\s*)?(?:Page\s*)?(?:modified|cr[ea]{2}ted|u[p]?dated)?
    \s*(?P<day>[0-9]{1,2})
    \s*(?P<mon>[A-Z][a-z]+)\.?\s*,?
    \s*(?P<year>[0-9]{0,4})
    \s*\.?,?\s*
    (?:All\s*Rights\s*Reserved\s*)?
$";

/// 声明去掉后的残留文本分类
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Residue {
    /// 规范化后的日期行
    Date(String),
    Label(String),
    Blank,
    Unknown(String),
}

impl Residue {
    pub fn is_fixable(&self) -> bool {
        !matches!(self, Residue::Unknown(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Residue::Date(_) => "Date",
            Residue::Label(_) => "Label",
            Residue::Blank => "Blank",
            Residue::Unknown(_) => "Unknown",
        }
    }
}

/// 整份文档的版权状态
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CopyrightStatus {
    /// 框架页，不处理
    Skip,
    /// 已带有 CC-BY-SA 许可链接
    CcBySa,
    /// 其他许可链接
    UnknownLicense(Vec<String>),
    Corrected(Residue),
    AllRightsReserved { residue: String, structural: bool },
    ThirdParty(String),
    /// 出现了类似版权的字样但无法识别
    Unknown(Vec<String>),
    /// 没有任何版权声明，追加标准页脚
    Added,
}

impl CopyrightStatus {
    pub fn category(&self) -> &'static str {
        match self {
            CopyrightStatus::Skip => "Skip",
            CopyrightStatus::CcBySa => "CcBySa",
            CopyrightStatus::UnknownLicense(_) | CopyrightStatus::Unknown(_) => "Unknown",
            CopyrightStatus::Corrected(_) => "Corrected",
            CopyrightStatus::AllRightsReserved { .. } => "AllRightsReserved",
            CopyrightStatus::ThirdParty(_) => "ThirdParty",
            CopyrightStatus::Added => "Added",
        }
    }
}

pub struct CopyrightClassifier {
    phrase: Regex,
    date: Regex,
    labels: Vec<(String, Regex)>,
    third_party: Vec<(String, String)>,
    config: EngineConfig,
}

impl CopyrightClassifier {
    pub fn new(config: &EngineConfig) -> RetrofitResult<Self> {
        let owners = config
            .copyright
            .owners
            .iter()
            .map(|o| format!("(?:{})", o))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(
            r"(?is)(?:c?opyright|©).*?(?:{})(?:[\s.,]*All\s*R[io]ghts\s*Reserved)?\.?",
            owners
        );
        let phrase = Regex::new(&pattern).context("Owner patterns", &owners)?;
        let date = Regex::new(DATE_PATTERN)?;

        let mut labels = Vec::new();
        for label in &config.copyright.labels {
            let body = label
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s*");
            labels.push((label.clone(), Regex::new(&format!(r"(?i)^\s*{}\s*$", body))?));
        }

        Ok(CopyrightClassifier {
            phrase,
            date,
            labels,
            third_party: config
                .copyright
                .third_party
                .iter()
                .map(|(mail, name)| (format!("mailto:{}", mail), name.clone()))
                .collect(),
            config: config.clone(),
        })
    }

    /// 声明在文本中的位置
    pub fn find_phrase(&self, text: &str) -> Option<Range<usize>> {
        self.phrase.find(text).map(|m| m.range())
    }

    pub fn classify_residue(&self, text: &str) -> Residue {
        if let Some(caps) = self.date.captures(text) {
            let day = &caps["day"];
            let mon = &caps["mon"];
            let canonical = match caps.name("year").map(|y| y.as_str()) {
                Some(year) if !year.is_empty() => format!("Page modified {} {} {}", day, mon, year),
                _ => format!("Page modified {} {}", day, mon),
            };
            return Residue::Date(canonical);
        }
        if let Some((label, _)) = self.labels.iter().find(|(_, re)| re.is_match(text)) {
            return Residue::Label(label.clone());
        }
        if text.trim().is_empty() {
            return Residue::Blank;
        }
        Residue::Unknown(text.to_string())
    }

    fn is_look_alike(text: &str) -> bool {
        let lower = text.to_lowercase();
        lower.contains("copyright") || lower.contains('©') || lower.contains("&copy")
    }

    /// 文档中可能含有声明的文本节点（不含脚本和样式）
    fn text_nodes(document: &Document) -> Vec<NodeId> {
        document
            .descendants(document.root())
            .into_iter()
            .filter(|id| matches!(document.kind(*id), NodeKind::Text(_)))
            .filter(|id| {
                !document
                    .parent(*id)
                    .is_some_and(|p| document.is_tag(p, "script") || document.is_tag(p, "style"))
            })
            .collect()
    }

    /// 分类整份文档；可自动修复时同时返回对应的改写操作
    pub fn classify(&self, document: &Document) -> (CopyrightStatus, Option<RewriteOp>) {
        if has_noframes(document) {
            return (CopyrightStatus::Skip, None);
        }
        if has_license_marker(document, &self.config) {
            return (CopyrightStatus::CcBySa, None);
        }
        let other_licenses: Vec<String> = document
            .find_by_attr("rel", |rel| rel.eq_ignore_ascii_case("license"))
            .filter_map(|id| document.attr(id, "href").map(str::to_string))
            .collect();
        if !other_licenses.is_empty() {
            return (CopyrightStatus::UnknownLicense(other_licenses), None);
        }

        let mut look_alikes = Vec::new();
        for node in Self::text_nodes(document) {
            let Some(text) = document.text(node) else {
                continue;
            };

            if let Some(range) = self.find_phrase(text) {
                let remainder = format!("{}{}", &text[..range.start], &text[range.end..]);
                let Some(parent) = document.parent(node) else {
                    continue;
                };
                let residue_text = document.text_content_with(parent, Some((node, remainder.as_str())));
                let residue = self.classify_residue(&residue_text);
                debug!(residue = residue.label(), "copyright notice found");

                return match residue {
                    Residue::Date(ref canonical) => {
                        let op = RewriteOp::ReplaceChildren {
                            parent,
                            text: canonical.clone(),
                        };
                        (CopyrightStatus::Corrected(residue), Some(op))
                    }
                    Residue::Label(_) | Residue::Blank => {
                        let op = RewriteOp::ReplaceText {
                            target: node,
                            text: remainder,
                        };
                        (CopyrightStatus::Corrected(residue), Some(op))
                    }
                    Residue::Unknown(text) => (
                        CopyrightStatus::AllRightsReserved {
                            residue: text,
                            structural: false,
                        },
                        None,
                    ),
                };
            }

            if Self::is_look_alike(text) {
                let container = structural_container(document, node).unwrap_or(document.root());
                let third_party = document
                    .descendants(container)
                    .into_iter()
                    .filter(|id| document.is_tag(*id, "a"))
                    .find_map(|a| {
                        let href = document.attr(a, "href")?;
                        self.third_party
                            .iter()
                            .find(|(mailto, _)| href.eq_ignore_ascii_case(mailto))
                            .map(|(_, name)| name.clone())
                    });
                if let Some(name) = third_party {
                    return (CopyrightStatus::ThirdParty(name), None);
                }

                // 声明被行内标签拆开：能识别，但不尝试修复
                let container_text = document.text_content(container);
                if self.find_phrase(&container_text).is_some() {
                    return (
                        CopyrightStatus::AllRightsReserved {
                            residue: collapse_whitespace(&container_text),
                            structural: true,
                        },
                        None,
                    );
                }
                look_alikes.push(collapse_whitespace(text));
            }
        }

        if !look_alikes.is_empty() {
            return (CopyrightStatus::Unknown(look_alikes), None);
        }
        (CopyrightStatus::Added, None)
    }

    pub fn run(&self, document: &Document, plan: &mut Plan, report: &mut DocumentReport) -> RetrofitResult<()> {
        let (status, op) = self.classify(document);
        let category = status.category();

        let finding = match &status {
            CopyrightStatus::Skip | CopyrightStatus::CcBySa => Finding::noted(Concern::Copyright, category),
            CopyrightStatus::ThirdParty(name) => {
                Finding::noted(Concern::Copyright, format!("{}: {}", category, name))
            }
            CopyrightStatus::UnknownLicense(links) => {
                Finding::review(Concern::Copyright, category, json!({ "links": links }))
            }
            CopyrightStatus::Unknown(texts) => {
                Finding::review(Concern::Copyright, category, json!({ "text": texts }))
            }
            CopyrightStatus::AllRightsReserved { residue, structural } => {
                let mut detail = json!({ "residue": residue });
                if *structural {
                    detail["fix"] = json!("structural");
                }
                Finding::review(Concern::Copyright, category, detail)
            }
            CopyrightStatus::Corrected(residue) => {
                if let Some(op) = op {
                    if let Err(err) = plan.push(document, op) {
                        report.push(Finding::rejected(Concern::Copyright, category, &err));
                        return Ok(());
                    }
                }
                self.require_standard_resources(plan);
                Finding::fixed(Concern::Copyright, category, json!({ "residue": residue.label() }))
            }
            CopyrightStatus::Added => {
                self.require_standard_resources(plan);
                Finding::fixed(Concern::Copyright, category, serde_json::Value::Null)
            }
        };
        report.push(finding);
        Ok(())
    }

    fn require_standard_resources(&self, plan: &mut Plan) {
        plan.require(Resource::Footer);
        plan.require(Resource::Stylesheet(self.config.resources.stylesheet.clone()));
    }
}

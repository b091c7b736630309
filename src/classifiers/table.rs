//! 排版表格分类
//!
//! 每张表格先计算签名（每行单元格数）。行只归属于最近的外层表格，
//! 嵌套表格的行不会计入外层表格。签名与 caption 标志按以下顺序匹配，先匹配者胜出：
//!
//! 1. 单行单格且带 caption：改写为 `<figure>`
//! 2. 单行单格无 caption：按内容细分为报头、单张图片或无法识别，只报告
//! 3. 与配置的框架布局相符：整组表格改写为 `<main>`
//! 4. 其他：只报告

use std::collections::HashSet;

use serde_json::json;
use tracing::debug;

use crate::config::{EngineConfig, LayoutConfig, TableConfig, CODE_OTHER};
use crate::error::{RetrofitError, RetrofitResult};
use crate::parsers::html::{Document, NodeId};
use crate::report::{DocumentReport, Finding};
use crate::rewrite::guard::{has_footer, has_main};
use crate::rewrite::{FigureSpec, MainSpec, Plan, Replacement, RewriteOp};

use super::Concern;

/// 表格的结构信息
#[derive(Clone, Debug, PartialEq)]
pub struct TableShape {
    pub table: NodeId,
    /// 属于本表格的行
    pub rows: Vec<NodeId>,
    pub signature: Vec<usize>,
    /// 属于本表格（而非嵌套表格）的 caption
    pub caption: Option<NodeId>,
    /// 最近的外层表格
    pub nested_in: Option<NodeId>,
}

impl TableShape {
    pub fn of(document: &Document, table: NodeId) -> Self {
        let owned = |id: NodeId| document.nearest_ancestor(id, "table") == Some(table);
        let rows: Vec<NodeId> = document
            .descendants(table)
            .into_iter()
            .filter(|id| document.is_tag(*id, "tr") && owned(*id))
            .collect();
        let signature = rows.iter().map(|row| cells(document, *row).len()).collect();
        let caption = document
            .elements_by_tag("caption")
            .iter()
            .copied()
            .find(|c| owned(*c));

        TableShape {
            table,
            rows,
            signature,
            caption,
            nested_in: document.nearest_ancestor(table, "table"),
        }
    }

    fn single_cell(&self, document: &Document) -> Option<NodeId> {
        if self.signature != [1] {
            return None;
        }
        cells(document, self.rows[0]).first().copied()
    }
}

/// 行中直接的 td/th 单元格
fn cells(document: &Document, row: NodeId) -> Vec<NodeId> {
    document
        .element_children(row)
        .filter(|c| document.is_tag(*c, "td") || document.is_tag(*c, "th"))
        .collect()
}

fn basename(src: &str) -> String {
    src.rsplit('/').next().unwrap_or(src).to_ascii_lowercase()
}

/// 单格无 caption 表格的细分
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxedKind {
    Masthead,
    BareImage,
    Unrecognized,
}

impl BoxedKind {
    pub fn label(&self) -> &'static str {
        match self {
            BoxedKind::Masthead => "Masthead",
            BoxedKind::BareImage => "BareImage",
            BoxedKind::Unrecognized => "Unrecognized",
        }
    }
}

/// 与布局相符的框架表格
#[derive(Clone, Debug, PartialEq)]
pub struct Scaffold {
    pub layout: String,
    pub content_cell: NodeId,
    /// 布局之后多出的行数
    pub extra_rows: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TableClass {
    Figure(FigureSpec),
    Boxed(BoxedKind),
    Scaffold(Scaffold),
    Other,
}

impl TableClass {
    pub fn category(&self) -> &'static str {
        match self {
            TableClass::Figure(_) => "Figure",
            TableClass::Boxed(kind) => kind.label(),
            TableClass::Scaffold(_) => "Scaffold",
            TableClass::Other => "Other",
        }
    }
}

/// 把内联样式拆成开头的 border 声明和其余部分
fn split_style(style: &str) -> (Option<String>, Option<String>) {
    let decls: Vec<&str> = style.split(';').map(str::trim).filter(|d| !d.is_empty()).collect();
    let leading_border = decls.first().is_some_and(|d| {
        d.split(':')
            .next()
            .is_some_and(|p| p.trim().to_ascii_lowercase().starts_with("border"))
    });
    let (border, rest) = if leading_border {
        (Some(decls[0].to_string()), &decls[1..])
    } else {
        (None, &decls[..])
    };
    let rest = if rest.is_empty() { None } else { Some(rest.join("; ")) };
    (border, rest)
}

pub struct TableClassifier {
    config: TableConfig,
}

impl TableClassifier {
    pub fn new(config: &EngineConfig) -> Self {
        TableClassifier {
            config: config.tables.clone(),
        }
    }

    /// 根据背景图片或背景色得到单元格代码
    pub fn cell_code(&self, document: &Document, cell: NodeId) -> char {
        let image = document.attr(cell, "background").map(basename);
        let color = document.attr(cell, "bgcolor").map(|c| c.trim().to_ascii_lowercase());
        self.config
            .cell_codes
            .iter()
            .find(|cc| {
                image
                    .as_ref()
                    .is_some_and(|i| cc.images.iter().any(|m| m.eq_ignore_ascii_case(i)))
                    || color
                        .as_ref()
                        .is_some_and(|c| cc.colors.iter().any(|m| m.eq_ignore_ascii_case(c)))
            })
            .map(|cc| cc.code)
            .unwrap_or(CODE_OTHER)
    }

    fn match_layout(&self, document: &Document, shape: &TableShape) -> Option<Scaffold> {
        self.config.layouts.iter().find_map(|layout: &LayoutConfig| {
            let expected = layout.signature();
            if !shape.signature.starts_with(&expected) {
                return None;
            }
            let mut content_cell = None;
            for (row, codes) in shape.rows.iter().zip(&layout.rows) {
                let row_cells = cells(document, *row);
                let actual: String = row_cells.iter().map(|c| self.cell_code(document, *c)).collect();
                if actual != *codes {
                    return None;
                }
                if let Some(pos) = codes.chars().position(|c| c == CODE_OTHER) {
                    content_cell = Some(row_cells[pos]);
                }
            }
            Some(Scaffold {
                layout: layout.name.clone(),
                content_cell: content_cell?,
                extra_rows: shape.signature.len() - expected.len(),
            })
        })
    }

    fn boxed_kind(&self, document: &Document, cell: NodeId) -> BoxedKind {
        let masthead = &self.config.masthead;
        let children: Vec<NodeId> = document.element_children(cell).collect();
        let text = document.text_content(cell);

        if let [only] = children.as_slice() {
            if document.is_tag(*only, "img") {
                let src = document.attr(*only, "src").map(basename).unwrap_or_default();
                if masthead.images.iter().any(|m| m.eq_ignore_ascii_case(&src)) {
                    return BoxedKind::Masthead;
                }
                if text.trim().is_empty() {
                    return BoxedKind::BareImage;
                }
            }
        }
        if masthead.texts.iter().any(|t| text.contains(t.as_str())) {
            return BoxedKind::Masthead;
        }
        BoxedKind::Unrecognized
    }

    fn figure(&self, document: &Document, shape: &TableShape, cell: NodeId, caption: NodeId) -> FigureSpec {
        let table = shape.table;
        let mut figure_classes = Vec::new();
        if let Some(align) = document.attr(table, "align") {
            let align = align.trim().to_ascii_lowercase();
            if matches!(align.as_str(), "left" | "right" | "center") {
                figure_classes.push(format!("align-{}", align));
            }
        }
        let padding = document
            .attr(table, "cellpadding")
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(0);
        if padding >= self.config.padding_threshold {
            figure_classes.push("padded".to_string());
        }

        let (mut inner_style, figure_style) = document
            .attr(table, "style")
            .map(split_style)
            .unwrap_or((None, None));

        let inner_classes: Vec<String> = document
            .classes(table)
            .into_iter()
            .chain(document.classes(cell))
            .map(str::to_string)
            .collect();

        let border = document
            .attr(table, "border")
            .map(|b| b.trim().parse::<u32>().unwrap_or(1))
            .unwrap_or(0);
        if border > 0 && inner_classes.is_empty() && inner_style.is_none() {
            inner_style = Some(format!("border: {}px solid", border));
        }

        FigureSpec {
            content_cell: cell,
            caption: Some(caption),
            caption_after: document
                .attr(caption, "align")
                .is_some_and(|a| a.trim().eq_ignore_ascii_case("bottom")),
            figure_classes,
            figure_style,
            inner_classes,
            inner_style,
            caption_classes: document.classes(caption).into_iter().map(str::to_string).collect(),
        }
    }

    /// 依次尝试各条规则
    pub fn classify(&self, document: &Document, shape: &TableShape) -> TableClass {
        if let Some(cell) = shape.single_cell(document) {
            return match shape.caption {
                Some(caption) => TableClass::Figure(self.figure(document, shape, cell, caption)),
                None => TableClass::Boxed(self.boxed_kind(document, cell)),
            };
        }
        match self.match_layout(document, shape) {
            Some(scaffold) => TableClass::Scaffold(scaffold),
            None => TableClass::Other,
        }
    }

    /// 框架表格所在的相邻表格组
    fn group(document: &Document, table: NodeId) -> (Vec<NodeId>, usize) {
        let mut before = Vec::new();
        let mut current = table;
        while let Some(prev) = document.element_sibling(current, false) {
            if !document.is_tag(prev, "table") {
                break;
            }
            before.push(prev);
            current = prev;
        }
        before.reverse();
        let position = before.len();

        let mut group = before;
        group.push(table);
        current = table;
        while let Some(next) = document.element_sibling(current, true) {
            if !document.is_tag(next, "table") {
                break;
            }
            group.push(next);
            current = next;
        }
        (group, position)
    }

    /// 框架表格的 `<main>` 改写，或阻止改写的原因
    fn scaffold_rewrite(
        &self,
        document: &Document,
        table: NodeId,
        scaffold: &Scaffold,
    ) -> Result<MainSpec, (String, serde_json::Value)> {
        if scaffold.extra_rows > 0 {
            return Err((
                "extra trailing row".to_string(),
                json!({ "layout": scaffold.layout, "extra_rows": scaffold.extra_rows }),
            ));
        }

        let (group, position) = Self::group(document, table);
        match (group.len(), position) {
            (1, _) => Ok(MainSpec {
                content_cell: scaffold.content_cell,
                banner: None,
                remove: vec![],
                footer: false,
            }),
            (3, 1) => {
                let widths: Vec<Option<&str>> = group.iter().map(|t| document.attr(*t, "width")).collect();
                let expected = &self.config.group_widths;
                let matches = widths
                    .iter()
                    .zip(expected)
                    .all(|(w, e)| w.is_some_and(|w| w.trim().eq_ignore_ascii_case(e)));
                if !matches {
                    return Err((
                        "unexpected widths".to_string(),
                        json!({ "widths": widths, "expected": expected }),
                    ));
                }
                Ok(MainSpec {
                    content_cell: scaffold.content_cell,
                    banner: Some(group[0]),
                    remove: vec![group[2]],
                    footer: !has_footer(document),
                })
            }
            (count, position) => Err((
                "wrong node-count".to_string(),
                json!({ "tables": count, "position": position }),
            )),
        }
    }

    fn detail(document: &Document, shape: &TableShape) -> serde_json::Value {
        let mut detail = json!({ "signature": shape.signature });
        if let Some(outer) = shape.nested_in {
            detail["nested_in"] = json!(TableShape::of(document, outer).signature);
        }
        detail
    }

    pub fn run(&self, document: &Document, plan: &mut Plan, report: &mut DocumentReport) -> RetrofitResult<()> {
        let classified: Vec<(TableShape, TableClass)> = document
            .elements_by_tag("table")
            .iter()
            .map(|t| {
                let shape = TableShape::of(document, *t);
                let class = self.classify(document, &shape);
                (shape, class)
            })
            .collect();

        // 先处理框架表格，组内的横幅和页脚表格由它认领
        let mut claimed: HashSet<NodeId> = HashSet::new();
        let already_main = has_main(document);
        for (shape, class) in &classified {
            let TableClass::Scaffold(scaffold) = class else {
                continue;
            };
            if already_main {
                report.push(Finding::noted(Concern::Tables, "Scaffold (main present)"));
                continue;
            }
            match self.scaffold_rewrite(document, shape.table, scaffold) {
                Ok(spec) => {
                    let members: Vec<NodeId> = spec.banner.into_iter().chain(spec.remove.iter().copied()).collect();
                    let op = RewriteOp::Replace {
                        target: shape.table,
                        replacement: Replacement::Main(spec),
                    };
                    match plan.push(document, op) {
                        Ok(()) => {
                            claimed.extend(members);
                            report.push(Finding::fixed(
                                Concern::Tables,
                                class.category(),
                                json!({ "layout": scaffold.layout }),
                            ));
                        }
                        Err(err) => report.push(Finding::rejected(Concern::Tables, class.category(), &err)),
                    }
                }
                Err((reason, mut detail)) => {
                    debug!(%reason, "scaffold rewrite blocked");
                    detail["reason"] = json!(RetrofitError::precondition(reason).kind.to_string());
                    report.push(Finding::review(Concern::Tables, "Scaffold (blocked)", detail));
                }
            }
        }

        for (shape, class) in &classified {
            if matches!(class, TableClass::Scaffold(_)) {
                continue;
            }
            if claimed.iter().any(|c| *c == shape.table || document.is_ancestor_of(*c, shape.table)) {
                report.push(Finding::noted(Concern::Tables, "Group member"));
                continue;
            }

            match class {
                TableClass::Figure(spec) => {
                    let op = RewriteOp::Replace {
                        target: shape.table,
                        replacement: Replacement::Figure(spec.clone()),
                    };
                    match plan.push(document, op) {
                        Ok(()) => report.push(Finding::fixed(
                            Concern::Tables,
                            class.category(),
                            Self::detail(document, shape),
                        )),
                        Err(err) => report.push(Finding::rejected(Concern::Tables, class.category(), &err)),
                    }
                }
                TableClass::Boxed(BoxedKind::Masthead) => report.push(Finding::noted(Concern::Tables, class.category())),
                TableClass::Boxed(_) | TableClass::Other => report.push(Finding::review(
                    Concern::Tables,
                    class.category(),
                    Self::detail(document, shape),
                )),
                TableClass::Scaffold(_) => {}
            }
        }
        Ok(())
    }
}

//! 内联脚本分类
//!
//! 两类输入：
//!
//! - `<a href="javascript:…">` 中的脚本片段
//! - `onclick` 等事件处理器属性，先包进合成函数再解析，使单独的 `return` 合法
//!
//! 已知的空操作写法直接识别，不经过解析器；其余片段解析为表达式树后，
//! 按源码顺序深度优先查找第一个名字以配置前缀开头的函数调用。
//! 参数必须全部是字面量，否则结果为 `Unknown`。

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use serde_json::json;

use crate::config::{EngineConfig, PopupRewrite};
use crate::error::{Context, RetrofitResult};
use crate::parsers::html::{Attr, Document, NodeId};
use crate::parsers::js::{attr_is_event_handler, parse_handler, parse_script, Expr, Literal, Stmt};
use crate::report::{DocumentReport, Finding};
use crate::rewrite::{Plan, PopupSpec, Replacement, Resource, RewriteOp};

use super::Concern;

const POPUP_CLASS: &str = "popup";

/// 匹配到的弹窗调用
#[derive(Clone, Debug, PartialEq)]
pub struct PopupCall {
    pub name: String,
    pub args: Vec<Literal>,
}

/// 弹窗调用查找结果
#[derive(Clone, Debug, PartialEq)]
pub enum PopupSearch {
    Found(PopupCall),
    /// 找到了调用，但有参数不是字面量
    NonLiteral(String),
    NotFound,
}

/// `javascript:` 链接的分类
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptKind {
    Blank,
    Semicolon,
    CloseWindow,
    VoidZero,
    Popup(PopupCall),
    Unknown,
}

impl ScriptKind {
    pub fn label(&self) -> &str {
        match self {
            ScriptKind::Blank => "Blank",
            ScriptKind::Semicolon => "Semicolon",
            ScriptKind::CloseWindow => "CloseWindow",
            ScriptKind::VoidZero => "VoidZero",
            ScriptKind::Popup(call) => &call.name,
            ScriptKind::Unknown => "Unknown",
        }
    }

    /// 不做任何事情的写法
    pub fn is_no_op(&self) -> bool {
        matches!(
            self,
            ScriptKind::Blank | ScriptKind::Semicolon | ScriptKind::VoidZero | ScriptKind::CloseWindow
        )
    }
}

/// 事件处理器的分类
#[derive(Clone, Debug, PartialEq)]
pub enum HandlerKind {
    Popup(PopupCall),
    /// 只设置状态栏文字
    StatusBar,
    /// 切换元素的 CSS 类
    ClassToggle,
    Unknown,
}

impl HandlerKind {
    pub fn label(&self) -> &'static str {
        match self {
            HandlerKind::Popup(_) => "HandlerPopup",
            HandlerKind::StatusBar => "StatusBar",
            HandlerKind::ClassToggle => "ClassToggle",
            HandlerKind::Unknown => "UnknownHandler",
        }
    }
}

/// 在语句列表中查找第一个弹窗调用
pub fn find_popup_call(body: &[Stmt], prefixes: &[String]) -> PopupSearch {
    for stmt in body {
        match search_stmt(stmt, prefixes) {
            PopupSearch::NotFound => continue,
            found => return found,
        }
    }
    PopupSearch::NotFound
}

fn search_stmt(stmt: &Stmt, prefixes: &[String]) -> PopupSearch {
    match stmt {
        Stmt::Expr(e) | Stmt::Return(Some(e)) => search_expr(e, prefixes),
        Stmt::Block(body) | Stmt::Function { body, .. } => find_popup_call(body, prefixes),
        Stmt::If {
            test,
            consequent,
            alternate,
        } => {
            let found = search_expr(test, prefixes);
            if found != PopupSearch::NotFound {
                return found;
            }
            let found = search_stmt(consequent, prefixes);
            if found != PopupSearch::NotFound {
                return found;
            }
            match alternate {
                Some(alt) => search_stmt(alt, prefixes),
                None => PopupSearch::NotFound,
            }
        }
        Stmt::Var { decls, .. } => {
            for (_, init) in decls {
                if let Some(init) = init {
                    match search_expr(init, prefixes) {
                        PopupSearch::NotFound => continue,
                        found => return found,
                    }
                }
            }
            PopupSearch::NotFound
        }
        Stmt::Return(None) | Stmt::Empty => PopupSearch::NotFound,
    }
}

fn search_exprs<'a>(exprs: impl IntoIterator<Item = &'a Expr>, prefixes: &[String]) -> PopupSearch {
    for expr in exprs {
        match search_expr(expr, prefixes) {
            PopupSearch::NotFound => continue,
            found => return found,
        }
    }
    PopupSearch::NotFound
}

fn search_expr(expr: &Expr, prefixes: &[String]) -> PopupSearch {
    match expr {
        Expr::Call { callee, args } => {
            if let Some(name) = callee.callee_name() {
                if prefixes.iter().any(|p| !p.is_empty() && name.starts_with(p.as_str())) {
                    let literals: Option<Vec<Literal>> =
                        args.iter().map(|a| a.as_literal().cloned()).collect();
                    return match literals {
                        Some(args) => PopupSearch::Found(PopupCall {
                            name: name.to_string(),
                            args,
                        }),
                        None => PopupSearch::NonLiteral(name.to_string()),
                    };
                }
            }
            search_exprs(std::iter::once(callee.as_ref()).chain(args.iter()), prefixes)
        }
        Expr::New { callee, args } => {
            search_exprs(std::iter::once(callee.as_ref()).chain(args.iter()), prefixes)
        }
        Expr::Array(items) | Expr::Sequence(items) => search_exprs(items, prefixes),
        Expr::Object(props) => search_exprs(props.iter().map(|(_, v)| v), prefixes),
        Expr::Member {
            object, property, ..
        } => search_exprs([object.as_ref(), property.as_ref()], prefixes),
        Expr::Unary { arg, .. } | Expr::Update { arg, .. } => search_expr(arg, prefixes),
        Expr::Binary { left, right, .. } => search_exprs([left.as_ref(), right.as_ref()], prefixes),
        Expr::Assign { target, value, .. } => search_exprs([target.as_ref(), value.as_ref()], prefixes),
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => search_exprs(
            [test.as_ref(), consequent.as_ref(), alternate.as_ref()],
            prefixes,
        ),
        Expr::Function { body, .. } => find_popup_call(body, prefixes),
        Expr::Literal(_) | Expr::Ident(_) | Expr::This => PopupSearch::NotFound,
    }
}

fn is_status_assignment(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Expr(Expr::Assign { target, .. }) => matches!(
            target.dotted_path().as_deref(),
            Some("window.status") | Some("status") | Some("self.status")
        ),
        _ => false,
    }
}

fn is_class_toggle(stmt: &Stmt) -> bool {
    let Stmt::Expr(expr) = stmt else {
        return false;
    };
    match expr {
        Expr::Assign { target, .. } => matches!(
            target.as_ref(),
            Expr::Member { property, computed: false, .. } if **property == Expr::Ident("className".to_string())
        ),
        Expr::Call { callee, .. } => match callee.as_ref() {
            Expr::Member {
                object,
                property,
                computed: false,
            } => {
                let method = matches!(property.as_ref(), Expr::Ident(m) if m == "toggle" || m == "add" || m == "remove");
                let on_class_list = matches!(
                    object.as_ref(),
                    Expr::Member { property, computed: false, .. } if **property == Expr::Ident("classList".to_string())
                );
                method && on_class_list
            }
            _ => false,
        },
        _ => false,
    }
}

fn describe_attrs(document: &Document, id: NodeId) -> String {
    let mut names: Vec<&str> = document.attrs(id).iter().map(|a| a.local()).collect();
    names.sort_unstable();
    names.join(",")
}

fn literal_json(args: &[Literal]) -> serde_json::Value {
    serde_json::to_value(args).unwrap_or_default()
}

pub struct ScriptClassifier {
    prefixes: Vec<String>,
    rewrites: HashMap<String, PopupRewrite>,
    popup_script: Option<String>,
}

impl ScriptClassifier {
    pub fn new(config: &EngineConfig) -> Self {
        ScriptClassifier {
            prefixes: config.scripts.prefixes.clone(),
            rewrites: config
                .scripts
                .rewrites
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            popup_script: config.resources.popup_script.clone(),
        }
    }

    /// 分类 `javascript:` 之后的脚本片段（已解码）
    pub fn classify_fragment(&self, js: &str) -> RetrofitResult<ScriptKind> {
        let trimmed = js.trim();
        if trimmed.is_empty() {
            return Ok(ScriptKind::Blank);
        }
        if trimmed == ";" {
            return Ok(ScriptKind::Semicolon);
        }
        match trimmed.trim_end_matches(';').trim_end() {
            "window.close()" => return Ok(ScriptKind::CloseWindow),
            "void(0)" | "void 0" => return Ok(ScriptKind::VoidZero),
            _ => {}
        }

        let program = parse_script(js).context("JS code", js)?;
        Ok(match find_popup_call(&program.body, &self.prefixes) {
            PopupSearch::Found(call) => ScriptKind::Popup(call),
            PopupSearch::NonLiteral(_) | PopupSearch::NotFound => ScriptKind::Unknown,
        })
    }

    /// 分类事件处理器属性的值
    pub fn classify_handler(&self, code: &str) -> RetrofitResult<HandlerKind> {
        let body = parse_handler(code).context("JS code", code)?;
        match find_popup_call(&body, &self.prefixes) {
            PopupSearch::Found(call) => return Ok(HandlerKind::Popup(call)),
            PopupSearch::NonLiteral(_) => return Ok(HandlerKind::Unknown),
            PopupSearch::NotFound => {}
        }

        let only_status = body.iter().all(|s| {
            is_status_assignment(s)
                || matches!(
                    s,
                    Stmt::Empty | Stmt::Return(None) | Stmt::Return(Some(Expr::Literal(Literal::Bool(_))))
                )
        });
        if only_status && body.iter().any(is_status_assignment) {
            return Ok(HandlerKind::StatusBar);
        }
        if body.iter().any(is_class_toggle) {
            return Ok(HandlerKind::ClassToggle);
        }
        Ok(HandlerKind::Unknown)
    }

    /// 按配置的参数映射取出链接目标和标题
    fn popup_target(&self, call: &PopupCall) -> Option<(String, Option<String>)> {
        let rewrite = self.rewrites.get(&call.name)?;
        let href = call.args.get(rewrite.href_arg)?.as_str()?.to_string();
        let title = match rewrite.title_arg {
            Some(i) => Some(call.args.get(i)?.to_string()),
            None => None,
        };
        Some((href, title))
    }

    fn with_popup_class(document: &Document, id: NodeId) -> Vec<String> {
        let mut classes: Vec<String> = document.classes(id).iter().map(|c| c.to_string()).collect();
        if !classes.iter().any(|c| c == POPUP_CLASS) {
            classes.push(POPUP_CLASS.to_string());
        }
        classes
    }

    fn require_popup_script(&self, plan: &mut Plan) {
        if let Some(src) = &self.popup_script {
            plan.require(Resource::Script(src.clone()));
        }
    }

    /// 事件处理器：返回每个元素要删除或修改的属性
    fn scan_handlers(
        &self,
        document: &Document,
        report: &mut DocumentReport,
    ) -> RetrofitResult<Vec<(NodeId, Vec<(String, Option<String>)>)>> {
        let mut changes = Vec::new();
        for id in document.descendants(document.root()) {
            let mut element_changes: Vec<(String, Option<String>)> = Vec::new();
            for attr in document.attrs(id) {
                let name = attr.local();
                if !attr_is_event_handler(name) {
                    continue;
                }
                let kind = self
                    .classify_handler(&attr.value)
                    .context("Attribute", name)
                    .context("Element", document.tag_name(id).unwrap_or_default())?;

                match &kind {
                    HandlerKind::StatusBar => {
                        element_changes.push((name.to_string(), None));
                        report.push(Finding::fixed(Concern::Scripts, kind.label(), json!({ "attr": name })));
                    }
                    HandlerKind::Popup(call) => {
                        let same_target = self
                            .popup_target(call)
                            .is_some_and(|(href, _)| document.attr(id, "href") == Some(href.as_str()));
                        if name.eq_ignore_ascii_case("onclick") && document.is_tag(id, "a") && same_target {
                            element_changes.push((name.to_string(), None));
                            element_changes.push((
                                "class".to_string(),
                                Some(Self::with_popup_class(document, id).join(" ")),
                            ));
                            report.push(Finding::fixed(
                                Concern::Scripts,
                                kind.label(),
                                json!({ "attr": name, "function": call.name }),
                            ));
                        } else {
                            report.push(
                                Finding::review(
                                    Concern::Scripts,
                                    kind.label(),
                                    json!({ "attr": name, "function": call.name, "args": literal_json(&call.args) }),
                                )
                                .with_anomaly(format!("{}={}", name, attr.value)),
                            );
                        }
                    }
                    HandlerKind::ClassToggle => report.push(Finding::noted(Concern::Scripts, kind.label())),
                    HandlerKind::Unknown => report.push(
                        Finding::review(Concern::Scripts, kind.label(), json!({ "attr": name, "code": attr.value }))
                            .with_anomaly(format!("{}={}", name, attr.value)),
                    ),
                }
            }
            if !element_changes.is_empty() {
                changes.push((id, element_changes));
            }
        }
        Ok(changes)
    }

    pub fn run(&self, document: &Document, plan: &mut Plan, report: &mut DocumentReport) -> RetrofitResult<()> {
        let mut handler_changes: HashMap<NodeId, Vec<(String, Option<String>)>> =
            self.scan_handlers(document, report)?.into_iter().collect();
        let mut popup_used = handler_changes
            .values()
            .any(|c| c.iter().any(|(n, _)| n == "class"));

        for &anchor in document.elements_by_tag("a") {
            let Some(href) = document.attr(anchor, "href") else {
                continue;
            };
            let Some(rest) = href
                .get(..11)
                .filter(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
                .map(|_| &href[11..])
            else {
                continue;
            };
            let js = percent_decode_str(rest).decode_utf8_lossy().to_string();
            let kind = self
                .classify_fragment(&js)
                .context("Element", format!("<a href=\"{}\">", href))?;
            let attrs = describe_attrs(document, anchor);

            let void = document.element_children(anchor).next().is_none()
                && document.text_content(anchor).trim().is_empty();
            if void {
                let named = document.has_attr(anchor, "id") || document.has_attr(anchor, "name");
                if kind.is_no_op() && !named {
                    handler_changes.remove(&anchor);
                    match plan.push(document, RewriteOp::Remove { target: anchor }) {
                        Ok(()) => report.push(Finding::fixed(Concern::Scripts, "Void", json!({ "code": js }))),
                        Err(err) => report.push(Finding::rejected(Concern::Scripts, "Void", &err)),
                    }
                } else {
                    report.push(Finding::noted(Concern::Scripts, "Void"));
                }
                continue;
            }

            match &kind {
                ScriptKind::Popup(call) => match self.popup_target(call) {
                    Some((target, title)) => {
                        let removed: Vec<String> = handler_changes
                            .remove(&anchor)
                            .unwrap_or_default()
                            .into_iter()
                            .filter(|(_, v)| v.is_none())
                            .map(|(n, _)| n)
                            .collect();
                        let rest: Vec<Attr> = document
                            .attrs(anchor)
                            .iter()
                            .filter(|a| !matches!(a.local(), "href" | "title" | "class"))
                            .filter(|a| !removed.iter().any(|r| r == a.local()))
                            .cloned()
                            .collect();
                        let spec = PopupSpec {
                            anchor,
                            href: target,
                            title,
                            classes: Self::with_popup_class(document, anchor),
                            rest,
                        };
                        let op = RewriteOp::Replace {
                            target: anchor,
                            replacement: Replacement::PopupAnchor(spec),
                        };
                        match plan.push(document, op) {
                            Ok(()) => {
                                popup_used = true;
                                report.push(Finding::fixed(
                                    Concern::Scripts,
                                    kind.label(),
                                    json!({ "args": literal_json(&call.args) }),
                                ));
                            }
                            Err(err) => report.push(Finding::rejected(Concern::Scripts, kind.label(), &err)),
                        }
                    }
                    None => report.push(
                        Finding::review(
                            Concern::Scripts,
                            kind.label(),
                            json!({ "args": literal_json(&call.args), "attrs": attrs }),
                        )
                        .with_anomaly(format!("{} [{}]", js, attrs)),
                    ),
                },
                _ => report.push(
                    Finding::review(Concern::Scripts, kind.label(), json!({ "code": js, "attrs": attrs }))
                        .with_anomaly(format!("{} [{}]", js, attrs)),
                ),
            }
        }

        let mut remaining: Vec<(NodeId, Vec<(String, Option<String>)>)> = handler_changes.into_iter().collect();
        remaining.sort_by_key(|(id, _)| *id);
        for (target, attrs) in remaining {
            if let Err(err) = plan.push(document, RewriteOp::SetAttrs { target, attrs }) {
                report.push(Finding::rejected(Concern::Scripts, "Handler", &err));
            }
        }
        if popup_used {
            self.require_popup_script(plan);
        }
        Ok(())
    }
}

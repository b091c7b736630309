//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use retrofit::parsers::html::{serialize_document, Document};
    use retrofit::rewrite::{FigureSpec, MainSpec, Plan, Replacement, Resource, RewriteOp};

    fn render(document: &Document) -> String {
        String::from_utf8(serialize_document(document, "utf-8").unwrap()).unwrap()
    }

    #[test]
    fn adopted_content_can_be_rewritten_separately() {
        let mut d = Document::parse(
            b"<table><caption>c</caption><tr><td><p>x<a href=\"javascript:;\"></a></p></td></tr></table>",
            "utf-8",
        )
        .unwrap();
        let table = d.first_by_tag("table").unwrap();
        let figure = FigureSpec {
            content_cell: d.first_by_tag("td").unwrap(),
            caption: d.first_by_tag("caption"),
            caption_after: true,
            figure_classes: vec![],
            figure_style: None,
            inner_classes: vec![],
            inner_style: None,
            caption_classes: vec![],
        };

        let mut plan = Plan::new();
        plan.push(
            &d,
            RewriteOp::Replace {
                target: table,
                replacement: Replacement::Figure(figure),
            },
        )
        .unwrap();
        plan.push(&d, RewriteOp::Remove { target: d.first_by_tag("a").unwrap() })
            .unwrap();

        let summary = plan.commit(&mut d).unwrap();
        assert_eq!(summary.applied, 2);
        assert!(render(&d).contains("<figure><div><p>x</p></div><figcaption>c</figcaption></figure>"));
    }

    fn figure_of(d: &Document) -> RewriteOp {
        RewriteOp::Replace {
            target: d.first_by_tag("table").unwrap(),
            replacement: Replacement::Figure(FigureSpec {
                content_cell: d.first_by_tag("td").unwrap(),
                caption: d.first_by_tag("caption"),
                caption_after: false,
                figure_classes: vec![],
                figure_style: None,
                inner_classes: vec![],
                inner_style: None,
                caption_classes: vec![],
            }),
        }
    }

    #[test]
    fn cell_text_is_replaced_before_the_figure_moves_it() {
        let mut d = Document::parse(
            b"<table><caption>c</caption><tr><td>old <b>notice</b></td></tr></table>",
            "utf-8",
        )
        .unwrap();
        let td = d.first_by_tag("td").unwrap();
        let mut plan = Plan::new();
        plan.push(&d, figure_of(&d)).unwrap();
        plan.push(
            &d,
            RewriteOp::ReplaceChildren {
                parent: td,
                text: "new".to_string(),
            },
        )
        .unwrap();

        plan.commit(&mut d).unwrap();
        assert!(render(&d).contains("<figure><figcaption>c</figcaption><div>new</div></figure>"));
    }

    #[test]
    fn main_supersedes_rewrites_inside_removed_table() {
        let mut d = Document::parse(
            b"<table id=banner><tr><td>top</td></tr></table>\
              <table id=frame><tr><td>content</td></tr></table>\
              <table id=bottom><tr><td onmouseover=\"x\">old notice</td></tr></table>",
            "utf-8",
        )
        .unwrap();
        let tables = d.elements_by_tag("table").to_vec();
        let tds = d.elements_by_tag("td").to_vec();
        let notice = d.children(tds[2])[0];

        let mut plan = Plan::new();
        plan.push(
            &d,
            RewriteOp::ReplaceText {
                target: notice,
                text: String::new(),
            },
        )
        .unwrap();
        plan.push(
            &d,
            RewriteOp::SetAttrs {
                target: tds[2],
                attrs: vec![("onmouseover".to_string(), None)],
            },
        )
        .unwrap();
        plan.push(
            &d,
            RewriteOp::Replace {
                target: tables[1],
                replacement: Replacement::Main(MainSpec {
                    content_cell: tds[1],
                    banner: Some(tables[0]),
                    remove: vec![tables[2]],
                    footer: false,
                }),
            },
        )
        .unwrap();
        assert_eq!(plan.len(), 1);

        let summary = plan.commit(&mut d).unwrap();
        assert_eq!(summary.applied, 1);
        let html = render(&d);
        assert!(html.contains("<main><table id=\"banner\">"));
        assert!(html.contains("content</main>"));
        assert!(!html.contains("old notice"));
    }

    #[test]
    fn present_resources_are_not_injected_again() {
        let mut d = Document::parse(
            b"<html><head><link rel=\"stylesheet\" href=\"/styles/gsarchive.css\"></head><body></body></html>",
            "utf-8",
        )
        .unwrap();
        let mut plan = Plan::new();
        plan.require(Resource::Stylesheet("/styles/gsarchive.css".to_string()));
        let summary = plan.commit(&mut d).unwrap();
        assert!(!summary.changed());
    }
}

//  ███████╗ █████╗ ██╗██╗     ██╗███╗   ██╗ ██████╗
//  ██╔════╝██╔══██╗██║██║     ██║████╗  ██║██╔════╝
//  █████╗  ███████║██║██║     ██║██╔██╗ ██║██║  ███╗
//  ██╔══╝  ██╔══██║██║██║     ██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║██║███████╗██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚═╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod failing {
    use retrofit::parsers::html::{serialize_document, Document};
    use retrofit::rewrite::{MainSpec, Plan, Replacement, RewriteOp};

    #[test]
    fn overlapping_rewrite_is_rejected_as_precondition() {
        let d = Document::parse(b"<div><p>a</p></div>", "utf-8").unwrap();
        let mut plan = Plan::new();
        plan.push(&d, RewriteOp::Remove { target: d.first_by_tag("div").unwrap() })
            .unwrap();
        let err = plan
            .push(
                &d,
                RewriteOp::ReplaceChildren {
                    parent: d.first_by_tag("p").unwrap(),
                    text: "b".to_string(),
                },
            )
            .unwrap_err();
        assert_eq!(err.kind.category(), "PreconditionViolation");
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn kept_banner_is_not_superseded() {
        let d = Document::parse(
            b"<table><tr><td>top</td></tr></table><table><tr><td>content</td></tr></table>",
            "utf-8",
        )
        .unwrap();
        let tables = d.elements_by_tag("table").to_vec();
        let tds = d.elements_by_tag("td").to_vec();

        let mut plan = Plan::new();
        plan.push(&d, RewriteOp::Remove { target: tables[0] }).unwrap();
        let err = plan
            .push(
                &d,
                RewriteOp::Replace {
                    target: tables[1],
                    replacement: Replacement::Main(MainSpec {
                        content_cell: tds[1],
                        banner: Some(tables[0]),
                        remove: vec![],
                        footer: false,
                    }),
                },
            )
            .unwrap_err();
        assert_eq!(err.kind.category(), "PreconditionViolation");
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn nothing_commits_when_one_op_fails() {
        let mut d = Document::parse(b"<p>a</p><p>b</p>", "utf-8").unwrap();
        let before = serialize_document(&d, "utf-8").unwrap();
        let ps = d.elements_by_tag("p").to_vec();
        let mut plan = Plan::new();
        plan.push(&d, RewriteOp::Remove { target: ps[0] }).unwrap();
        plan.push(
            &d,
            RewriteOp::ReplaceText {
                target: ps[1],
                text: "not a text node".to_string(),
            },
        )
        .unwrap();
        assert!(plan.commit(&mut d).is_err());
        assert_eq!(serialize_document(&d, "utf-8").unwrap(), before);
    }
}

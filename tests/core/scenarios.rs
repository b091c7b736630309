//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use retrofit::classifiers::Concern;

    use crate::common::{page, processor, processor_for, run};

    #[test]
    fn copyright_with_trailing_date() {
        let input = page("<p>Copyright 2003 Gilbert and Sullivan Archive. Page modified 3 Jan 2005.</p>");
        let (html, report, changed) = run(&processor_for(&[Concern::Copyright]), &input);

        assert!(changed);
        assert!(html.contains("<p>Page modified 3 Jan 2005</p>"));
        assert!(html.contains("<footer class=\"standalone\">"));
        assert!(html.contains("<link href=\"/styles/gsarchive.css\""));
        assert_eq!(report.categories(Concern::Copyright), vec!["Corrected"]);
    }

    #[test]
    fn captioned_single_cell_table_becomes_figure() {
        let input = page("<table><caption align=\"bottom\">Sir Arthur</caption><tr><td>Portrait</td></tr></table>");
        let (html, report, changed) = run(&processor_for(&[Concern::Tables]), &input);

        assert!(changed);
        assert!(html.contains("<figure><div>Portrait</div><figcaption>Sir Arthur</figcaption></figure>"));
        assert!(!html.contains("<table"));
        assert_eq!(report.categories(Concern::Tables), vec!["Figure"]);
    }

    #[test]
    fn popup_anchor_is_rewritten() {
        let input = page("<a href=\"javascript:openPopImg('a.jpg','Title',320,240)\">see</a>");
        let (html, report, changed) = run(&processor_for(&[Concern::Scripts]), &input);

        assert!(changed);
        assert!(html.contains("<a href=\"a.jpg\" title=\"Title\" class=\"popup\">see</a>"));
        assert_eq!(report.categories(Concern::Scripts), vec!["openPopImg"]);
        assert_eq!(
            report.findings[0].detail["args"],
            serde_json::json!(["a.jpg", "Title", 320, 240])
        );
    }

    #[test]
    fn empty_javascript_anchor_is_removed() {
        let input = page("<p>Before<a href=\"javascript:;\"></a>after</p>");
        let (html, report, changed) = run(&processor_for(&[Concern::Scripts]), &input);

        assert!(changed);
        assert!(html.contains("<p>Beforeafter</p>"));
        assert_eq!(report.categories(Concern::Scripts), vec!["Void"]);
    }

    #[test]
    fn unrecognized_single_cell_is_reported_only() {
        let input = page("<table><tr><td><div><span>odd</span> layout</div></td></tr></table>");
        let (_, report, changed) = run(&processor_for(&[Concern::Tables]), &input);

        assert!(!changed);
        assert_eq!(report.categories(Concern::Tables), vec!["Unrecognized"]);
        assert_eq!(report.findings[0].detail["signature"], serde_json::json!([1]));
    }

    #[test]
    fn notice_inside_figure_cell_is_corrected() {
        let input = page(
            "<table><caption>Cap</caption><tr><td>Copyright 2003 Paul Howarth. Page modified 3 Jan 2005.</td></tr></table>",
        );
        let (html, report, changed) = run(&processor_for(&[Concern::Copyright, Concern::Tables]), &input);

        assert!(changed);
        assert!(html.contains("<figure><figcaption>Cap</figcaption><div>Page modified 3 Jan 2005</div></figure>"));
        assert!(!html.contains("Paul Howarth"));
        assert_eq!(report.categories(Concern::Copyright), vec!["Corrected"]);
        assert_eq!(report.categories(Concern::Tables), vec!["Figure"]);
    }

    #[test]
    fn independent_rewrites_share_one_pass() {
        let input = page(
            "<p>Copyright 2003 Paul Howarth</p>\
             <a href=\"javascript:openPopWin('cast.html')\">Cast</a>\
             <img src=\"red.gif\">",
        );
        let (html, report, changed) = run(&processor(), &input);

        assert!(changed);
        assert!(html.contains("<a href=\"cast.html\" class=\"popup\">Cast</a>"));
        assert!(html.contains("<img src=\"red.gif\" title=\"Red\" alt=\"Red\">"));
        assert_eq!(report.categories(Concern::Copyright), vec!["Corrected"]);
        assert!(report.changes >= 3);
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
    use retrofit::classifiers::Concern;

    use crate::common::{page, processor, processor_for, run};

    #[test]
    fn non_literal_popup_argument_is_not_guessed() {
        let input = page("<a href=\"javascript:openPopImg(base + 'a.jpg','Title')\">see</a>");
        let (_, report, changed) = run(&processor_for(&[Concern::Scripts]), &input);

        assert!(!changed);
        assert_eq!(report.categories(Concern::Scripts), vec!["Unknown"]);
    }

    #[test]
    fn unparsable_script_skips_the_whole_document() {
        let input = page(
            "<p>Copyright 2003 Paul Howarth</p><a href=\"javascript:openPopImg('a.jpg',\">see</a>",
        );
        let (html, report, changed) = run(&processor(), &input);

        assert!(!changed);
        assert_eq!(html, input);
        let err = report.error.unwrap();
        assert_eq!(err.kind.category(), "ParseFailure");
        assert_eq!(err.context_value("File name"), Some("fixture.html"));
        assert!(err.context_value("JS code").is_some());
    }

    #[test]
    fn unknown_copyright_residue_is_left_for_review() {
        let input = page("<p>Copyright 2003 Paul Howarth. Photographs by Fred.</p>");
        let (_, report, changed) = run(&processor_for(&[Concern::Copyright]), &input);

        assert!(!changed);
        assert_eq!(report.categories(Concern::Copyright), vec!["AllRightsReserved"]);
    }
}

//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use retrofit::classifiers::table::{TableClassifier, TableShape};
    use retrofit::parsers::html::Document;
    use retrofit::EngineConfig;

    const NESTED: &[&str] = &[
        "<table><tr><td><table><tr><td>a</td></tr></table></td></tr></table>",
        "<table><tr><td>1</td><td><table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table></td></tr><tr><td>2</td></tr></table>",
        "<table><tr><td><table><tr><td><table><tr><td>x</td><td>y</td><td>z</td></tr></table></td></tr></table></td></tr></table>",
        "<table><caption>outer</caption><tr><th>h</th><td><table><caption>inner</caption><tr><td>a</td></tr></table></td></tr></table>",
    ];

    fn doc(html: &str) -> Document {
        Document::parse(html.as_bytes(), "utf-8").unwrap()
    }

    #[test]
    fn every_row_belongs_to_exactly_one_table() {
        for html in NESTED {
            let d = doc(html);
            let shapes: Vec<TableShape> = d
                .elements_by_tag("table")
                .iter()
                .map(|t| TableShape::of(&d, *t))
                .collect();
            for row in d.elements_by_tag("tr") {
                let owners: Vec<&TableShape> = shapes.iter().filter(|s| s.rows.contains(row)).collect();
                assert_eq!(owners.len(), 1, "{}", html);
                assert_eq!(Some(owners[0].table), d.nearest_ancestor(*row, "table"));
            }
        }
    }

    #[test]
    fn signatures_ignore_nested_cells() {
        let d = doc(NESTED[1]);
        let signatures: Vec<Vec<usize>> = d
            .elements_by_tag("table")
            .iter()
            .map(|t| TableShape::of(&d, *t).signature)
            .collect();
        assert_eq!(signatures, vec![vec![2, 1], vec![2, 1]]);
    }

    #[test]
    fn nested_captioned_table_is_the_only_figure() {
        let d = doc(NESTED[3]);
        let classifier = TableClassifier::new(&EngineConfig::default());
        let classes: Vec<&str> = d
            .elements_by_tag("table")
            .iter()
            .map(|t| classifier.classify(&d, &TableShape::of(&d, *t)).category())
            .collect();
        assert_eq!(classes, vec!["Other", "Figure"]);
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
    use retrofit::classifiers::table::{TableClass, TableClassifier, TableShape};
    use retrofit::parsers::html::Document;
    use retrofit::EngineConfig;

    #[test]
    fn wrong_cell_marker_is_not_a_scaffold() {
        let html = "<table>\
            <tr><td background=\"corner_tl.gif\"></td><td bgcolor=\"#000080\"></td><td bgcolor=\"red\"></td></tr>\
            <tr><td bgcolor=\"navy\"></td><td>Content</td><td bgcolor=\"navy\"></td></tr>\
            <tr><td bgcolor=navy></td><td bgcolor=navy></td><td bgcolor=navy></td></tr></table>";
        let d = Document::parse(html.as_bytes(), "utf-8").unwrap();
        let shape = TableShape::of(&d, d.first_by_tag("table").unwrap());
        let class = TableClassifier::new(&EngineConfig::default()).classify(&d, &shape);
        assert_eq!(class, TableClass::Other);
    }
}

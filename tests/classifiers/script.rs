//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use retrofit::classifiers::script::{find_popup_call, PopupSearch, ScriptClassifier, ScriptKind};
    use retrofit::parsers::js::{parse_script, Literal};
    use retrofit::EngineConfig;

    fn prefixes() -> Vec<String> {
        vec!["openPop".to_string()]
    }

    fn first_call(js: &str) -> PopupSearch {
        find_popup_call(&parse_script(js).unwrap().body, &prefixes())
    }

    #[test]
    fn first_call_in_source_order() {
        let cases = [
            ("openPopWin('a.html'); openPopImg('b.jpg')", "openPopWin"),
            ("if (x) { openPopImg('a.jpg') } else openPopWin('b.html')", "openPopImg"),
            ("var w = openPopWin('a.html'), v = openPopImg('b.jpg');", "openPopWin"),
            ("void(openPopImg('a.jpg'))", "openPopImg"),
            ("x = y || openPopWin('a.html')", "openPopWin"),
        ];
        for (js, expected) in cases {
            match first_call(js) {
                PopupSearch::Found(call) => assert_eq!(call.name, expected, "{}", js),
                other => panic!("{}: {:?}", js, other),
            }
        }
    }

    #[test]
    fn arguments_are_literals_in_order() {
        let PopupSearch::Found(call) = first_call("openPopImg(\"a.jpg\", 'It\\'s', 10, true, null)") else {
            panic!("no call");
        };
        assert_eq!(
            call.args,
            vec![
                Literal::Str("a.jpg".to_string()),
                Literal::Str("It's".to_string()),
                Literal::Num(10.0),
                Literal::Bool(true),
                Literal::Null,
            ]
        );
    }

    #[test]
    fn same_fragment_classifies_the_same_way() {
        let c = ScriptClassifier::new(&EngineConfig::default());
        let js = "openPopImg('a.jpg','Title',320,240)";
        assert_eq!(c.classify_fragment(js).unwrap(), c.classify_fragment(js).unwrap());
    }

    #[test]
    fn other_prefix_is_ignored() {
        assert_eq!(first_call("showPicture('a.jpg')"), PopupSearch::NotFound);
        let c = ScriptClassifier::new(&EngineConfig::default());
        assert_eq!(c.classify_fragment("showPicture('a.jpg')").unwrap(), ScriptKind::Unknown);
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
    use retrofit::classifiers::script::{find_popup_call, PopupSearch, ScriptClassifier, ScriptKind};
    use retrofit::parsers::js::parse_script;
    use retrofit::EngineConfig;

    #[test]
    fn non_literal_never_yields_partial_arguments() {
        for js in [
            "openPopImg(src, 'Title')",
            "openPopImg('a.jpg', title)",
            "openPopImg('a' + '.jpg')",
            "openPopImg(-1)",
        ] {
            let program = parse_script(js).unwrap();
            assert!(
                matches!(find_popup_call(&program.body, &["openPop".to_string()]), PopupSearch::NonLiteral(_)),
                "{}",
                js
            );
            let c = ScriptClassifier::new(&EngineConfig::default());
            assert_eq!(c.classify_fragment(js).unwrap(), ScriptKind::Unknown);
        }
    }

    #[test]
    fn parse_failure_carries_the_fragment() {
        let c = ScriptClassifier::new(&EngineConfig::default());
        let err = c.classify_handler("if (").unwrap_err();
        assert_eq!(err.kind.category(), "ParseFailure");
        assert_eq!(err.context_value("JS code"), Some("if ("));
    }
}

//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use retrofit::classifiers::copyright::{CopyrightClassifier, Residue};
    use retrofit::EngineConfig;

    fn classifier() -> CopyrightClassifier {
        CopyrightClassifier::new(&EngineConfig::default()).unwrap()
    }

    #[test]
    fn every_residue_falls_into_exactly_one_class() {
        let c = classifier();
        let notices = [
            ("Copyright 2003 Gilbert and Sullivan Archive. Page modified 3 Jan 2005.", "Date"),
            ("Copyright 1999 Gilbert & Sullivan Archive, All Rights Reserved. Created 14 Feb 1999", "Date"),
            ("Page modified 1 June 2004 Copyright 2004 Colin Johnson", "Date"),
            ("Copyright 2001 Paul Howarth. MIDI files", "Label"),
            ("© 2001 Paul Howarth", "Blank"),
            ("copyright 2002 Gilbert and Sullivan Archve.", "Blank"),
            ("Copyright 2003 Paul Howarth. Photos by Fred.", "Unknown"),
        ];
        for (text, expected) in notices {
            let range = c.find_phrase(text).unwrap_or_else(|| panic!("no phrase in {:?}", text));
            let residue = c.classify_residue(&format!("{}{}", &text[..range.start], &text[range.end..]));
            assert_eq!(residue.label(), expected, "{:?}", text);
            assert_eq!(residue.is_fixable(), expected != "Unknown");
        }
    }

    #[test]
    fn yearless_date_has_no_trailing_year() {
        assert_eq!(
            classifier().classify_residue("modified 3 Jan"),
            Residue::Date("Page modified 3 Jan".to_string())
        );
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
    use retrofit::classifiers::copyright::CopyrightClassifier;
    use retrofit::EngineConfig;

    #[test]
    fn unknown_owner_is_not_a_phrase() {
        let c = CopyrightClassifier::new(&EngineConfig::default()).unwrap();
        assert!(c.find_phrase("Copyright 2003 Someone Else").is_none());
    }

    #[test]
    fn invalid_owner_pattern_is_a_config_error() {
        let mut config = EngineConfig::default();
        config.copyright.owners = vec!["Paul(".to_string()];
        let err = CopyrightClassifier::new(&config).err().unwrap();
        assert_eq!(err.kind.category(), "ConfigError");
    }
}

//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use std::fs;

    use assert_cmd::prelude::*;
    use std::process::Command;

    #[test]
    fn reset_restores_files_from_change_log() {
        let original = tempfile::tempdir().unwrap();
        let working = tempfile::tempdir().unwrap();
        fs::create_dir_all(working.path().join("html")).unwrap();
        fs::create_dir_all(original.path().join("html")).unwrap();
        fs::write(original.path().join("html/a.html"), "original").unwrap();
        fs::write(working.path().join("html/a.html"), "rewritten").unwrap();

        let change_log = working.path().join("changes.txt");
        fs::write(&change_log, format!("{}\n", working.path().join("html/a.html").display())).unwrap();

        let out = Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .unwrap()
            .arg("reset")
            .arg("--from")
            .arg(original.path())
            .arg("--to")
            .arg(working.path())
            .arg("--change-log")
            .arg(&change_log)
            .output()
            .unwrap();

        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "1 files restored");
        assert_eq!(fs::read_to_string(working.path().join("html/a.html")).unwrap(), "original");
    }

    #[test]
    fn reset_accepts_relative_file_arguments() {
        let original = tempfile::tempdir().unwrap();
        let working = tempfile::tempdir().unwrap();
        fs::write(original.path().join("b.html"), "original").unwrap();
        fs::write(working.path().join("b.html"), "rewritten").unwrap();

        Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .unwrap()
            .arg("reset")
            .arg("--from")
            .arg(original.path())
            .arg("--to")
            .arg(working.path())
            .arg("b.html")
            .assert()
            .success();

        assert_eq!(fs::read_to_string(working.path().join("b.html")).unwrap(), "original");
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
    use assert_cmd::prelude::*;
    use std::process::Command;

    #[test]
    fn missing_original_exits_non_zero() {
        let original = tempfile::tempdir().unwrap();
        let working = tempfile::tempdir().unwrap();
        std::fs::write(working.path().join("c.html"), "rewritten").unwrap();

        Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .unwrap()
            .arg("reset")
            .arg("--from")
            .arg(original.path())
            .arg("--to")
            .arg(working.path())
            .arg("c.html")
            .assert()
            .failure();

        assert_eq!(
            std::fs::read_to_string(working.path().join("c.html")).unwrap(),
            "rewritten"
        );
    }

    #[test]
    fn file_outside_working_tree_is_refused() {
        let original = tempfile::tempdir().unwrap();
        let working = tempfile::tempdir().unwrap();

        Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .unwrap()
            .arg("reset")
            .arg("--from")
            .arg(original.path())
            .arg("--to")
            .arg(working.path())
            .arg("/etc/hostname")
            .assert()
            .failure();
    }
}

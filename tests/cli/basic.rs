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

    const PAGE: &str = "<!DOCTYPE html><html><head><title>T</title></head><body>\
        <p>Copyright 2003 Gilbert and Sullivan Archive. Page modified 3 Jan 2005.</p>\
        </body></html>";

    #[test]
    fn fix_rewrites_file_and_prints_summary() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page.html");
        let review_log = dir.path().join("review.log");
        fs::write(&page, PAGE).unwrap();

        let out = Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .unwrap()
            .args(["fix", "--concern", "copyright", "--review-log"])
            .arg(&review_log)
            .arg(&page)
            .output()
            .unwrap();

        assert!(out.status.success());
        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(stdout.starts_with("1 documents, 1 changed, 0 failed"));
        assert!(stdout.contains("copyright/Corrected"));

        let rewritten = fs::read_to_string(&page).unwrap();
        assert!(rewritten.contains("<footer class=\"standalone\">"));
        assert!(review_log.exists());
    }

    #[test]
    fn dry_run_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page.html");
        fs::write(&page, PAGE).unwrap();

        let out = Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .unwrap()
            .args(["fix", "--dry-run", "--review-log"])
            .arg(dir.path().join("review.log"))
            .arg(dir.path())
            .output()
            .unwrap();

        assert!(out.status.success());
        assert!(String::from_utf8_lossy(&out.stdout).starts_with("1 documents, 0 changed, 0 failed"));
        assert_eq!(fs::read_to_string(&page).unwrap(), PAGE);
    }

    #[test]
    fn change_log_lists_rewritten_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let changed = dir.path().join("changed.html");
        let untouched = dir.path().join("untouched.html");
        let change_log = dir.path().join("changes.txt");
        fs::write(&changed, PAGE).unwrap();
        fs::write(&untouched, "<html><body><noframes>Frames needed</noframes></body></html>").unwrap();

        Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .unwrap()
            .args(["fix", "--concern", "copyright", "--review-log"])
            .arg(dir.path().join("review.log"))
            .arg("--change-log")
            .arg(&change_log)
            .arg(&changed)
            .arg(&untouched)
            .assert()
            .success();

        let listed = fs::read_to_string(&change_log).unwrap();
        assert_eq!(listed.trim(), changed.display().to_string());
    }

    #[test]
    fn help_documents_environment() {
        let out = Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .unwrap()
            .arg("--help")
            .output()
            .unwrap();

        assert!(out.status.success());
        assert!(String::from_utf8_lossy(&out.stdout).contains("RETROFIT_CONFIG"));
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
    fn missing_path_exits_non_zero() {
        let dir = tempfile::tempdir().unwrap();

        let out = Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .unwrap()
            .args(["fix", "--review-log"])
            .arg(dir.path().join("review.log"))
            .arg(dir.path().join("no-such-page.html"))
            .output()
            .unwrap();

        assert!(!out.status.success());
        assert!(String::from_utf8_lossy(&out.stderr).contains("no-such-page.html"));
    }

    #[test]
    fn invalid_jobs_variable_exits_non_zero() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page.html");
        std::fs::write(&page, "<p>x</p>").unwrap();

        for value in ["0", "many"] {
            let out = Command::cargo_bin(env!("CARGO_PKG_NAME"))
                .unwrap()
                .env("RETROFIT_JOBS", value)
                .args(["fix", "--dry-run", "--review-log"])
                .arg(dir.path().join("review.log"))
                .arg(&page)
                .output()
                .unwrap();

            assert!(!out.status.success());
            assert!(String::from_utf8_lossy(&out.stderr).contains("RETROFIT_JOBS"));
        }
    }

    #[test]
    fn fix_requires_a_path() {
        Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .unwrap()
            .arg("fix")
            .assert()
            .failure();
    }

    #[test]
    fn unreadable_config_exits_non_zero() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page.html");
        std::fs::write(&page, "<p>x</p>").unwrap();

        Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .unwrap()
            .args(["fix", "--config"])
            .arg(dir.path().join("missing.toml"))
            .arg("--review-log")
            .arg(dir.path().join("review.log"))
            .arg(&page)
            .assert()
            .failure();
    }
}

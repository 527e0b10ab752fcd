//! End-to-end CLI tests.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

struct TestEnv {
    temp: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            temp: TempDir::new().expect("create temp dir"),
        }
    }

    /// A fresh environment with `jot init` already run.
    fn initialized() -> Self {
        let env = Self::new();
        env.cmd().arg("init").assert().success();
        env
    }

    fn jot_dir(&self) -> PathBuf {
        self.temp.path().join(".jot")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("jot").expect("binary exists");
        cmd.current_dir(self.temp.path())
            .env_remove("JOT_DIR")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Add a note and return its id.
    fn add(&self, title: &str, tags: &str, body: &str) -> String {
        let output = self
            .cmd()
            .args(["add", "--title", title, "--tags", tags, "--body", body])
            .output()
            .expect("run add");
        assert!(output.status.success(), "add failed: {:?}", output);

        let stdout = String::from_utf8(output.stdout).expect("utf8");
        stdout
            .trim()
            .strip_prefix("Added note ")
            .expect("add prints id")
            .to_string()
    }

    fn tag_id(&self, label: &str) -> String {
        let output = self.cmd().arg("tags").output().expect("run tags");
        let stdout = String::from_utf8(output.stdout).expect("utf8");
        stdout
            .lines()
            .find(|line| line.contains(&format!("  {} (", label)))
            .and_then(|line| line.split_whitespace().next())
            .expect("tag listed")
            .to_string()
    }
}

mod init_tests {
    use super::*;

    #[test]
    fn test_init_creates_store() {
        let env = TestEnv::new();

        env.cmd()
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized jot"));

        assert!(env.jot_dir().join("notes.json").exists());
        assert!(env.jot_dir().join("tags.json").exists());
    }

    #[test]
    fn test_init_twice_fails() {
        let env = TestEnv::initialized();

        env.cmd()
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already initialized"));
    }

    #[test]
    fn test_reinitialize_clears_notes() {
        let env = TestEnv::initialized();
        env.add("Doomed", "", "bye");

        env.cmd()
            .args(["init", "--reinitialize"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Reinitialized"));

        env.cmd()
            .arg("ls")
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn test_commands_require_init() {
        let env = TestEnv::new();

        env.cmd()
            .arg("ls")
            .assert()
            .failure()
            .stderr(predicate::str::contains("jot init"));
    }

    #[test]
    fn test_dir_flag_and_env() {
        let env = TestEnv::new();
        let custom = env.temp.path().join("elsewhere");

        env.cmd()
            .args(["init", "--dir"])
            .arg(&custom)
            .assert()
            .success();

        env.cmd()
            .env("JOT_DIR", &custom)
            .args(["add", "--title", "Remote", "--body", "x"])
            .assert()
            .success();

        env.cmd()
            .args(["ls", "--dir"])
            .arg(&custom)
            .assert()
            .success()
            .stdout(predicate::str::contains("Remote"));
    }
}

mod note_tests {
    use super::*;

    #[test]
    fn test_add_and_show() {
        let env = TestEnv::initialized();
        let id = env.add("Grocery List", "home,errands", "* milk\n* eggs");

        env.cmd()
            .args(["show", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("# Grocery List"))
            .stdout(predicate::str::contains("* milk\n* eggs"))
            .stdout(predicate::str::contains("Tags: home,errands"));
    }

    #[test]
    fn test_add_reads_body_from_stdin() {
        let env = TestEnv::initialized();

        let output = env
            .cmd()
            .args(["add", "--title", "Piped"])
            .write_stdin("from stdin")
            .output()
            .unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        let id = stdout.trim().strip_prefix("Added note ").unwrap().to_string();

        env.cmd()
            .args(["show", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("from stdin"));
    }

    #[test]
    fn test_add_rejects_blank_title() {
        let env = TestEnv::initialized();

        env.cmd()
            .args(["add", "--title", "  ", "--body", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("title cannot be empty"));
    }

    #[test]
    fn test_show_by_prefix() {
        let env = TestEnv::initialized();
        let id = env.add("Prefixed", "", "body");

        env.cmd()
            .args(["show", &id[..8]])
            .assert()
            .success()
            .stdout(predicate::str::contains("# Prefixed"));
    }

    #[test]
    fn test_show_missing() {
        let env = TestEnv::initialized();

        env.cmd()
            .args(["show", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Note nope not found"));
    }

    #[test]
    fn test_edit_title_keeps_body_and_tags() {
        let env = TestEnv::initialized();
        let id = env.add("Old title", "keep", "original body");

        env.cmd()
            .args(["edit", &id, "--title", "New title"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Updated title"));

        env.cmd()
            .args(["show", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("# New title"))
            .stdout(predicate::str::contains("original body"))
            .stdout(predicate::str::contains("Tags: keep"));
    }

    #[test]
    fn test_edit_nothing_to_update() {
        let env = TestEnv::initialized();
        let id = env.add("Static", "", "body");

        env.cmd()
            .args(["edit", &id])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Nothing to update"));
    }

    #[test]
    fn test_rm() {
        let env = TestEnv::initialized();
        let keep = env.add("Keep", "", "a");
        let gone = env.add("Gone", "", "b");

        env.cmd()
            .args(["rm", &gone])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Deleted note {}", gone)));

        env.cmd()
            .arg("ls")
            .assert()
            .success()
            .stdout(predicate::str::contains(keep.as_str()))
            .stdout(predicate::str::contains("Gone").not());
    }

    #[test]
    fn test_rm_missing_reports_and_fails() {
        let env = TestEnv::initialized();
        let id = env.add("Survivor", "", "a");

        env.cmd()
            .args(["rm", "missing"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Note missing not found"));

        env.cmd()
            .arg("ls")
            .assert()
            .success()
            .stdout(predicate::str::contains(id.as_str()));
    }
}

mod filter_tests {
    use super::*;

    #[test]
    fn test_ls_preserves_insertion_order() {
        let env = TestEnv::initialized();
        env.add("Zebra", "", "");
        env.add("Apple", "", "");

        let output = env.cmd().arg("ls").output().unwrap();
        let stdout = String::from_utf8(output.stdout).unwrap();
        let zebra = stdout.find("Zebra").unwrap();
        let apple = stdout.find("Apple").unwrap();
        assert!(zebra < apple);
    }

    #[test]
    fn test_ls_tags_require_all() {
        let env = TestEnv::initialized();
        env.add("Both", "x,y", "");
        env.add("OnlyX", "x", "");
        env.add("Neither", "", "");

        env.cmd()
            .args(["ls", "--tags", "x,y"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Both"))
            .stdout(predicate::str::contains("OnlyX").not())
            .stdout(predicate::str::contains("Neither").not());

        env.cmd()
            .args(["ls", "--tags", "x"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Both"))
            .stdout(predicate::str::contains("OnlyX"))
            .stdout(predicate::str::contains("Neither").not());
    }

    #[test]
    fn test_ls_title_case_insensitive() {
        let env = TestEnv::initialized();
        env.add("Grocery List", "", "");
        env.add("Reading", "", "");

        env.cmd()
            .args(["ls", "--title", "grocery"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Grocery List"))
            .stdout(predicate::str::contains("Reading").not());

        env.cmd()
            .args(["ls", "--title", "zzz"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn test_ls_unknown_tag_label() {
        let env = TestEnv::initialized();
        env.add("Memo", "known", "");

        env.cmd()
            .args(["ls", "--tags", "unknown"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("tag 'unknown'"));
    }
}

mod tag_tests {
    use super::*;

    #[test]
    fn test_inline_tags_are_reused() {
        let env = TestEnv::initialized();
        env.add("First", "shared", "");
        env.add("Second", "shared,solo", "");

        env.cmd()
            .arg("tags")
            .assert()
            .success()
            .stdout(predicate::str::contains("shared (2 notes)"))
            .stdout(predicate::str::contains("solo (1 note)"));
    }

    #[test]
    fn test_tag_add_then_use() {
        let env = TestEnv::initialized();

        env.cmd()
            .args(["tag", "add", "ideas"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Added tag"));

        env.cmd()
            .arg("tags")
            .assert()
            .success()
            .stdout(predicate::str::contains("ideas (0 notes)"));
    }

    #[test]
    fn test_tag_rename_shows_on_notes() {
        let env = TestEnv::initialized();
        let id = env.add("Memo", "draft", "");
        let tag = env.tag_id("draft");

        env.cmd()
            .args(["tag", "rename", &tag, "final"])
            .assert()
            .success();

        env.cmd()
            .args(["show", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("Tags: final"));

        env.cmd()
            .args(["ls", "--tags", "final"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Memo"));
    }

    #[test]
    fn test_tag_rm_hides_tag_from_notes() {
        let env = TestEnv::initialized();
        let id = env.add("Memo", "gone,kept", "");
        let tag = env.tag_id("gone");

        env.cmd()
            .args(["tag", "rm", &tag])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted tag"));

        env.cmd()
            .args(["show", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("Tags: kept"));
    }

    #[test]
    fn test_tag_rename_missing() {
        let env = TestEnv::initialized();

        env.cmd()
            .args(["tag", "rename", "nope", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Tag nope not found"));
    }
}

mod atomicity_tests {
    use super::*;

    #[test]
    fn test_add_with_blank_title_creates_no_tags() {
        let env = TestEnv::initialized();

        env.cmd()
            .args(["add", "--title", "  ", "--tags", "orphan", "--body", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("title cannot be empty"));

        env.cmd()
            .arg("tags")
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn test_edit_with_blank_title_creates_no_tags() {
        let env = TestEnv::initialized();
        let id = env.add("Memo", "old", "body");

        env.cmd()
            .args(["edit", &id, "--title", "", "--tags", "new"])
            .assert()
            .failure();

        env.cmd()
            .arg("tags")
            .assert()
            .success()
            .stdout(predicate::str::contains("old (1 note)"))
            .stdout(predicate::str::contains("new").not());
    }

    #[test]
    fn test_edit_missing_note_creates_no_tags() {
        let env = TestEnv::initialized();

        env.cmd()
            .args(["edit", "nope", "--tags", "new"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Note nope not found"));

        env.cmd()
            .arg("tags")
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn test_edit_tags_only() {
        let env = TestEnv::initialized();
        let id = env.add("Memo", "old", "body");

        env.cmd()
            .args(["edit", &id, "--tags", "new"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Updated tags"));

        env.cmd()
            .args(["show", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("Tags: new"))
            .stdout(predicate::str::contains("body"));
    }
}

mod tag_label_tests {
    use super::*;

    #[test]
    fn test_tag_add_trims_label() {
        let env = TestEnv::initialized();

        env.cmd()
            .args(["tag", "add", "  padded  "])
            .assert()
            .success()
            .stdout(predicate::str::contains("(padded)"));
    }

    #[test]
    fn test_tag_rename_rejects_blank_label() {
        let env = TestEnv::initialized();
        env.add("Memo", "keep", "");
        let tag = env.tag_id("keep");

        env.cmd()
            .args(["tag", "rename", &tag, "   "])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Tag label cannot be empty"));

        env.cmd()
            .arg("tags")
            .assert()
            .success()
            .stdout(predicate::str::contains("keep (1 note)"));
    }

    #[test]
    fn test_tag_commands_report_resolved_id() {
        let env = TestEnv::initialized();
        env.add("Memo", "draft", "");
        let tag = env.tag_id("draft");

        env.cmd()
            .args(["tag", "rename", &tag[..8], "final"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Renamed tag {} to final", tag)));

        env.cmd()
            .args(["tag", "rm", &tag[..8]])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Deleted tag {}", tag)));
    }
}

mod json_tests {
    use super::*;
    use serde_json::Value;

    fn json_output(env: &TestEnv, args: &[&str]) -> Value {
        let output = env.cmd().args(args).output().unwrap();
        assert!(output.status.success(), "command failed: {:?}", output);
        serde_json::from_slice(&output.stdout).unwrap()
    }

    #[test]
    fn test_ls_json() {
        let env = TestEnv::initialized();
        let id = env.add("Grocery List", "home", "milk");
        env.add("Other", "", "");

        let notes = json_output(&env, &["ls", "--json", "--tags", "home"]);

        let notes = notes.as_array().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["id"], id.as_str());
        assert_eq!(notes[0]["title"], "Grocery List");
        assert_eq!(notes[0]["body_preview"], "milk");
        assert_eq!(notes[0]["tags"][0]["label"], "home");
    }

    #[test]
    fn test_show_json() {
        let env = TestEnv::initialized();
        let id = env.add("Memo", "a,b", "full body");

        let note = json_output(&env, &["show", &id, "--json"]);

        assert_eq!(note["id"], id.as_str());
        assert_eq!(note["markdown"], "full body");
        assert_eq!(note["tags"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_tags_json() {
        let env = TestEnv::initialized();
        env.add("One", "shared", "");
        env.add("Two", "shared", "");

        let tags = json_output(&env, &["tags", "--json"]);

        assert_eq!(tags[0]["tag"]["label"], "shared");
        assert_eq!(tags[0]["count"], 2);
    }
}

//! End-to-end tests driving the `pb` binary against a scratch data directory

use std::path::PathBuf;

use assert_cmd::{Command, cargo_bin_cmd};
use predicates::prelude::PredicateBooleanExt;
use predicates::prelude::predicate;
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    fn state_file(&self) -> PathBuf {
        self.data_dir().join("papers.json")
    }

    fn pb(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("pb");
        cmd.current_dir(self.dir.path())
            .env("PAPER_BARTENDER_DATA_DIR", self.data_dir())
            .env("HOME", self.dir.path())
            .env("XDG_DATA_HOME", self.dir.path().join("share"))
            .env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .env("NO_COLOR", "1")
            .env_remove("ANTHROPIC_API_KEY")
            .env_remove("RUST_LOG");
        cmd
    }

    fn add_paper(&self, name: &str, deadline: &str) {
        self.pb()
            .args(["add", "paper", name, "--deadline", deadline])
            .assert()
            .success();
    }
}

mod help {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        Sandbox::new()
            .pb()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"))
            .stdout(predicate::str::contains("decompose"))
            .stdout(predicate::str::contains("today"));
    }

    #[test]
    fn test_version() {
        Sandbox::new()
            .pb()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("pb"));
    }
}

mod today {
    use super::*;

    #[test]
    fn test_empty_today() {
        Sandbox::new()
            .pb()
            .arg("today")
            .assert()
            .success()
            .stdout(predicate::str::contains("No tasks scheduled for today"));
    }

    #[test]
    fn test_default_command_is_today() {
        Sandbox::new()
            .pb()
            .assert()
            .success()
            .stdout(predicate::str::contains("No tasks scheduled for today"));
    }

    #[test]
    fn test_all_with_no_tasks() {
        let sandbox = Sandbox::new();
        sandbox.add_paper("X", "2099-06-01");
        sandbox
            .pb()
            .args(["today", "--all", "--paper", "X"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No pending tasks"));
    }

    #[test]
    fn test_unknown_paper_filter() {
        Sandbox::new()
            .pb()
            .args(["today", "--paper", "Nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Paper \"Nope\" not found"));
    }
}

mod papers {
    use super::*;

    #[test]
    fn test_add_and_list_papers() {
        let sandbox = Sandbox::new();
        sandbox
            .pb()
            .args(["add", "paper", "Transformers", "-d", "2099-06-01", "-c", "NeurIPS"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Added paper \"Transformers\""));

        sandbox
            .pb()
            .args(["list", "papers"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Transformers"))
            .stdout(predicate::str::contains("2099-06-01"))
            .stdout(predicate::str::contains("NeurIPS"));

        let state: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(sandbox.state_file()).unwrap()).unwrap();
        assert_eq!(state["version"], 1);
    }

    #[test]
    fn test_list_papers_empty() {
        Sandbox::new()
            .pb()
            .args(["list", "papers"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No papers yet"));
    }

    #[test]
    fn test_duplicate_paper_rejected() {
        let sandbox = Sandbox::new();
        sandbox.add_paper("X", "2099-06-01");
        sandbox
            .pb()
            .args(["add", "paper", "X", "--deadline", "2099-07-01"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_invalid_deadline_rejected() {
        let sandbox = Sandbox::new();
        sandbox
            .pb()
            .args(["add", "paper", "X", "--deadline", "someday"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid date 'someday'"));
        assert!(!sandbox.state_file().exists());
    }

    #[test]
    fn test_archive_hides_paper() {
        let sandbox = Sandbox::new();
        sandbox.add_paper("Old", "2099-06-01");
        sandbox.add_paper("New", "2099-07-01");
        sandbox.pb().args(["archive", "Old"]).assert().success();

        sandbox
            .pb()
            .args(["list", "papers"])
            .assert()
            .success()
            .stdout(predicate::str::contains("New"))
            .stdout(predicate::str::contains("Old").not());

        sandbox
            .pb()
            .args(["list", "papers", "--archived"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[archived]"));
    }
}

mod milestones {
    use super::*;

    #[test]
    fn test_add_and_list_milestones() {
        let sandbox = Sandbox::new();
        sandbox.add_paper("X", "2099-06-01");
        sandbox
            .pb()
            .args(["add", "milestone", "X", "finish draft", "--due", "2099-05-20", "-p", "5"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Added milestone"));

        sandbox
            .pb()
            .args(["list", "milestones", "X"])
            .assert()
            .success()
            .stdout(predicate::str::contains("finish draft"))
            .stdout(predicate::str::contains("P5"))
            .stdout(predicate::str::contains("not decomposed"));
    }

    #[test]
    fn test_milestone_after_deadline_warns() {
        let sandbox = Sandbox::new();
        sandbox.add_paper("X", "2099-06-01");
        sandbox
            .pb()
            .args(["add", "milestone", "X", "camera ready", "--due", "2099-07-01"])
            .assert()
            .success()
            .stdout(predicate::str::contains("after the paper deadline"));
    }

    #[test]
    fn test_milestone_for_missing_paper() {
        Sandbox::new()
            .pb()
            .args(["add", "milestone", "Nope", "draft", "--due", "tomorrow"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn test_priority_out_of_range() {
        let sandbox = Sandbox::new();
        sandbox.add_paper("X", "2099-06-01");
        sandbox
            .pb()
            .args(["add", "milestone", "X", "draft", "--due", "tomorrow", "--priority", "0"])
            .assert()
            .failure();
    }

    #[test]
    fn test_complete_unknown_milestone() {
        Sandbox::new()
            .pb()
            .args(["complete", "milestone-ffffffff"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    }
}

mod decompose {
    use super::*;

    #[test]
    fn test_decompose_missing_paper() {
        Sandbox::new()
            .pb()
            .args(["decompose", "Nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Paper \"Nope\" not found"));
    }

    #[test]
    fn test_decompose_requires_api_key() {
        let sandbox = Sandbox::new();
        sandbox.add_paper("X", "2099-06-01");
        sandbox
            .pb()
            .args(["decompose", "X", "--dry-run"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("ANTHROPIC_API_KEY"));
    }
}

mod tasks {
    use super::*;

    #[test]
    fn test_done_unknown_task() {
        Sandbox::new()
            .pb()
            .args(["done", "task-ffffffff"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    }
}

mod store {
    use super::*;

    #[test]
    fn test_corrupt_state_is_reported() {
        let sandbox = Sandbox::new();
        std::fs::create_dir_all(sandbox.data_dir()).unwrap();
        std::fs::write(sandbox.state_file(), "{ not json").unwrap();

        sandbox
            .pb()
            .args(["list", "papers"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("corrupt").or(predicate::str::contains("Corrupt")));
        assert_eq!(std::fs::read_to_string(sandbox.state_file()).unwrap(), "{ not json");
    }

    #[test]
    fn test_second_save_creates_backup() {
        let sandbox = Sandbox::new();
        sandbox.add_paper("A", "2099-06-01");
        let first = std::fs::read_to_string(sandbox.state_file()).unwrap();
        sandbox.add_paper("B", "2099-07-01");

        let backup = sandbox.data_dir().join("papers.json.bak");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), first);
    }
}

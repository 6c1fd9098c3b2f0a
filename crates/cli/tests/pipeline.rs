use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const MAILBOX: &str = "\
From alice@example.org Sun Mar 31 23:30:00 1996
From: Alice <alice@example.org>
To: list@lists.example.org
Subject: Plans
Date: Sun, 31 Mar 1996 23:30:00 +0000
Message-ID: <1@example.org>

Kickoff. Mail alice@example.org with questions.

From bob@example.net Mon Apr  1 10:00:00 1996
From: Bob <bob@example.net>
Subject: Re: Plans
Date: Mon, 1 Apr 1996 10:00:00 +0000
Message-ID: <2@example.org>
In-Reply-To: <1@example.org>

Sounds good.

From carol@example.com Mon Apr  1 11:00:00 1996
From: Carol <carol@example.com>
Subject: Re: Plans
Date: sometime after lunch
Message-ID: <3@example.org>
In-Reply-To: <2@example.org>

Agreed.

From ghost@example.com Tue Apr  2 09:00:00 1996
From: Ghost <ghost@example.com>
Subject: Lost
Date: Tue, 2 Apr 1996 09:00:00 +0000
Message-ID: <4@example.org>
In-Reply-To: <missing@example.org>

Where did the parent go?

From loop-a Wed Apr  3 09:00:00 1996
From: Dan <dan@example.com>
Subject: Loop A
Message-ID: <5@example.org>
In-Reply-To: <6@example.org>

a

From loop-b Wed Apr  3 09:00:00 1996
From: Dan <dan@example.com>
Subject: Loop B
Message-ID: <6@example.org>
In-Reply-To: <5@example.org>

b

From junk Wed Apr  3 10:00:00 1996
garbage without any headers
";

struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("list.mbox"), MAILBOX).unwrap();
        Self { temp }
    }

    fn root(&self) -> &Path {
        self.temp.path()
    }

    #[allow(deprecated)]
    fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("list-archive").expect("binary");
        cmd.current_dir(self.root()).env_remove("RUST_LOG");
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cli().arg("--json").args(args).output().expect("command run");
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("valid json")
    }
}

fn read_tree(root: &Path) -> BTreeMap<String, String> {
    fn walk(dir: &Path, root: &Path, out: &mut BTreeMap<String, String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                let key = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
                out.insert(key, fs::read_to_string(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

#[test]
fn run_ingests_resolves_and_renders() {
    let ws = Workspace::new();
    let summary = ws.json(&["run", "list.mbox", "--out", "site"]);

    assert_eq!(summary["ingest"]["blocks"], 7);
    assert_eq!(summary["ingest"]["inserted"], 6);
    assert_eq!(summary["ingest"]["skipped"], 1);
    assert_eq!(summary["ingest"]["degraded_dates"], 3);

    assert_eq!(summary["resolve"]["messages"], 6);
    assert_eq!(summary["resolve"]["threads"], 4);
    assert_eq!(summary["resolve"]["dangling"], 1);
    assert_eq!(summary["resolve"]["ambiguous"], 0);
    assert_eq!(summary["resolve"]["forced_roots"], 2);

    assert_eq!(summary["render"]["documents"], 16);
    assert_eq!(summary["render"]["failures"], Value::Array(vec![]));

    let site = read_tree(&ws.root().join("site"));
    for key in [
        "threads/1996/03.md",
        "threads/1996/04.md",
        "threads/1996/unknown.md",
        "authors/index.md",
        "authors/da___n_at_example_com.md",
        "years/1996.md",
    ] {
        assert!(site.contains_key(key), "missing {key}");
    }
    assert_eq!(site.keys().filter(|k| k.starts_with("archive/")).count(), 6);

    let march = &site["threads/1996/03.md"];
    assert!(march.contains("### Plans\n"));
    assert!(march.contains("\n  + 1996-04-01 ("));
    assert!(march.contains("\n    + (Unknown Date) (sometime after lunch) - "));

    let april = &site["threads/1996/04.md"];
    assert!(april.contains("+ _Unknown thread root_\n  + 1996-04-02"));

    let index = &site["authors/index.md"];
    assert!(index.contains("(/authors/da___n_at_example_com/) - _2 posts_"));

    for (key, text) in &site {
        for raw in ["alice@example.org", "bob@example.net", "carol@example.com", "dan@example.com"] {
            assert!(!text.contains(raw), "{key} leaks {raw}");
        }
    }
}

#[test]
fn rerun_is_idempotent() {
    let ws = Workspace::new();
    ws.json(&["run", "list.mbox", "--out", "site"]);
    let first = read_tree(&ws.root().join("site"));

    let again = ws.json(&["run", "list.mbox", "--out", "site"]);
    assert_eq!(again["ingest"]["inserted"], 0);
    assert_eq!(again["ingest"]["duplicates"], 6);
    assert_eq!(again["resolve"]["threads"], 4);

    assert_eq!(read_tree(&ws.root().join("site")), first);
}

#[test]
fn stages_can_run_separately() {
    let ws = Workspace::new();
    let ingest = ws.json(&["ingest", "list.mbox"]);
    assert_eq!(ingest["inserted"], 6);

    let stats = ws.json(&["stats"]);
    assert_eq!(stats["messages"], 6);
    assert_eq!(stats["resolved"], 0);

    ws.cli()
        .args(["render", "--out", "site"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not fully resolved"));

    let resolve = ws.json(&["resolve"]);
    assert_eq!(resolve["threads"], 4);

    let stats = ws.json(&["stats"]);
    assert_eq!(stats["resolved"], 6);
    assert_eq!(stats["no_parent"], 3);
    assert_eq!(stats["threads"], 4);
    assert_eq!(stats["participants"], 5);

    let render = ws.json(&["render", "--out", "site"]);
    assert_eq!(render["documents"], 16);
}

#[test]
fn config_file_supplies_store_and_output() {
    let ws = Workspace::new();
    fs::write(
        ws.root().join("archive.toml"),
        "[store]\ndir = \"state\"\n\n[render]\noutput_dir = \"public\"\n",
    )
    .unwrap();

    ws.cli()
        .args(["run", "list.mbox"])
        .assert()
        .success()
        .stdout(predicate::str::contains("render: 16 documents"));

    assert!(ws.root().join("state/messages.json").is_file());
    assert!(ws.root().join("public/authors/index.md").is_file());
}

#[test]
fn unknown_config_keys_fail_fast() {
    let ws = Workspace::new();
    fs::write(ws.root().join("archive.toml"), "[store]\nfolder = \"x\"\n").unwrap();

    ws.cli()
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn render_requires_an_output_directory() {
    let ws = Workspace::new();
    ws.cli()
        .arg("render")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No output directory"));
}

#[test]
fn reset_empties_the_store() {
    let ws = Workspace::new();
    ws.json(&["ingest", "list.mbox"]);
    ws.cli().arg("reset").assert().success();

    let stats = ws.json(&["stats"]);
    assert_eq!(stats["messages"], 0);
    assert!(!ws.root().join(".list-archive/bodies").exists());
}

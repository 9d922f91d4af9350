use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            temp: TempDir::new().expect("temp dir"),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    fn db_path(&self) -> PathBuf {
        self.path("dialdesk.sqlite3")
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("dialdesk");
        cmd.env("XDG_CONFIG_HOME", self.path("config"))
            .env_remove("RUST_LOG")
            .args(["--db-path", self.db_path().to_str().expect("db path")]);
        cmd
    }

    fn run(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).output().expect("run command");
        assert!(output.status.success(), "command failed: {:?}", output);
        String::from_utf8(output.stdout).expect("utf8")
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("run command");
        assert!(output.status.success(), "command failed: {:?}", output);
        serde_json::from_slice(&output.stdout).expect("parse json")
    }

    fn exit_code(&self, args: &[&str]) -> Option<i32> {
        self.cmd().args(args).output().expect("run command").status.code()
    }
}

fn create_asterisk_db(path: &Path) {
    let conn = Connection::open(path).expect("open source db");
    conn.execute_batch(
        "CREATE TABLE cdr (
            calldate TEXT NOT NULL DEFAULT '',
            clid TEXT NOT NULL DEFAULT '',
            src TEXT NOT NULL DEFAULT '',
            dst TEXT NOT NULL DEFAULT '',
            dcontext TEXT NOT NULL DEFAULT '',
            duration INTEGER NOT NULL DEFAULT 0,
            billsec INTEGER NOT NULL DEFAULT 0,
            disposition TEXT NOT NULL DEFAULT '',
            uniqueid TEXT NOT NULL DEFAULT '',
            recordingfile TEXT
        );",
    )
    .expect("create cdr table");
    let rows = [
        ("2024-01-10 09:00:00", "1704877200.1", "555123456", "100", 61, "ANSWERED"),
        ("2024-01-11 10:30:00", "1704967800.2", "100", "0555 123 456", 15, "ANSWERED"),
        ("2024-01-12 16:45:10", "1705077910.3", "777000111", "100", 0, "NO ANSWER"),
    ];
    for (calldate, uniqueid, src, dst, duration, disposition) in rows {
        conn.execute(
            "INSERT INTO cdr (calldate, clid, src, dst, duration, billsec, disposition, uniqueid)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7);",
            params![calldate, src, src, dst, duration, disposition, uniqueid],
        )
        .expect("insert cdr");
    }
}

fn write_private(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write file");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).expect("chmod");
    }
}

#[test]
fn cli_import_cdr_is_idempotent() {
    let ws = Workspace::new();
    let source = ws.path("asterisk.db");
    create_asterisk_db(&source);
    let source = source.to_str().expect("source path");

    let first = ws.run_json(&["import", "cdr", "--source", source, "--all"]);
    assert_eq!(first["imported"], 3);
    assert_eq!(first["filter"]["kind"], "all");

    let second = ws.run_json(&["import", "cdr", "--source", source]);
    assert_eq!(second["filter"]["kind"], "after_high_water_mark");
    assert_eq!(second["imported"], 0);

    let calls = ws.run_json(&["calls", "list", "--number", "+555 123 456"]);
    let calls = calls.as_array().expect("array");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0]["uniqueid"], "1704967800.2");
    assert_eq!(calls[1]["uniqueid"], "1704877200.1");

    let text = ws.run(&["calls", "list"]);
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn cli_dry_run_writes_nothing() {
    let ws = Workspace::new();
    let source = ws.path("asterisk.db");
    create_asterisk_db(&source);

    let report = ws.run_json(&[
        "import",
        "cdr",
        "--source",
        source.to_str().expect("source path"),
        "--all",
        "--dry-run",
    ]);
    assert_eq!(report["new_rows"], 3);
    assert_eq!(report["imported"], 0);

    let calls = ws.run_json(&["calls", "list"]);
    assert!(calls.as_array().expect("array").is_empty());
}

#[test]
fn cli_import_reads_source_from_config() {
    let ws = Workspace::new();
    let source = ws.path("asterisk.db");
    create_asterisk_db(&source);
    let config = ws.path("dialdesk.toml");
    write_private(
        &config,
        &format!(
            "[import]\nchunk_size = 2\n[source]\npath = \"{}\"\n",
            source.display()
        ),
    );

    let report = ws.run_json(&[
        "--config",
        config.to_str().expect("config path"),
        "import",
        "cdr",
        "--all",
    ]);
    assert_eq!(report["imported"], 3);
    assert_eq!(report["chunks"], 2);
}

#[test]
fn cli_missing_cdr_columns_is_a_precondition_failure() {
    let ws = Workspace::new();
    let source = ws.path("partial.db");
    let conn = Connection::open(&source).expect("open");
    conn.execute_batch("CREATE TABLE cdr (calldate TEXT, src TEXT);")
        .expect("create table");
    drop(conn);

    let output = ws
        .cmd()
        .args(["import", "cdr", "--source", source.to_str().expect("source path")])
        .output()
        .expect("run command");
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert_eq!(stderr.matches("import cdrs from").count(), 1, "{stderr}");
}

#[test]
fn cli_import_without_source_is_invalid_input() {
    let ws = Workspace::new();
    assert_eq!(ws.exit_code(&["import", "cdr"]), Some(3));
}

#[test]
fn cli_company_flow() {
    let ws = Workspace::new();
    let created = ws.run_json(&[
        "company",
        "add",
        "--code",
        "204566778",
        "--name",
        "Acme Logistics",
        "--contact",
        "Nino=+995 555 12 34 56",
        "--tender",
        "tender_no=T-17",
    ]);
    assert_eq!(created["identification_code"], "204566778");
    let id = created["id"].as_str().expect("id").to_string();

    let duplicate = ws.exit_code(&["company", "add", "--code", "204566778", "--name", "Other"]);
    assert_eq!(duplicate, Some(3));

    let edited = ws.run_json(&["company", "edit", "204566778", "--name", "Acme Freight"]);
    assert_eq!(edited["name"], "Acme Freight");
    assert_eq!(edited["tender"]["tender_no"], "T-17");

    let shown = ws.run_json(&["company", "show", &id]);
    assert_eq!(shown["contacts"][0]["person"], "Nino");

    let listed = ws.run_json(&["company", "list", "--search", "freight"]);
    assert_eq!(listed.as_array().expect("array").len(), 1);

    ws.run(&["company", "delete", &id]);
    assert_eq!(ws.exit_code(&["company", "show", &id]), Some(2));
}

#[test]
fn cli_import_companies_upserts_by_code() {
    let ws = Workspace::new();
    let sheet = ws.path("companies.json");
    fs::write(
        &sheet,
        r#"[
            {"Identification Code": "1001", "Company Name": "Acme", "Contact Person 1": "Nino", "Contact Phone 1": "555 1"},
            {"identificationCode": "1002", "companyName": "Globex", "tender_amount": 1200},
            {"companyName": "No code"}
        ]"#,
    )
    .expect("write sheet");
    let sheet = sheet.to_str().expect("sheet path");

    let report = ws.run_json(&["import", "companies", sheet]);
    assert_eq!(report["created"], 2);
    assert_eq!(report["skipped"], 1);

    let again = ws.run_json(&["import", "companies", sheet]);
    assert_eq!(again["updated"], 2);

    let globex = ws.run_json(&["company", "show", "1002"]);
    assert_eq!(globex["tender"]["tender_amount"], "1200");

    let out = ws.path("export/companies.json");
    let export = ws.run_json(&["export", "companies", "--out", out.to_str().expect("out")]);
    assert_eq!(export["count"], 2);
    let exported: Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("read export")).expect("json");
    assert_eq!(exported.as_array().expect("array").len(), 2);
}

#[test]
fn cli_match_against_imported_records() {
    let ws = Workspace::new();
    let source = ws.path("asterisk.db");
    create_asterisk_db(&source);
    let source = source.to_str().expect("source path");
    ws.run(&["import", "cdr", "--source", source, "--all"]);

    let callers = ws.path("callers.json");
    fs::write(
        &callers,
        r#"{"rows": [
            {"id": "row-1", "Caller Number": "555-123-456", "Call Duration": "01:01"},
            {"id": "row-2", "callerNumber": "anonymous"}
        ]}"#,
    )
    .expect("write callers");
    let callers = callers.to_str().expect("callers path");

    let matches = ws.run_json(&["match", callers]);
    let entries = matches.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["caller_id"], "row-1");
    let hits = entries[0]["matches"].as_array().expect("matches");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["uniqueid"], "1704967800.2");
    assert!(entries[1]["matches"].as_array().expect("matches").is_empty());

    let windowed = ws.run_json(&["match", callers, "--from", "2024-01-11", "--to", "2024-01-11"]);
    assert_eq!(windowed[0]["matches"].as_array().expect("matches").len(), 1);

    let live = ws.run_json(&["match", callers, "--live", "--source", source]);
    assert_eq!(live[0]["matches"].as_array().expect("matches").len(), 2);
}

#[test]
fn cli_callers_normalize_does_not_open_the_store() {
    let ws = Workspace::new();
    let callers = ws.path("callers.json");
    fs::write(
        &callers,
        r#"[{"Caller Name": "Nino", "calls": "3.0", "duration": "95"}, 7]"#,
    )
    .expect("write callers");

    let records = ws.run_json(&["callers", "normalize", callers.to_str().expect("path")]);
    let records = records.as_array().expect("array");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["caller_name"], "Nino");
    assert_eq!(records[0]["call_count"], 3);
    assert_eq!(records[0]["call_duration"], 95);
    assert!(!records[0]["id"].as_str().expect("id").is_empty());
    assert!(!ws.db_path().exists());
}

#[test]
fn cli_admin_users() {
    let ws = Workspace::new();
    let created = ws.run_json(&[
        "admin",
        "add",
        "--email",
        " Ops@Example.com ",
        "--password-hash",
        "$argon2id$stub",
    ]);
    assert_eq!(created["email"], "ops@example.com");
    assert!(created.get("password_hash").is_none());

    assert_eq!(
        ws.exit_code(&["admin", "add", "--email", "ops@example.com", "--password-hash", "x"]),
        Some(3)
    );
    ws.run(&["admin", "delete", "OPS@example.com"]);
    assert_eq!(ws.exit_code(&["admin", "delete", "ops@example.com"]), Some(2));
}

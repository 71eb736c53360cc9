//! CLI integration tests for ldap-rdbm.
//!
//! These tests cover argument parsing, help output, exit codes and the
//! offline commands that only need the schema documents.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;

/// Get a command for the ldap-rdbm binary.
fn cmd() -> Command {
    Command::cargo_bin("ldap-rdbm").unwrap()
}

const SCHEMA_JSON: &str = r#"{
    "attributeTypes": [
        {"names": ["jansEnabled"], "syntax": "1.3.6.1.4.1.1466.115.121.1.7"},
        {"names": ["jansRedirectURI"], "syntax": "1.3.6.1.4.1.1466.115.121.1.15", "multivalued": true},
        {"names": ["creationDate"], "syntax": "1.3.6.1.4.1.1466.115.121.1.24"},
        {"names": ["jansRevision"], "syntax": "1.3.6.1.4.1.1466.115.121.1.27"},
        {"names": ["displayName"], "syntax": "1.3.6.1.4.1.1466.115.121.1.15"}
    ]
}"#;

const SYNTAX_TYPES_JSON: &str = r#"{
    "1.3.6.1.4.1.1466.115.121.1.7": {"mysql": {"type": "SMALLINT"}, "pgsql": {"type": "SMALLINT"}},
    "1.3.6.1.4.1.1466.115.121.1.15": {"mysql": {"type": "VARCHAR", "size": 64}},
    "1.3.6.1.4.1.1466.115.121.1.24": {"mysql": {"type": "DATETIME(3)"}, "pgsql": {"type": "TIMESTAMP"}},
    "1.3.6.1.4.1.1466.115.121.1.27": {"mysql": {"type": "INT"}},
    "JSON": {"mysql": {"type": "JSON"}, "pgsql": {"type": "JSONB"}}
}"#;

/// Schema and mapping documents plus a config pointing at them.
struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new(backend: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("jans_schema.json"), SCHEMA_JSON).unwrap();
        std::fs::write(root.join("custom_schema.json"), r#"{"attributeTypes": []}"#).unwrap();
        std::fs::write(root.join("ldap_sql_data_type_mapping.json"), SYNTAX_TYPES_JSON).unwrap();
        std::fs::write(root.join("sql_data_types.json"), "{}").unwrap();
        std::fs::write(
            root.join("opendj_attributes_syntax.json"),
            r#"{"photo": "1.3.6.1.4.1.1466.115.121.1.28"}"#,
        )
        .unwrap();
        write_config(root, backend, root);
        Self { dir }
    }

    fn config(&self) -> String {
        self.dir.path().join("config.yaml").to_str().unwrap().to_string()
    }
}

fn write_config(dir: &Path, backend: &str, schema_dir: &Path) {
    let mut file = std::fs::File::create(dir.join("config.yaml")).unwrap();
    writeln!(file, "rdbm:").unwrap();
    writeln!(file, "  type: {}", backend).unwrap();
    writeln!(file, "  host: localhost").unwrap();
    writeln!(file, "  database: jansdb").unwrap();
    writeln!(file, "  user: jans").unwrap();
    writeln!(file, "schema:").unwrap();
    writeln!(file, "  schema_dir: {}", schema_dir.display()).unwrap();
    writeln!(file, "  static_dir: {}", schema_dir.display()).unwrap();
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("health-check"))
        .stdout(predicate::str::contains("reflect"))
        .stdout(predicate::str::contains("attr-type"))
        .stdout(predicate::str::contains("coerce"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("dn-exists"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("exec"));
}

#[test]
fn test_search_subcommand_help() {
    cmd()
        .args(["search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--filter"))
        .stdout(predicate::str::contains("--scope"))
        .stdout(predicate::str::contains("--all"));
}

#[test]
fn test_import_subcommand_help() {
    cmd()
        .args(["import", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force-reflect"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ldap-rdbm"));
}

#[test]
fn test_global_flag_defaults() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[default: config.yaml]"))
        .stdout(predicate::str::contains("[default: text]"))
        .stdout(predicate::str::contains("[default: info]"))
        .stdout(predicate::str::contains("--diagnostic-log"))
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_7() {
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "health-check"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_missing_required_fields_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "rdbm:").unwrap();
    writeln!(file, "  type: mysql").unwrap();
    writeln!(file, "  database: jansdb").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_missing_schema_documents_exits_with_code_3() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty");
    std::fs::create_dir(&empty).unwrap();
    write_config(dir.path(), "mysql", &empty);

    cmd()
        .args([
            "--config",
            dir.path().join("config.yaml").to_str().unwrap(),
            "attr-type",
            "jansEnabled",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("jans_schema.json"));
}

#[test]
fn test_invalid_scope_exits_with_code_1() {
    let fixture = Fixture::new("mysql");
    cmd()
        .args([
            "--config",
            &fixture.config(),
            "search",
            "--filter",
            "(objectClass=jansClnt)",
            "--scope",
            "children",
        ])
        .assert()
        .code(1);
}

// =============================================================================
// Offline Command Tests
// =============================================================================

#[test]
fn test_attr_type() {
    let fixture = Fixture::new("mysql");
    cmd()
        .args(["--config", &fixture.config(), "attr-type", "jansEnabled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.3.6.1.4.1.1466.115.121.1.7"))
        .stdout(predicate::str::contains("SMALLINT"));
}

#[test]
fn test_attr_type_json_output() {
    let fixture = Fixture::new("pgsql");
    cmd()
        .args([
            "--config",
            &fixture.config(),
            "--output-json",
            "attr-type",
            "jansRedirectURI",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""syntax": "JSON""#))
        .stdout(predicate::str::contains(r#""type": "JSONB""#));
}

#[test]
fn test_attr_type_falls_back_to_mysql_type() {
    let fixture = Fixture::new("pgsql");
    cmd()
        .args(["--config", &fixture.config(), "attr-type", "displayName"])
        .assert()
        .success()
        .stdout(predicate::str::contains("VARCHAR"));
}

#[test]
fn test_attr_type_unmapped_syntax_exits_with_code_3() {
    let fixture = Fixture::new("mysql");
    cmd()
        .args(["--config", &fixture.config(), "attr-type", "photo"])
        .assert()
        .code(3);
}

#[test]
fn test_coerce_timestamp() {
    let fixture = Fixture::new("mysql");
    cmd()
        .args([
            "--config",
            &fixture.config(),
            "coerce",
            "creationDate",
            "20230615120000.123Z",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""2023-06-15 12:00:00.12""#));
}

#[test]
fn test_coerce_boolean() {
    let fixture = Fixture::new("mysql");
    cmd()
        .args(["--config", &fixture.config(), "coerce", "jansEnabled", "Yes"])
        .assert()
        .success()
        .stdout(predicate::str::diff("1\n"));
}

#[test]
fn test_coerce_multivalued() {
    let fixture = Fixture::new("mysql");
    cmd()
        .args([
            "--config",
            &fixture.config(),
            "coerce",
            "jansRedirectURI",
            "https://a",
            "https://b",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"v":["https://a","https://b"]}"#));
}

#[test]
fn test_coerce_non_numeric_integer_exits_with_code_4() {
    let fixture = Fixture::new("mysql");
    cmd()
        .args(["--config", &fixture.config(), "coerce", "jansRevision", "abc"])
        .assert()
        .code(4);
}

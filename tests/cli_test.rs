//! CLI integration tests for the jsonapi-params binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jsonapi-params"));
    cmd.env_remove("JSONAPI_EXTENSIONS");
    cmd
}

fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const SINGLE_DOC: &str = r#"{"data":{"type":"users","attributes":{"name":"Lucas"}}}"#;
const BULK_DOC: &str = r#"{"data":[
    {"type":"users","attributes":{"name":"Lucas"}},
    {"type":"users","attributes":{"name":"Fran"}}
]}"#;
const BULK_HEADER: &str = r#"application/vnd.api+json; ext="bulk""#;

mod deserialize_command {
    use super::*;

    #[test]
    fn single_document() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", SINGLE_DOC);

        cmd()
            .args(["deserialize", doc.to_str().unwrap(), "--key", "user"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#""params":{"user":{"type":"users","name":"Lucas"}}"#,
            ))
            .stdout(predicate::str::contains(
                r#""pointers":{"name":"/data/attributes/name","type":"/data/type"}"#,
            ))
            .stdout(predicate::str::contains(r#""mode":"single""#));
    }

    #[test]
    fn bulk_document() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", BULK_DOC);

        cmd()
            .args([
                "deserialize",
                doc.to_str().unwrap(),
                "--content-type",
                BULK_HEADER,
                "--supported-ext",
                "bulk",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""mode":"bulk""#))
            .stdout(predicate::str::contains(
                r#"{"name":"/data/1/attributes/name","type":"/data/1/type"}"#,
            ));
    }

    #[test]
    fn bulk_support_from_env() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", BULK_DOC);

        cmd()
            .env("JSONAPI_EXTENSIONS", "bulk")
            .args([
                "deserialize",
                doc.to_str().unwrap(),
                "--content-type",
                BULK_HEADER,
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""mode":"bulk""#));
    }

    #[test]
    fn bulk_support_from_config_file() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", BULK_DOC);
        let config = write_temp_file(&dir, "config.json", r#"{"jsonapi_extensions":["bulk"]}"#);

        cmd()
            .args([
                "deserialize",
                doc.to_str().unwrap(),
                "--content-type",
                BULK_HEADER,
                "--config",
                config.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""mode":"bulk""#));
    }

    #[test]
    fn array_without_bulk_is_malformed() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", BULK_DOC);

        cmd()
            .args(["deserialize", doc.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("malformed document"));
    }

    #[test]
    fn missing_type_is_malformed() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", r#"{"data":{"attributes":{}}}"#);

        cmd()
            .args(["deserialize", doc.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("malformed resource at /data"));
    }

    #[test]
    fn no_payload_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", r#"{"meta":{}}"#);

        cmd()
            .args(["deserialize", doc.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#"{"mode":null,"params":{},"pointers":null}"#,
            ));
    }

    #[test]
    fn mapping_file() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", SINGLE_DOC);
        let mapping = write_temp_file(
            &dir,
            "mapping.json",
            r#"{"attributes":{"name":"first_name"}}"#,
        );

        cmd()
            .args([
                "deserialize",
                doc.to_str().unwrap(),
                "--mapping",
                mapping.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#""first_name":"/data/attributes/name""#,
            ));
    }

    #[test]
    fn invalid_mapping_key_format() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", SINGLE_DOC);
        let mapping = write_temp_file(&dir, "mapping.json", r#"{"key_format":"shout"}"#);

        cmd()
            .args([
                "deserialize",
                doc.to_str().unwrap(),
                "--mapping",
                mapping.to_str().unwrap(),
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown key format"));
    }

    #[test]
    fn missing_document() {
        cmd()
            .args(["deserialize", "/nonexistent/doc.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }
}

mod reconcile_command {
    use super::*;

    #[test]
    fn single_errors() {
        let dir = TempDir::new().unwrap();
        let errors = write_temp_file(
            &dir,
            "errors.json",
            r#"{"name":["Name can't be blank"],"base":"Record is locked"}"#,
        );
        let pointers = write_temp_file(
            &dir,
            "pointers.json",
            r#"{"name":"/data/attributes/name","type":"/data/type"}"#,
        );

        cmd()
            .args([
                "reconcile",
                errors.to_str().unwrap(),
                "--pointers",
                pointers.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#"{"detail":"Name can't be blank","title":"Invalid name","source":{"pointer":"/data/attributes/name"}}"#,
            ))
            .stdout(predicate::str::contains(
                r#"{"detail":"Record is locked","title":"Invalid base"}"#,
            ))
            .stdout(predicate::str::contains(r#""jsonapi":{"version":"1.0"}"#));
    }

    #[test]
    fn sparse_bulk_errors() {
        let dir = TempDir::new().unwrap();
        let errors = write_temp_file(&dir, "errors.json", r#"[{},{"name":"blank"},{}]"#);
        let pointers = write_temp_file(
            &dir,
            "pointers.json",
            r#"[{"name":"/data/0/attributes/name"},{"name":"/data/1/attributes/name"},{"name":"/data/2/attributes/name"}]"#,
        );

        cmd()
            .args([
                "reconcile",
                errors.to_str().unwrap(),
                "--pointers",
                pointers.to_str().unwrap(),
                "--bulk",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""pointer":"/data/1/attributes/name""#))
            .stdout(predicate::str::contains("/data/0/").not())
            .stdout(predicate::str::contains("/data/2/").not());
    }

    #[test]
    fn bulk_length_mismatch_exits_1() {
        let dir = TempDir::new().unwrap();
        let errors = write_temp_file(&dir, "errors.json", r#"[{"name":"blank"}]"#);
        let pointers = write_temp_file(&dir, "pointers.json", r#"[{},{}]"#);

        cmd()
            .args([
                "reconcile",
                errors.to_str().unwrap(),
                "--pointers",
                pointers.to_str().unwrap(),
                "--bulk",
            ])
            .assert()
            .code(1)
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("cannot align 1 error collection(s)"));
    }

    #[test]
    fn malformed_errors_exit_2() {
        let dir = TempDir::new().unwrap();
        let errors = write_temp_file(&dir, "errors.json", r#"{"name":42}"#);

        cmd()
            .args(["reconcile", errors.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid error collection"));
    }
}

mod negotiate_command {
    use super::*;

    #[test]
    fn content_type_with_supported_and_delivered() {
        cmd()
            .args([
                "negotiate",
                "--supported-ext",
                "bulk",
                "--deliver",
                "bulk,jsonpatch",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#"application/vnd.api+json; supported-ext=\"bulk\"; ext=\"bulk,jsonpatch\""#,
            ));
    }

    #[test]
    fn request_header_activation() {
        cmd()
            .args([
                "negotiate",
                "--supported-ext",
                "bulk",
                "--request-header",
                r#"application/vnd.api+json; ext="bulk,jsonpatch""#,
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""active":["bulk"]"#))
            .stdout(predicate::str::contains(r#""requested":["bulk","jsonpatch"]"#))
            .stdout(predicate::str::contains(r#""bulk":true"#));
    }

    #[test]
    fn no_extensions() {
        cmd()
            .args(["negotiate"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#"{"content_type":"application/vnd.api+json"}"#,
            ));
    }
}

mod logging {
    use super::*;

    #[test]
    fn json_log_format_flag() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", r#"{"meta":{}}"#);

        cmd()
            .env_remove("RUST_LOG")
            .env_remove("JSONAPI_PARAMS_LOG_FORMAT")
            .args(["--log-format", "json", "deserialize", doc.to_str().unwrap()])
            .assert()
            .success()
            .stderr(predicate::str::contains(r#""level":"WARN""#))
            .stderr(predicate::str::contains("no JSON:API payload was found"));
    }

    #[test]
    fn log_format_from_env() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", r#"{"meta":{}}"#);

        cmd()
            .env_remove("RUST_LOG")
            .env("JSONAPI_PARAMS_LOG_FORMAT", "json")
            .args(["deserialize", doc.to_str().unwrap()])
            .assert()
            .success()
            .stderr(predicate::str::contains(r#""level":"WARN""#));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        cmd()
            .args(["--log-format", "xml", "negotiate"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown log format"));
    }

    #[test]
    fn unsupported_extension_logged_during_deserialize() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", SINGLE_DOC);

        cmd()
            .env("RUST_LOG", "debug")
            .args([
                "deserialize",
                doc.to_str().unwrap(),
                "--content-type",
                r#"application/vnd.api+json; ext="jsonpatch""#,
                "--supported-ext",
                "bulk",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""mode":"single""#))
            .stderr(predicate::str::contains("requested extension is not supported"))
            .stderr(predicate::str::contains("jsonpatch"));
    }
}

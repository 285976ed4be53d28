//! CLI Tests
//!
//! Runs the `s3-safe-upload` binary with a cleared environment inside a
//! temp working directory, against a wiremock S3 endpoint where a remote is
//! needed.

#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cli(workdir: &Path) -> Command {
        let mut cmd = Command::cargo_bin("s3-safe-upload").unwrap();
        cmd.env_clear().current_dir(workdir);
        cmd
    }

    fn workdir_with_file(name: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(name), b"{\"backup\":true}").unwrap();
        dir
    }

    /// Run a blocking command without stalling the mock server
    async fn run(mut cmd: Command) -> assert_cmd::assert::Assert {
        tokio::task::spawn_blocking(move || cmd.assert())
            .await
            .unwrap()
    }

    fn with_store_env(cmd: &mut Command, server: &MockServer) {
        cmd.env("ENDPOINT_URL", server.uri())
            .env("ACCESS_KEY_ID", "test-access")
            .env("SECRET_KEY", "test-secret")
            .env("BUCKET_NAME", "backups");
    }

    // ========================================================================
    // TEST: Failures before any network call
    // ========================================================================

    #[test]
    fn test_help() {
        let dir = tempfile::tempdir().unwrap();
        cli(dir.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--strict-check"));
    }

    #[test]
    fn test_missing_configuration_exits_non_zero() {
        let dir = workdir_with_file("x.json");
        cli(dir.path())
            .arg("x.json")
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Missing configuration settings"));
    }

    #[test]
    fn test_missing_local_file_exits_non_zero() {
        let dir = tempfile::tempdir().unwrap();
        cli(dir.path())
            .env("ENDPOINT_URL", "http://127.0.0.1:1")
            .env("ACCESS_KEY_ID", "test-access")
            .env("SECRET_KEY", "test-secret")
            .env("BUCKET_NAME", "backups")
            .arg("missing.json")
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("File not found"));
    }

    #[test]
    fn test_missing_explicit_env_file_is_an_error() {
        let dir = workdir_with_file("x.json");
        cli(dir.path())
            .args(["--env-file", "does-not-exist.env", "x.json"])
            .assert()
            .failure();
    }

    #[test]
    fn test_yaml_unset_placeholder_is_a_missing_setting() {
        let dir = workdir_with_file("x.json");
        std::fs::write(
            dir.path().join("store.yaml"),
            "endpoint_url: http://127.0.0.1:1\n\
             access_key_id: test-access\n\
             secret_key: test-secret\n\
             bucket_name: ${BUCKET_NAME}\n",
        )
        .unwrap();

        cli(dir.path())
            .args(["--config", "store.yaml", "x.json"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Missing configuration settings: BUCKET_NAME"));
    }

    // ========================================================================
    // TEST: Remote flows
    // ========================================================================

    #[tokio::test]
    async fn test_safe_upload_succeeds_when_absent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/backups/x.json"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/backups/x.json"))
            .and(header("x-amz-acl", "private"))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"x-etag\""))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = workdir_with_file("x.json");
        let mut cmd = cli(dir.path());
        with_store_env(&mut cmd, &mock_server);
        cmd.arg("x.json");

        run(cmd).await.success();
    }

    #[tokio::test]
    async fn test_safe_upload_skip_exits_non_zero() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/backups/x.json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let dir = workdir_with_file("x.json");
        let mut cmd = cli(dir.path());
        with_store_env(&mut cmd, &mock_server);
        cmd.arg("x.json");

        run(cmd)
            .await
            .code(1)
            .stderr(predicate::str::contains("already exists"));
    }

    #[tokio::test]
    async fn test_exists_mode() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/backups/x.json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = workdir_with_file("x.json");
        let mut cmd = cli(dir.path());
        with_store_env(&mut cmd, &mock_server);
        cmd.args(["--mode", "exists", "x.json"]);

        run(cmd).await.success();
    }

    #[tokio::test]
    async fn test_strict_check_does_not_upload_on_forbidden() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/backups/x.json"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let dir = workdir_with_file("x.json");
        let mut cmd = cli(dir.path());
        with_store_env(&mut cmd, &mock_server);
        cmd.args(["--strict-check", "x.json"]);

        run(cmd).await.code(1);
    }

    #[tokio::test]
    async fn test_settings_loaded_from_dotenv_file() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/backups/x.json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = workdir_with_file("x.json");
        std::fs::write(
            dir.path().join(".env"),
            format!(
                "ENDPOINT_URL={}\nACCESS_KEY_ID=test-access\nSECRET_KEY=test-secret\nBUCKET_NAME=backups\n",
                mock_server.uri()
            ),
        )
        .unwrap();

        let mut cmd = cli(dir.path());
        cmd.args(["--mode", "upload", "x.json"]);

        run(cmd).await.success();
    }

    #[tokio::test]
    async fn test_settings_loaded_from_yaml_config() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/backups/x.json"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/backups/x.json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = workdir_with_file("x.json");
        std::fs::write(
            dir.path().join("store.yaml"),
            "endpoint_url: ${S3_ENDPOINT}\n\
             access_key_id: test-access\n\
             secret_key: test-secret\n\
             bucket_name: backups\n",
        )
        .unwrap();

        let mut cmd = cli(dir.path());
        cmd.env("S3_ENDPOINT", mock_server.uri())
            .args(["--config", "store.yaml", "--log-format", "json", "x.json"]);

        run(cmd).await.success();
    }
}

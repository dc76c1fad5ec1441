use crate::config::{Settings, SettingsError};
use crate::domain::domain_label;
use crate::export::{ExportError, write_yaml};
use crate::fetch::{FetchError, Fetcher};
use crate::output::{OutputError, resolve_output_dir};
use crate::page::PageJson;
use std::path::PathBuf;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("SettingsError: {0}")]
    SettingsError(#[from] SettingsError),
    #[error("OutputError: {0}")]
    OutputError(#[from] OutputError),
    #[error("FetchError: {0}")]
    FetchError(#[from] FetchError),
    #[error("ExportError: {0}")]
    ExportError(#[from] ExportError),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Outcome of one successful run.
#[derive(Debug)]
pub struct ScrapeReport {
    pub domain: String,
    pub path: PathBuf,
    pub scripts: usize,
    pub fragments: usize,
}

/// Fetches `url`, collects the JSON embedded in its scripts and writes
/// it as YAML under `<output root>/<domain>/`. Any failure aborts the run;
/// directories created before the failure are left in place.
pub fn run(url: &str, settings: &Settings) -> Result<ScrapeReport> {
    let domain = domain_label(url);
    let output_dir = resolve_output_dir(&settings.output_root()?, &domain)?;

    info!(url, domain = %domain, "fetching page");

    let fetcher = Fetcher::new(settings.timeout(), settings.retries, settings.backoff())?;
    let html = fetcher.fetch(url)?;

    let page = PageJson::from_html(&html, settings.scan);
    info!(
        scripts = page.scripts,
        fragments = page.fragments.len(),
        "collected JSON fragments"
    );

    let path = write_yaml(&page.fragments, &output_dir, &domain, local_now())?;

    Ok(ScrapeReport {
        domain,
        path,
        scripts: page.scripts,
        fragments: page.fragments.len(),
    })
}

fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|e| {
        warn!(error = %e, "local UTC offset unknown, timestamping in UTC");
        OffsetDateTime::now_utc()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ScanMode;
    use crate::test_server;
    use serde_json::{Value, json};

    fn settings(root: &std::path::Path) -> Settings {
        Settings {
            output_root: Some(root.to_path_buf()),
            timeout_secs: 5,
            retries: 0,
            backoff_ms: 1,
            scan: ScanMode::Flat,
        }
    }

    fn read_yaml(path: &std::path::Path) -> Vec<Value> {
        serde_yaml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn single_script_page_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let url = test_server::serve_once(
            "200 OK",
            r#"<html><head><script>var x = {"a": 1, "b": "two"};</script></head></html>"#,
        );

        let report = run(&url, &settings(tmp.path())).unwrap();

        assert_eq!(report.domain, "127_0_0_1");
        assert_eq!((report.scripts, report.fragments), (1, 1));
        let domain_dir = std::fs::canonicalize(tmp.path().join("127_0_0_1")).unwrap();
        assert!(report.path.starts_with(domain_dir));

        let name = report.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("127_0_0_1_api_data_"));
        assert!(name.ends_with(".yaml"));

        let decoded = read_yaml(&report.path);
        assert_eq!(decoded, vec![json!({"a": 1, "b": "two"})]);
        let keys: Vec<&String> = decoded[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn page_without_scripts_still_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let url =
            test_server::serve_once("200 OK", "<html><body><h1>No scripts</h1></body></html>");

        let report = run(&url, &settings(tmp.path())).unwrap();

        assert_eq!((report.scripts, report.fragments), (0, 0));
        assert!(read_yaml(&report.path).is_empty());
    }

    #[test]
    fn error_page_body_is_still_scanned() {
        let tmp = tempfile::tempdir().unwrap();
        let url = test_server::serve_once(
            "500 Internal Server Error",
            r#"<script>report({"code": 500});</script>"#,
        );

        let report = run(&url, &settings(tmp.path())).unwrap();

        assert_eq!(read_yaml(&report.path), vec![json!({"code": 500})]);
    }

    #[test]
    fn network_failure_aborts_after_creating_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let url = test_server::unreachable_url();

        let err = run(&url, &settings(tmp.path())).unwrap_err();

        assert!(matches!(err, ScrapeError::FetchError(_)));
        assert!(tmp.path().join("127_0_0_1").is_dir());
    }

    #[test]
    fn malformed_url_uses_default_domain_directory() {
        let tmp = tempfile::tempdir().unwrap();

        let err = run("not a url", &settings(tmp.path())).unwrap_err();

        assert!(matches!(err, ScrapeError::FetchError(_)));
        assert!(tmp.path().join(crate::domain::DEFAULT_DOMAIN).is_dir());
    }
}

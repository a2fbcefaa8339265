fn main() {
    println!("Run `cargo test -p sitedeploy-wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use sitedeploy_protocol::{
        CreateReleaseRequest, CreateVersionRequest, ErrorEnvelope, ListReleasesResponse,
        PopulateFilesRequest, PopulateFilesResponse, ReleaseResource, ReleaseType, SiteResource,
        TrailingSlashBehavior, UpdateVersionStatusRequest, VersionResource, VersionStatus,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  wire: {fixture}\n  Rust: {reserialized}"
        );
        parsed
    }

    // --- Requests ---

    #[test]
    fn fixture_create_version_request() {
        let req: CreateVersionRequest = roundtrip_test("create_version_request.json");
        let config = req.config.unwrap();
        assert!(config.clean_urls);
        assert_eq!(
            config.trailing_slash_behavior,
            Some(TrailingSlashBehavior::Remove)
        );
        assert_eq!(config.rewrites.len(), 2);
        assert_eq!(config.rewrites[0].run.as_ref().unwrap().service_id, "api");
        assert_eq!(config.rewrites[1].path.as_deref(), Some("/index.html"));
    }

    #[test]
    fn fixture_populate_files_request() {
        let req: PopulateFilesRequest = roundtrip_test("populate_files_request.json");
        assert_eq!(req.files.len(), 2);
        assert!(req.files.keys().all(|k| k.starts_with('/')));
    }

    #[test]
    fn fixture_update_version_status_request() {
        let req: UpdateVersionStatusRequest = roundtrip_test("update_version_status_request.json");
        assert_eq!(req.status, VersionStatus::Finalized);
    }

    #[test]
    fn fixture_create_release_request() {
        let req: CreateReleaseRequest = roundtrip_test("create_release_request.json");
        assert_eq!(req.message.as_deref(), Some("Deploy from CI"));
    }

    // --- Responses ---

    #[test]
    fn fixture_populate_files_response() {
        let resp: PopulateFilesResponse = roundtrip_test("populate_files_response.json");
        assert_eq!(resp.upload_required_hashes.len(), 1);
        assert!(resp.upload_url.unwrap().ends_with("/files"));
    }

    #[test]
    fn fixture_version() {
        let version: VersionResource = roundtrip_test("version.json");
        assert_eq!(version.status, VersionStatus::Finalized);
        assert_eq!(version.file_count.as_deref(), Some("42"));
        assert!(version.create_time.unwrap() < version.finalize_time.unwrap());
    }

    #[test]
    fn fixture_release() {
        let release: ReleaseResource = roundtrip_test("release.json");
        assert_eq!(release.version_name(), Some("sites/blog/versions/4f2c1e"));
        assert_eq!(release.release_type, Some(ReleaseType::Deploy));
    }

    #[test]
    fn fixture_list_releases() {
        let page: ListReleasesResponse = roundtrip_test("list_releases.json");
        assert_eq!(page.releases.len(), 3);
        assert_eq!(page.releases[1].release_type, Some(ReleaseType::SiteDisable));
        assert!(page.releases[1].version_name().is_none());
        assert_eq!(page.next_page_token.as_deref(), Some("CgwIhLPasQYQwJ6NOg"));
    }

    #[test]
    fn fixture_site() {
        let site: SiteResource = roundtrip_test("site.json");
        assert_eq!(site.default_url.as_deref(), Some("https://blog.web.app"));
    }

    #[test]
    fn fixture_error_envelope() {
        let env: ErrorEnvelope = roundtrip_test("error_envelope.json");
        assert_eq!(env.error.code, 400);
        assert_eq!(env.error.status.as_deref(), Some("INVALID_ARGUMENT"));
    }

    #[test]
    fn all_fixtures_are_covered() {
        let mut names: Vec<String> = fs::read_dir(fixtures_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "create_release_request.json",
                "create_version_request.json",
                "error_envelope.json",
                "list_releases.json",
                "populate_files_request.json",
                "populate_files_response.json",
                "release.json",
                "site.json",
                "update_version_status_request.json",
                "version.json",
            ]
        );
    }
}

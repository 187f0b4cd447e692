use cm360_sdk::{CampaignManagerClient, Connection, Error, ImpersonationChain};

#[test]
fn chain_from_single_account() {
    let chain = ImpersonationChain::from("reports@project.iam.gserviceaccount.com");

    assert_eq!(
        chain.target(),
        Some("reports@project.iam.gserviceaccount.com")
    );
    assert!(chain.delegates().is_empty());
}

#[test]
fn chain_splits_delegates_and_target() {
    let chain = ImpersonationChain::from(vec![
        "first@project.iam.gserviceaccount.com".to_string(),
        "second@project.iam.gserviceaccount.com".to_string(),
        "target@project.iam.gserviceaccount.com".to_string(),
    ]);

    assert_eq!(
        chain.target(),
        Some("target@project.iam.gserviceaccount.com")
    );
    assert_eq!(
        chain.delegates().to_vec(),
        vec![
            "first@project.iam.gserviceaccount.com".to_string(),
            "second@project.iam.gserviceaccount.com".to_string(),
        ]
    );
}

#[test]
fn empty_chain_fails_validation() {
    let result = CampaignManagerClient::builder()
        .impersonation_chain(Vec::<String>::new())
        .build();

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn default_connection_when_env_is_unset() {
    let connection = Connection::resolve("missing_conn_for_tests").unwrap();

    assert_eq!(connection.base_url, "https://dfareporting.googleapis.com");
    assert!(connection.access_token.is_none());
}

#[test]
fn connection_parsed_from_env() {
    std::env::set_var(
        "CM360_CONN_CLIENT_TEST_CONN",
        r#"{"base_url": "https://cm.example.com", "access_token": "tok-123"}"#,
    );

    let connection = Connection::resolve("client_test_conn").unwrap();

    assert_eq!(connection.base_url, "https://cm.example.com");
    assert_eq!(connection.access_token.as_deref(), Some("tok-123"));

    std::env::remove_var("CM360_CONN_CLIENT_TEST_CONN");
}

#[test]
fn connection_id_hyphens_map_to_env_underscores() {
    std::env::set_var(
        "CM360_CONN_HYPHENATED_TEST_CONN",
        r#"{"base_url": "https://hyphen.example.com"}"#,
    );

    let connection = Connection::resolve("hyphenated-test-conn").unwrap();

    assert_eq!(connection.base_url, "https://hyphen.example.com");

    std::env::remove_var("CM360_CONN_HYPHENATED_TEST_CONN");
}

#[test]
fn malformed_connection_is_rejected() {
    std::env::set_var("CM360_CONN_BROKEN_TEST_CONN", "not json");

    let result = Connection::resolve("broken_test_conn");

    assert!(matches!(result, Err(Error::Config(_))));

    std::env::remove_var("CM360_CONN_BROKEN_TEST_CONN");
}

#[test]
fn builder_defaults_build_without_environment() {
    let client = CampaignManagerClient::new("google_cloud_default");
    assert!(client.is_ok());
}

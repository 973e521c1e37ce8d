mod common;

// crates.io
use httpmock::prelude::*;
use time::Duration;
use url::Url;
// self
use common::mint_token;
use delegated_credential::{
	auth::Audience,
	error::TokenSourceError,
	source::{HttpTokenSource, HttpTokenSourceConfig, TokenResponseFormat, TokenSource},
};

fn endpoint(server: &MockServer) -> Url {
	Url::parse(&server.url("/token")).expect("Mock token endpoint should parse successfully.")
}

#[tokio::test]
async fn sends_audience_and_static_headers() {
	let server = MockServer::start_async().await;
	let token = mint_token(1_758_049_200, "headers");
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/token")
				.query_param("audience", "https://cognitiveservices.azure.com/.default")
				.header("metadata", "true");
			then.status(200)
				.header("content-type", "application/json")
				.body(format!(r#"{{"token":"{token}","expires_on":"1758049200"}}"#));
		})
		.await;
	let source = HttpTokenSource::builder(endpoint(&server))
		.audience_param("audience")
		.header("metadata", "true")
		.format(TokenResponseFormat::Json { field: "token".into() })
		.build()
		.expect("Token source should build.");
	let fetched =
		source.fetch(&Audience::COGNITIVE_SERVICES).await.expect("Host should issue a token.");

	assert_eq!(fetched.expose(), token);
	mock.assert_async().await;
}

#[tokio::test]
async fn plain_text_hosts_are_supported() {
	let server = MockServer::start_async().await;
	let token = mint_token(1_758_049_200, "plain");
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/token").query_param("resource", "https://cosmos.azure.com/");
			then.status(200).header("content-type", "text/plain").body(format!("{token}\n"));
		})
		.await;
	let mut config = HttpTokenSourceConfig::new(endpoint(&server));

	config.format = TokenResponseFormat::PlainText;

	let source = HttpTokenSource::from_config(config).expect("Config should build a source.");
	let fetched = source.fetch(&Audience::COSMOS_DB).await.expect("Host should issue a token.");

	assert_eq!(fetched.expose(), token);
	mock.assert_async().await;
}

#[tokio::test]
async fn error_statuses_carry_retry_hints() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/token");
			then.status(429).header("retry-after", "5");
		})
		.await;
	let source =
		HttpTokenSource::builder(endpoint(&server)).build().expect("Token source should build.");
	let err = source.fetch(&Audience::COSMOS_DB).await.expect_err("429 must be surfaced.");

	match err {
		TokenSourceError::Status { status, retry_after } => {
			assert_eq!(status, 429);
			assert_eq!(retry_after, Some(Duration::seconds(5)));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	mock.assert_async().await;
}

#[tokio::test]
async fn slow_hosts_time_out() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/token");
			then.status(200).delay(std::time::Duration::from_secs(2)).body("late");
		})
		.await;
	let source = HttpTokenSource::builder(endpoint(&server))
		.timeout(Duration::milliseconds(200))
		.build()
		.expect("Token source should build.");
	let err = source.fetch(&Audience::COSMOS_DB).await.expect_err("Slow host must time out.");

	assert!(
		matches!(err, TokenSourceError::Timeout { timeout } if timeout == Duration::milliseconds(200))
	);
}

#[tokio::test]
async fn missing_token_fields_are_reported() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/token");
			then.status(200).body(r#"{"expires_on":"1758049200"}"#);
		})
		.await;
	let source =
		HttpTokenSource::builder(endpoint(&server)).build().expect("Token source should build.");
	let err = source.fetch(&Audience::COSMOS_DB).await.expect_err("Missing token must fail.");

	assert!(matches!(err, TokenSourceError::EmptyToken));
}

#[tokio::test]
async fn unreachable_hosts_are_network_errors() {
	let endpoint =
		Url::parse("http://127.0.0.1:9/token").expect("Unreachable endpoint should parse.");
	let source = HttpTokenSource::builder(endpoint)
		.timeout(Duration::seconds(2))
		.build()
		.expect("Token source should build.");
	let err = source.fetch(&Audience::COSMOS_DB).await.expect_err("Closed port must fail.");

	assert!(matches!(err, TokenSourceError::Network { .. } | TokenSourceError::Timeout { .. }));
}

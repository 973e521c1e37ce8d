//! Demonstrates sharing delegated credentials for a database and an embedding endpoint through
//! one host token endpoint, then signing a downstream request with the cached token.

// std
use std::sync::Arc;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use color_eyre::Result;
use httpmock::prelude::*;
use time::OffsetDateTime;
use url::Url;
// self
use delegated_credential::{
	auth::Audience,
	credential::CredentialRegistry,
	ext::BearerAuth,
	reqwest::Client,
	source::HttpTokenSource,
};

fn demo_token(audience: &str) -> String {
	let exp = OffsetDateTime::now_utc().unix_timestamp() + 3600;
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"aud":"{audience}","exp":{exp}}}"#));

	format!("{header}.{payload}.c2lnbmF0dXJl")
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let host = MockServer::start_async().await;
	let cosmos_mock = host
		.mock_async(|when, then| {
			when.method(GET).path("/token").query_param("resource", Audience::COSMOS_DB.as_str());
			then.status(200)
				.header("content-type", "application/json")
				.body(format!(r#"{{"access_token":"{}"}}"#, demo_token(&Audience::COSMOS_DB)));
		})
		.await;
	let cognitive_mock = host
		.mock_async(|when, then| {
			when.method(GET)
				.path("/token")
				.query_param("resource", Audience::COGNITIVE_SERVICES.as_str());
			then.status(200).header("content-type", "application/json").body(format!(
				r#"{{"access_token":"{}"}}"#,
				demo_token(&Audience::COGNITIVE_SERVICES)
			));
		})
		.await;
	let api_mock = host
		.mock_async(|when, then| {
			when.method(POST).path("/dbs/SampleDatabase/colls/SampleData/docs");
			then.status(200).header("content-type", "application/json").body("{\"Documents\":[]}");
		})
		.await;
	let source = HttpTokenSource::builder(Url::parse(&host.url("/token"))?)
		.header("metadata", "true")
		.build()?;
	let registry = CredentialRegistry::new(Arc::new(source));
	let cosmos = registry.credential(&Audience::COSMOS_DB);
	let cognitive = registry.credential(&Audience::COGNITIVE_SERVICES);

	for _ in 0..3 {
		let token = cosmos.get_token().await?;

		println!("Database token expires at {}.", token.expires_at);
	}

	let embedding_token = cognitive.get_token().await?;

	println!("Embedding token expires at {}.", embedding_token.expires_at);

	let auth = BearerAuth::new(cosmos.clone());
	let response = auth
		.authorize(Client::new().post(host.url("/dbs/SampleDatabase/colls/SampleData/docs")))
		.await?
		.send()
		.await?;

	println!("Query answered with HTTP {}.", response.status());
	println!(
		"Database credential: {} fetch(es), {} cache hit(s).",
		cosmos.metrics().fetches(),
		cosmos.metrics().cache_hits()
	);

	cosmos_mock.assert_calls_async(1).await;
	cognitive_mock.assert_calls_async(1).await;
	api_mock.assert_async().await;

	Ok(())
}

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Mints an unsigned compact token whose payload carries `exp` (and a distinguishing `jti`).
pub fn mint_token(exp: i64, jti: &str) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(format!(
		r#"{{"aud":"https://cosmos.azure.com/","exp":{exp},"jti":"{jti}"}}"#
	));

	format!("{header}.{payload}.c2lnbmF0dXJl")
}

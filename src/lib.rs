//! Expiry-aware bearer credentials for host-delegated tokens: lazy fetch, JWT expiry decoding,
//! singleflight renewal, and request signing in one small crate.
//!
//! Hosted notebooks and function runtimes hand code a delegated token for an audience (a
//! database, a model endpoint) instead of running a full OAuth flow. Client libraries, however,
//! ask for credentials on every request. [`credential::DelegatedCredential`] sits between the
//! two: it fetches through a [`source::TokenSource`], decodes the token's `exp` claim, caches the
//! pair, and renews once the clock enters a skew window (60 seconds by default) before expiry.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod credential;
pub mod error;
pub mod ext;
pub mod jwt;
pub mod obs;
pub mod source;

mod _prelude {
	pub use std::{
		borrow::Cow,
		collections::{BTreeMap, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};

//! OAuth exchange client for the external token endpoint.
//!
//! Both supported grants post a URL-encoded form to the same endpoint and parse the same JSON
//! response shape. Failures are split into three classes the lifecycle manager can reason
//! about: transport failures (no response obtained), upstream rejections (non-2xx, carrying
//! status and body for diagnostics), and malformed response payloads. None of them are retried
//! here; retry policy belongs to the caller.

// self
use crate::_prelude::*;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Boxed future returned by [`TokenExchange`] operations.
pub type ExchangeFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, ExchangeError>> + 'a + Send>>;

/// The two grant flows this crate speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantType {
	/// One-time exchange of an authorization code for an initial token pair.
	AuthorizationCode,
	/// Rotation of the access token using the stored refresh token.
	RefreshToken,
}
impl GrantType {
	/// Returns the wire-level `grant_type` value.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::RefreshToken => "refresh_token",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Parameters for a `grant_type=authorization_code` exchange.
#[derive(Clone)]
pub struct CodeGrant<'a> {
	/// OAuth client identifier.
	pub client_id: &'a str,
	/// Decrypted OAuth client secret.
	pub client_secret: &'a str,
	/// One-time authorization code from the browser flow.
	pub code: &'a str,
	/// Redirect URI matching the provider app configuration.
	pub redirect_uri: &'a str,
}
impl Debug for CodeGrant<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CodeGrant")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("code", &"<redacted>")
			.field("redirect_uri", &self.redirect_uri)
			.finish()
	}
}

/// Parameters for a `grant_type=refresh_token` exchange.
#[derive(Clone)]
pub struct RefreshGrant<'a> {
	/// OAuth client identifier.
	pub client_id: &'a str,
	/// Decrypted OAuth client secret.
	pub client_secret: &'a str,
	/// Decrypted refresh token.
	pub refresh_token: &'a str,
}
impl Debug for RefreshGrant<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshGrant")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}

/// Successful token endpoint response.
#[derive(Clone, Deserialize)]
pub struct TokenEndpointResponse {
	/// Newly issued access token.
	pub access_token: String,
	/// Newly issued refresh token; always present on the code grant, optional on refresh.
	#[serde(default)]
	pub refresh_token: Option<String>,
	/// Relative validity window in seconds.
	pub expires_in: i64,
	/// Token scheme, defaulting to a bearer scheme when the provider omits it.
	#[serde(default = "default_token_type")]
	pub token_type: String,
}
impl TokenEndpointResponse {
	/// Upper bound accepted for `expires_in`, in seconds (one leap year).
	///
	/// Larger values cannot be applied to a calendar instant without overflowing, and no real
	/// provider issues tokens anywhere near this long-lived.
	pub const MAX_EXPIRES_IN: i64 = 366 * 24 * 60 * 60;

	/// Returns the validity window as a duration, rejecting non-positive or implausibly large
	/// values.
	pub fn validity(&self) -> Result<Duration, ExchangeError> {
		if self.expires_in <= 0 {
			return Err(ExchangeError::NonPositiveExpiresIn { value: self.expires_in });
		}
		if self.expires_in > Self::MAX_EXPIRES_IN {
			return Err(ExchangeError::ExpiresInOutOfRange { value: self.expires_in });
		}

		Ok(Duration::seconds(self.expires_in))
	}

	/// Returns the refresh token, which the code grant requires.
	pub fn require_refresh_token(&self) -> Result<&str, ExchangeError> {
		self.refresh_token.as_deref().ok_or(ExchangeError::MissingRefreshToken)
	}
}
impl Debug for TokenEndpointResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenEndpointResponse")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in", &self.expires_in)
			.field("token_type", &self.token_type)
			.finish()
	}
}

/// Typed failure surfaced by [`TokenExchange`] implementations.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// No response was obtained from the token endpoint (DNS, TCP, TLS, timeout).
	#[error("Network error occurred while calling the token endpoint.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// The upstream rejected the grant with a non-2xx response.
	#[error("Token endpoint rejected the grant with HTTP {status}: {body}")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Response body, kept verbatim for operator diagnostics.
		body: String,
	},
	/// The response body violated the expected JSON schema.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the malformed response.
		status: u16,
	},
	/// An authorization-code exchange response omitted the refresh token.
	#[error("Token endpoint omitted the refresh token from an authorization_code exchange.")]
	MissingRefreshToken,
	/// The response carried a non-positive `expires_in`.
	#[error("Token endpoint returned a non-positive expires_in ({value}).")]
	NonPositiveExpiresIn {
		/// Offending value.
		value: i64,
	},
	/// The response carried an `expires_in` beyond [`TokenEndpointResponse::MAX_EXPIRES_IN`].
	#[error("Token endpoint returned an out-of-range expires_in ({value}).")]
	ExpiresInOutOfRange {
		/// Offending value.
		value: i64,
	},
}
impl ExchangeError {
	/// Wraps a transport-specific failure.
	pub fn transport(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Transport { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ExchangeError {
	fn from(e: ReqwestError) -> Self {
		Self::transport(e)
	}
}

/// Contract for the two grant exchanges against the external token endpoint.
pub trait TokenExchange
where
	Self: 'static + Send + Sync,
{
	/// Exchanges a one-time authorization code for an initial token pair.
	fn exchange_code<'a>(&'a self, grant: CodeGrant<'a>)
	-> ExchangeFuture<'a, TokenEndpointResponse>;

	/// Rotates the access token using the stored refresh token.
	fn exchange_refresh<'a>(
		&'a self,
		grant: RefreshGrant<'a>,
	) -> ExchangeFuture<'a, TokenEndpointResponse>;
}

/// Reqwest-backed [`TokenExchange`] targeting one configured token endpoint.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestExchange {
	endpoint: Url,
	client: ReqwestClient,
}
#[cfg(feature = "reqwest")]
impl ReqwestExchange {
	/// Creates an exchange client with a default reqwest transport.
	pub fn new(endpoint: Url) -> Self {
		Self::with_client(endpoint, ReqwestClient::default())
	}

	/// Creates an exchange client that reuses the caller's [`ReqwestClient`].
	///
	/// Timeouts are a transport concern; configure them on the supplied client. A timeout then
	/// surfaces as [`ExchangeError::Transport`] like any other network failure.
	pub fn with_client(endpoint: Url, client: ReqwestClient) -> Self {
		Self { endpoint, client }
	}

	/// The configured token endpoint.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	async fn post_form(
		&self,
		form: &[(&str, &str)],
	) -> Result<TokenEndpointResponse, ExchangeError> {
		let response = self.client.post(self.endpoint.clone()).form(form).send().await?;
		let status = response.status().as_u16();
		let body = response.bytes().await?;

		if !(200..300).contains(&status) {
			return Err(ExchangeError::Rejected {
				status,
				body: String::from_utf8_lossy(&body).into_owned(),
			});
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ExchangeError::MalformedResponse { source, status })
	}
}
#[cfg(feature = "reqwest")]
impl TokenExchange for ReqwestExchange {
	fn exchange_code<'a>(
		&'a self,
		grant: CodeGrant<'a>,
	) -> ExchangeFuture<'a, TokenEndpointResponse> {
		Box::pin(async move {
			self.post_form(&[
				("grant_type", GrantType::AuthorizationCode.as_str()),
				("code", grant.code),
				("client_id", grant.client_id),
				("client_secret", grant.client_secret),
				("redirect_uri", grant.redirect_uri),
			])
			.await
		})
	}

	fn exchange_refresh<'a>(
		&'a self,
		grant: RefreshGrant<'a>,
	) -> ExchangeFuture<'a, TokenEndpointResponse> {
		Box::pin(async move {
			self.post_form(&[
				("grant_type", GrantType::RefreshToken.as_str()),
				("refresh_token", grant.refresh_token),
				("client_id", grant.client_id),
				("client_secret", grant.client_secret),
			])
			.await
		})
	}
}

fn default_token_type() -> String {
	crate::auth::DEFAULT_TOKEN_TYPE.to_owned()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn response_parses_with_all_fields() {
		let response: TokenEndpointResponse = serde_json::from_str(
			"{\"access_token\":\"atza|abc\",\"refresh_token\":\"atzr|def\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
		)
		.expect("Full token response should parse.");

		assert_eq!(response.access_token, "atza|abc");
		assert_eq!(response.refresh_token.as_deref(), Some("atzr|def"));
		assert_eq!(response.token_type, "Bearer");
		assert_eq!(
			response.validity().expect("Positive expires_in should be accepted."),
			Duration::seconds(3600),
		);
	}

	#[test]
	fn token_type_defaults_to_bearer() {
		let response: TokenEndpointResponse =
			serde_json::from_str("{\"access_token\":\"a\",\"expires_in\":60}")
				.expect("Minimal token response should parse.");

		assert_eq!(response.token_type, "bearer");
		assert!(response.refresh_token.is_none());
		assert!(matches!(
			response.require_refresh_token(),
			Err(ExchangeError::MissingRefreshToken),
		));
	}

	#[test]
	fn missing_required_fields_are_schema_violations() {
		let mut deserializer =
			serde_json::Deserializer::from_str("{\"refresh_token\":\"only\"}");
		let err = serde_path_to_error::deserialize::<_, TokenEndpointResponse>(&mut deserializer)
			.expect_err("Response without access_token should fail to parse.");

		assert!(err.to_string().contains("access_token"));
	}

	#[test]
	fn non_positive_expiry_is_rejected() {
		let response: TokenEndpointResponse =
			serde_json::from_str("{\"access_token\":\"a\",\"expires_in\":0}")
				.expect("Zero expires_in should still parse.");

		assert!(matches!(
			response.validity(),
			Err(ExchangeError::NonPositiveExpiresIn { value: 0 }),
		));
	}

	#[test]
	fn oversized_expiry_is_rejected_before_it_can_overflow() {
		let response: TokenEndpointResponse = serde_json::from_str(
			"{\"access_token\":\"a\",\"refresh_token\":\"r\",\"expires_in\":9223372036854775807}",
		)
		.expect("Huge expires_in should still parse.");

		assert!(matches!(
			response.validity(),
			Err(ExchangeError::ExpiresInOutOfRange { value: i64::MAX }),
		));

		let response: TokenEndpointResponse = serde_json::from_str(&format!(
			"{{\"access_token\":\"a\",\"expires_in\":{}}}",
			TokenEndpointResponse::MAX_EXPIRES_IN,
		))
		.expect("Boundary expires_in should parse.");

		assert_eq!(
			response.validity().expect("The boundary value should be accepted."),
			Duration::seconds(TokenEndpointResponse::MAX_EXPIRES_IN),
		);
	}

	#[test]
	fn grant_debug_redacts_secret_material() {
		let code = CodeGrant {
			client_id: "client",
			client_secret: "s3cr3t",
			code: "auth-code",
			redirect_uri: "https://localhost",
		};
		let refresh =
			RefreshGrant { client_id: "client", client_secret: "s3cr3t", refresh_token: "atzr|x" };

		assert!(!format!("{code:?}").contains("s3cr3t"));
		assert!(!format!("{code:?}").contains("auth-code"));
		assert!(!format!("{refresh:?}").contains("atzr|x"));
	}
}

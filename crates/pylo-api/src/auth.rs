// API key generation
//
// `type=keygen` trades a username/password for a long-lived API key.
// The request goes out as a form body so the password never lands in a
// URL, and the response body is never logged because it carries the key.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::PanClient;
use crate::error::Error;
use crate::models::KeygenResult;
use crate::xml;

impl PanClient {
    /// Authenticate with username/password and store the resulting key.
    ///
    /// `POST /api/` with `type=keygen&user=..&password=..`
    ///
    /// Rejected credentials surface as [`Error::Authentication`] with the
    /// device's message; connection failures stay [`Error::Transport`] so
    /// callers can tell "wrong password" from "host unreachable".
    pub async fn generate_api_key(
        &mut self,
        username: &str,
        password: &SecretString,
    ) -> Result<(), Error> {
        let url = self.api_url()?;
        debug!(host = %self.host(), user = username, "type=keygen password=********");

        let resp = self
            .http()
            .post(url)
            .form(&[
                ("type", "keygen"),
                ("user", username),
                ("password", password.expose_secret()),
            ])
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        let envelope = xml::parse_envelope(&body).map_err(|_| Error::Authentication {
            message: format!("unexpected keygen response (HTTP {status})"),
        })?;
        if !envelope.is_success() || !status.is_success() {
            let message = xml::collect_lines(&body, "msg").join("; ");
            return Err(Error::Authentication {
                message: if message.is_empty() {
                    format!("keygen rejected (HTTP {status})")
                } else {
                    message
                },
            });
        }

        let key = xml::parse_result::<KeygenResult>(&body)
            .map_err(|_| Error::Authentication {
                message: "keygen response did not contain a key".into(),
            })?
            .map(|r| r.key)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Authentication {
                message: "keygen response did not contain a key".into(),
            })?;

        self.set_api_key(SecretString::from(key));
        debug!(host = %self.host(), "API key generated");
        Ok(())
    }
}

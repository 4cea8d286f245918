//! Process handoff contract.
//!
//! One process generation passes work to the next exclusively through the
//! argument list of the child process. This module owns that encoding:
//!
//! ```text
//! --remote <url> --local <absolute path> [--args <token>...]
//! ```
//!
//! `--args` is only emitted when there are restart arguments. Everything
//! after it is forwarded verbatim to the relaunched artifact, including
//! tokens that look like flags.

use crate::core::UpdateError;
use reqwest::Url;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flag introducing the remote location.
pub const REMOTE_FLAG: &str = "--remote";
/// Flag introducing the local destination.
pub const LOCAL_FLAG: &str = "--local";
/// Flag after which all tokens are pass-through restart arguments.
pub const ARGS_FLAG: &str = "--args";

/// A request to replace `local` with the bytes found at `remote`.
///
/// `local` is always absolute. `restart_args` are kept as [`OsString`] so
/// they survive every process boundary byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    remote: Url,
    local: PathBuf,
    restart_args: Vec<OsString>,
}

impl UpdateRequest {
    /// Create a request, making `local` absolute against the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Io`] if the current directory cannot be read
    /// while absolutizing a relative path.
    pub fn new<I, S>(remote: Url, local: impl AsRef<Path>, restart_args: I) -> Result<Self, UpdateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let local = local.as_ref();
        let local = std::path::absolute(local)
            .map_err(|e| UpdateError::io("resolve absolute path of", local, e))?;

        Ok(Self {
            remote,
            local,
            restart_args: restart_args.into_iter().map(Into::into).collect(),
        })
    }

    pub fn remote(&self) -> &Url {
        &self.remote
    }

    pub fn local(&self) -> &Path {
        &self.local
    }

    pub fn restart_args(&self) -> &[OsString] {
        &self.restart_args
    }

    /// Encode this request as a handoff message.
    #[must_use]
    pub fn encode(&self) -> Vec<OsString> {
        let mut tokens = Vec::with_capacity(5 + self.restart_args.len());
        tokens.push(REMOTE_FLAG.into());
        tokens.push(self.remote.as_str().into());
        tokens.push(LOCAL_FLAG.into());
        tokens.push(self.local.clone().into_os_string());

        if !self.restart_args.is_empty() {
            tokens.push(ARGS_FLAG.into());
            tokens.extend(self.restart_args.iter().cloned());
        }

        tokens
    }

    /// Decode a handoff message produced by [`encode`](Self::encode).
    ///
    /// `--remote` and `--local` are looked up among the tokens before the
    /// first `--args` and may appear in any order; the first occurrence
    /// wins. Unknown tokens in that region are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::MalformedInput`] when a required flag or its
    /// value is missing, or when the remote location is not a valid URL.
    pub fn decode<S: AsRef<OsStr>>(tokens: &[S]) -> Result<Self, UpdateError> {
        let tokens: Vec<&OsStr> = tokens.iter().map(AsRef::as_ref).collect();

        let (head, restart_args) =
            match tokens.iter().position(|token| *token == OsStr::new(ARGS_FLAG)) {
                Some(index) => (&tokens[..index], &tokens[index + 1..]),
                None => (&tokens[..], &tokens[..0]),
            };

        let remote = flag_value(head, REMOTE_FLAG)?;
        let remote = remote.to_str().ok_or_else(|| {
            UpdateError::malformed(format!("{REMOTE_FLAG} value is not valid UTF-8"))
        })?;
        let remote = Url::parse(remote).map_err(|e| {
            UpdateError::malformed(format!("{REMOTE_FLAG} value '{remote}' is not a URL: {e}"))
        })?;

        let local = PathBuf::from(flag_value(head, LOCAL_FLAG)?);
        if local.as_os_str().is_empty() {
            return Err(UpdateError::malformed(format!("{LOCAL_FLAG} value is empty")));
        }

        for (index, token) in head.iter().enumerate() {
            let is_flag = *token == OsStr::new(REMOTE_FLAG) || *token == OsStr::new(LOCAL_FLAG);
            let is_value = index > 0
                && (head[index - 1] == OsStr::new(REMOTE_FLAG)
                    || head[index - 1] == OsStr::new(LOCAL_FLAG));
            if !is_flag && !is_value {
                debug!("Ignoring unknown handoff token {:?}", token);
            }
        }

        Self::new(remote, local, restart_args.iter().copied())
    }
}

/// Find `flag` in `head` and return the token that follows it.
fn flag_value<'a>(head: &[&'a OsStr], flag: &str) -> Result<&'a OsStr, UpdateError> {
    let index = head
        .iter()
        .position(|token| *token == OsStr::new(flag))
        .ok_or_else(|| UpdateError::malformed(format!("missing required flag {flag}")))?;

    head.get(index + 1)
        .copied()
        .ok_or_else(|| UpdateError::malformed(format!("flag {flag} has no value")))
}

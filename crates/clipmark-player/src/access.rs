#![forbid(unsafe_code)]

//! Access gate for restricted sources.
//!
//! A restricted gallery entry does not carry its video name in clear; it
//! carries a ciphertext that the external decryption service turns into the
//! name given the right password. [`AccessGate`] only tracks the exchange:
//!
//! ```text
//!   request ──(password remembered)──────────────▶ DecryptRequest
//!      └──(no password)──▶ Prompt::Password ── submit ──▶ DecryptRequest
//!
//!   result Ok(name)  ──▶ open "<base_url>/<name>", remember password
//!   result Err(_)    ──▶ Prompt::IncorrectCode ── submit ──▶ DecryptRequest
//! ```
//!
//! A pending request never blocks gesture or timeline handling; its result
//! arrives whenever the host's async call settles. Results carrying a
//! ticket other than the pending one are dropped.

use clipmark_backend::KeyValueStore;

use crate::config::AccessConfig;

/// Encrypted reference to a restricted video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedSource {
    /// Access rule (collection) name; passwords are remembered per rule.
    pub rule: String,
    pub salt: String,
    pub iterations: u32,
    /// Hex-encoded nonce.
    pub iv: String,
    /// Hex-encoded ciphertext of the video name.
    pub ciphertext: String,
    /// Directory the decrypted name is resolved against.
    pub base_url: String,
}

/// Identifies one decryption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecryptTicket(u64);

impl DecryptTicket {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Work order for the external decryption service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptRequest {
    pub ticket: DecryptTicket,
    pub password: String,
    pub salt: String,
    pub iterations: u32,
    pub iv: String,
    pub ciphertext: String,
}

/// Opaque failure reported by the decryption service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptError(pub String);

impl std::fmt::Display for DecryptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "decryption failed: {}", self.0)
    }
}

impl std::error::Error for DecryptError {}

/// What the host should ask the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPrompt {
    /// Ask for the access code of `rule`.
    Password { rule: String },
    /// The last code was wrong; ask again.
    IncorrectCode { rule: String },
}

#[derive(Debug, Clone)]
struct Pending {
    source: ProtectedSource,
    ticket: Option<DecryptTicket>,
    password: Option<String>,
}

/// Tracks one restricted-source unlock at a time.
#[derive(Debug, Clone)]
pub struct AccessGate {
    config: AccessConfig,
    pending: Option<Pending>,
    prompt: Option<AccessPrompt>,
    next_ticket: u64,
}

impl AccessGate {
    #[must_use]
    pub fn new(config: AccessConfig) -> Self {
        Self {
            config,
            pending: None,
            prompt: None,
            next_ticket: 1,
        }
    }

    /// Prompt the host should currently display.
    #[must_use]
    pub fn prompt(&self) -> Option<&AccessPrompt> {
        self.prompt.as_ref()
    }

    /// Whether a decryption request is in flight.
    #[must_use]
    pub fn is_decrypting(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| p.ticket.is_some())
    }

    fn password_key(&self, rule: &str) -> String {
        format!("{}{rule}", self.config.password_key_prefix)
    }

    /// Start unlocking `source`. Replaces any unlock in progress.
    ///
    /// Uses the remembered password for the rule if there is one, otherwise
    /// raises [`AccessPrompt::Password`] and returns `None`.
    pub fn request<S: KeyValueStore>(
        &mut self,
        source: ProtectedSource,
        store: &S,
    ) -> Option<DecryptRequest> {
        let key = self.password_key(&source.rule);
        let remembered = match store.get(&key) {
            Ok(value) => value.filter(|p| !p.is_empty()),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "remembered password unreadable");
                None
            }
        };
        self.pending = Some(Pending {
            source,
            ticket: None,
            password: None,
        });
        match remembered {
            Some(password) => self.issue(password),
            None => {
                self.prompt = self.pending.as_ref().map(|p| AccessPrompt::Password {
                    rule: p.source.rule.clone(),
                });
                None
            }
        }
    }

    /// Submit the password typed in answer to the current prompt.
    pub fn submit_password(&mut self, password: &str) -> Option<DecryptRequest> {
        if self.prompt.is_none() || password.is_empty() {
            return None;
        }
        self.issue(password.to_owned())
    }

    /// Viewer dismissed the prompt; forget the unlock.
    pub fn cancel_prompt(&mut self) {
        if self.prompt.take().is_some() {
            self.pending = None;
        }
    }

    /// Handle the decryption service's answer.
    ///
    /// On success returns the URL to open and remembers the password; on
    /// failure raises [`AccessPrompt::IncorrectCode`].
    pub fn on_decrypt_result<S: KeyValueStore>(
        &mut self,
        ticket: DecryptTicket,
        result: Result<String, DecryptError>,
        store: &mut S,
    ) -> Option<String> {
        let matches = self
            .pending
            .as_ref()
            .is_some_and(|p| p.ticket == Some(ticket));
        if !matches {
            tracing::trace!(ticket = ticket.get(), "stale decrypt result ignored");
            return None;
        }

        match result {
            Ok(name) => {
                let pending = self.pending.take()?;
                self.prompt = None;
                if let Some(password) = pending.password.as_deref() {
                    let key = self.password_key(&pending.source.rule);
                    if let Err(err) = store.set(&key, password) {
                        tracing::warn!(key = %key, error = %err, "password not remembered");
                    }
                }
                let url = format!("{}/{name}", pending.source.base_url.trim_end_matches('/'));
                tracing::info!(rule = %pending.source.rule, "restricted source unlocked");
                Some(url)
            }
            Err(err) => {
                let pending = self.pending.as_mut()?;
                pending.ticket = None;
                pending.password = None;
                tracing::info!(rule = %pending.source.rule, error = %err, "incorrect access code");
                self.prompt = Some(AccessPrompt::IncorrectCode {
                    rule: pending.source.rule.clone(),
                });
                None
            }
        }
    }

    fn issue(&mut self, password: String) -> Option<DecryptRequest> {
        let ticket = DecryptTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        let pending = self.pending.as_mut()?;
        pending.ticket = Some(ticket);
        pending.password = Some(password.clone());
        self.prompt = None;
        tracing::debug!(ticket = ticket.get(), rule = %pending.source.rule, "decrypt requested");
        Some(DecryptRequest {
            ticket,
            password,
            salt: pending.source.salt.clone(),
            iterations: pending.source.iterations,
            iv: pending.source.iv.clone(),
            ciphertext: pending.source.ciphertext.clone(),
        })
    }
}

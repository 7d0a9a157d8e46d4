//! # Bridge Configuration
//!
//! Limits, durations and accounts of a bridge deployment. Loaded from
//! defaults, `BRIDGE_*` environment variables or JSON, then validated.

use bridge_zkp::MAX_TREE_LEAVES;
use serde::{Deserialize, Serialize};
use shared_types::{parse_address, Address, Amount, TokenId, ZERO_ADDRESS};
use std::env;
use thiserror::Error;

const HOUR: u64 = 3600;
const DAY: u64 = 24 * HOUR;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field failed validation.
    #[error("Invalid {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Detail
        reason: String,
    },

    /// An environment variable could not be parsed.
    #[error("Invalid environment variable {var}: {reason}")]
    Env {
        /// Variable name
        var: &'static str,
        /// Detail
        reason: String,
    },

    /// JSON document could not be decoded.
    #[error("Invalid JSON configuration: {0}")]
    Json(String),
}

/// Bridge deployment configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Administrator: dispute decisions, registry, treasury sweeps.
    #[serde(with = "hex_address")]
    pub owner: Address,
    /// Recipient of slashed bonds.
    #[serde(with = "hex_address")]
    pub treasury: Address,
    /// Account holding all locked funds.
    #[serde(with = "hex_address")]
    pub vault: Address,
    /// Token leaders post their bond in.
    #[serde(with = "hex_address")]
    pub bond_token: TokenId,
    /// Bond collected from every leader.
    pub leader_bond: Amount,
    /// Tokens channels may lock.
    #[serde(with = "hex_address_list")]
    pub supported_tokens: Vec<TokenId>,
    /// Minimum participants per channel.
    pub min_participants: usize,
    /// Maximum participants per channel.
    pub max_participants: usize,
    /// Maximum tokens per channel.
    pub max_tokens: usize,
    /// Shortest channel timeout (seconds).
    pub min_timeout: u64,
    /// Longest channel timeout (seconds).
    pub max_timeout: u64,
    /// Grace period after the timeout for settlement proofs (seconds).
    pub proof_submission_deadline: u64,
    /// Window after close during which disputes may be raised (seconds).
    pub dispute_window: u64,
    /// Age after which an undecided dispute is inert (seconds).
    pub dispute_timeout: u64,
    /// Delay after close before a channel may be purged (seconds).
    pub cleanup_cooldown: u64,
    /// Longest accepted transition chain.
    pub max_chained_proofs: usize,
    /// Require block-context and instance commitments in transition proofs.
    pub enforce_transition_context: bool,
    /// Largest accepted dispute evidence.
    pub max_evidence_bytes: usize,
    /// Identifier of the first channel.
    pub first_channel_id: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            owner: ZERO_ADDRESS,
            treasury: ZERO_ADDRESS,
            vault: ZERO_ADDRESS,
            bond_token: ZERO_ADDRESS,
            leader_bond: 1,
            supported_tokens: Vec::new(),
            min_participants: 3,
            max_participants: 128,
            max_tokens: 4,
            min_timeout: HOUR,
            max_timeout: 365 * DAY,
            proof_submission_deadline: 7 * DAY,
            dispute_window: 7 * DAY,
            dispute_timeout: 3 * DAY,
            cleanup_cooldown: 30 * DAY,
            max_chained_proofs: 5,
            enforce_transition_context: true,
            max_evidence_bytes: 4096,
            first_channel_id: 1,
        }
    }
}

impl BridgeConfig {
    /// Defaults overridden by environment variables, then validated.
    ///
    /// # Environment Variables
    ///
    /// - `BRIDGE_OWNER`, `BRIDGE_TREASURY`, `BRIDGE_VAULT`, `BRIDGE_BOND_TOKEN`: hex addresses
    /// - `BRIDGE_SUPPORTED_TOKENS`: comma-separated hex addresses
    /// - `BRIDGE_LEADER_BOND`: bond amount
    /// - `BRIDGE_MIN_PARTICIPANTS`, `BRIDGE_MAX_PARTICIPANTS`, `BRIDGE_MAX_TOKENS`
    /// - `BRIDGE_MIN_TIMEOUT`, `BRIDGE_MAX_TIMEOUT`, `BRIDGE_PROOF_DEADLINE`,
    ///   `BRIDGE_DISPUTE_WINDOW`, `BRIDGE_DISPUTE_TIMEOUT`, `BRIDGE_CLEANUP_COOLDOWN`: seconds
    /// - `BRIDGE_MAX_CHAINED_PROOFS`, `BRIDGE_MAX_EVIDENCE_BYTES`
    /// - `BRIDGE_ENFORCE_TRANSITION_CONTEXT`: `true`/`false`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = env_address("BRIDGE_OWNER")? {
            config.owner = v;
        }
        if let Some(v) = env_address("BRIDGE_TREASURY")? {
            config.treasury = v;
        }
        if let Some(v) = env_address("BRIDGE_VAULT")? {
            config.vault = v;
        }
        if let Some(v) = env_address("BRIDGE_BOND_TOKEN")? {
            config.bond_token = v;
        }
        if let Ok(list) = env::var("BRIDGE_SUPPORTED_TOKENS") {
            config.supported_tokens = list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    parse_address(s).map_err(|e| ConfigError::Env {
                        var: "BRIDGE_SUPPORTED_TOKENS",
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(v) = env_parse("BRIDGE_LEADER_BOND")? {
            config.leader_bond = v;
        }
        if let Some(v) = env_parse("BRIDGE_MIN_PARTICIPANTS")? {
            config.min_participants = v;
        }
        if let Some(v) = env_parse("BRIDGE_MAX_PARTICIPANTS")? {
            config.max_participants = v;
        }
        if let Some(v) = env_parse("BRIDGE_MAX_TOKENS")? {
            config.max_tokens = v;
        }
        if let Some(v) = env_parse("BRIDGE_MIN_TIMEOUT")? {
            config.min_timeout = v;
        }
        if let Some(v) = env_parse("BRIDGE_MAX_TIMEOUT")? {
            config.max_timeout = v;
        }
        if let Some(v) = env_parse("BRIDGE_PROOF_DEADLINE")? {
            config.proof_submission_deadline = v;
        }
        if let Some(v) = env_parse("BRIDGE_DISPUTE_WINDOW")? {
            config.dispute_window = v;
        }
        if let Some(v) = env_parse("BRIDGE_DISPUTE_TIMEOUT")? {
            config.dispute_timeout = v;
        }
        if let Some(v) = env_parse("BRIDGE_CLEANUP_COOLDOWN")? {
            config.cleanup_cooldown = v;
        }
        if let Some(v) = env_parse("BRIDGE_MAX_CHAINED_PROOFS")? {
            config.max_chained_proofs = v;
        }
        if let Some(v) = env_parse("BRIDGE_MAX_EVIDENCE_BYTES")? {
            config.max_evidence_bytes = v;
        }
        if let Some(v) = env_parse("BRIDGE_ENFORCE_TRANSITION_CONTEXT")? {
            config.enforce_transition_context = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Decode a JSON document (missing fields take defaults), then validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the owner.
    pub fn with_owner(mut self, owner: Address) -> Self {
        self.owner = owner;
        self
    }

    /// Set the treasury.
    pub fn with_treasury(mut self, treasury: Address) -> Self {
        self.treasury = treasury;
        self
    }

    /// Set the vault account.
    pub fn with_vault(mut self, vault: Address) -> Self {
        self.vault = vault;
        self
    }

    /// Set bond token and amount.
    pub fn with_bond(mut self, token: TokenId, amount: Amount) -> Self {
        self.bond_token = token;
        self.leader_bond = amount;
        self
    }

    /// Set the supported token list.
    pub fn with_supported_tokens(mut self, tokens: Vec<TokenId>) -> Self {
        self.supported_tokens = tokens;
        self
    }

    /// Set participant bounds.
    pub fn with_participant_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_participants = min;
        self.max_participants = max;
        self
    }

    /// Toggle context enforcement for transition proofs.
    pub fn with_enforce_transition_context(mut self, enforce: bool) -> Self {
        self.enforce_transition_context = enforce;
        self
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| {
            Err(ConfigError::InvalidValue {
                field,
                reason: reason.to_string(),
            })
        };

        for (field, addr) in [
            ("owner", &self.owner),
            ("treasury", &self.treasury),
            ("vault", &self.vault),
            ("bond_token", &self.bond_token),
        ] {
            if *addr == ZERO_ADDRESS {
                return invalid(field, "must be nonzero");
            }
        }
        if self.leader_bond == 0 {
            return invalid("leader_bond", "must be greater than zero");
        }
        if self.supported_tokens.is_empty() {
            return invalid("supported_tokens", "at least one token required");
        }
        if self.min_participants < 2 || self.min_participants > self.max_participants {
            return invalid("min_participants", "must be at least 2 and <= max_participants");
        }
        if self.max_participants > MAX_TREE_LEAVES {
            return invalid("max_participants", "exceeds largest circuit");
        }
        if self.max_tokens == 0 || self.max_tokens * self.min_participants > MAX_TREE_LEAVES {
            return invalid("max_tokens", "must be nonzero and fit the largest circuit");
        }
        if self.min_timeout == 0 || self.min_timeout > self.max_timeout {
            return invalid("min_timeout", "must be nonzero and <= max_timeout");
        }
        if self.max_chained_proofs == 0 {
            return invalid("max_chained_proofs", "must be nonzero");
        }
        if self.max_evidence_bytes == 0 {
            return invalid("max_evidence_bytes", "must be nonzero");
        }
        Ok(())
    }
}

fn env_address(var: &'static str) -> Result<Option<Address>, ConfigError> {
    match env::var(var) {
        Ok(value) => parse_address(&value)
            .map(Some)
            .map_err(|e| ConfigError::Env {
                var,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

fn env_parse<T>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Env {
                var,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

mod hex_address {
    use serde::{Deserialize, Deserializer, Serializer};
    use shared_types::{parse_address, to_hex, Address};

    pub fn serialize<S: Serializer>(addr: &Address, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&to_hex(addr))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        let raw = String::deserialize(d)?;
        parse_address(&raw).map_err(serde::de::Error::custom)
    }
}

mod hex_address_list {
    use serde::{Deserialize, Deserializer, Serializer};
    use shared_types::{parse_address, to_hex, Address};

    pub fn serialize<S: Serializer>(list: &[Address], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(list.iter().map(|a| to_hex(a)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Address>, D::Error> {
        Vec::<String>::deserialize(d)?
            .iter()
            .map(|raw| parse_address(raw).map_err(serde::de::Error::custom))
            .collect()
    }
}

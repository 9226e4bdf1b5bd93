use clap::{Parser, ValueEnum};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use crate::model::amount::Amount;
use crate::model::validator::{BalanceValidator, Cap, CreditLimit, NonNegative, Unchecked};

/// Port the server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 8080;

/// Number of accounts the directory is sized for at start-up.
pub const DEFAULT_CAPACITY: usize = 128;

/// Balance policy applied to the source account of every transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// Balances may not go below zero.
    NonNegative,
    /// Balances may go down to `-limit`.
    CreditLimit,
    /// Balances may not go above `limit`.
    Cap,
    /// Anything goes.
    Unchecked,
}

/// Server settings, read from the command line or the environment.
#[derive(Parser, Debug, Clone)]
#[clap(name = "account-ledger-server", version, about = "In-memory account ledger")]
pub struct ServerConfig {
    /// Address to bind.
    #[clap(long, env = "LEDGER_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to bind.
    #[clap(long, env = "LEDGER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Expected number of accounts.
    #[clap(long, env = "LEDGER_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,

    /// Balance policy for transfers.
    #[clap(long, env = "LEDGER_POLICY", value_enum, default_value_t = Policy::NonNegative)]
    pub policy: Policy,

    /// Limit used by the `credit-limit` and `cap` policies, in minor units.
    #[clap(long, env = "LEDGER_LIMIT", default_value_t = 0, allow_hyphen_values = true)]
    pub limit: i64,
}

impl ServerConfig {
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Builds the validator selected by `policy`.
    pub fn validator(&self) -> Arc<dyn BalanceValidator> {
        let limit = Amount::new(self.limit);
        match self.policy {
            Policy::NonNegative => Arc::new(NonNegative),
            Policy::CreditLimit => Arc::new(CreditLimit(limit)),
            Policy::Cap => Arc::new(Cap(limit)),
            Policy::Unchecked => Arc::new(Unchecked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["account-ledger-server"]).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.policy, Policy::NonNegative);
        assert_eq!(config.address(), "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert!(config.validator().validate(Amount::new(-1)).is_err());
    }

    #[test]
    fn test_credit_limit_policy() {
        let config = ServerConfig::try_parse_from([
            "account-ledger-server",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--policy",
            "credit-limit",
            "--limit",
            "100",
        ])
        .unwrap();

        assert_eq!(config.address(), "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        let validator = config.validator();
        assert!(validator.validate(Amount::new(-100)).is_ok());
        assert!(validator.validate(Amount::new(-101)).is_err());
    }

    #[test]
    fn test_invalid_policy() {
        assert!(
            ServerConfig::try_parse_from(["account-ledger-server", "--policy", "lenient"]).is_err()
        );
    }
}

use crate::composer::Strategy;
use anyhow::bail;
use clap::Parser;

/// Runtime configuration for the `motostream-client` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "motostream-client",
    version,
    about = "Times blocking and concurrent request composition against motostream-server"
)]
pub struct CliArgs {
    /// Base URL of the server.
    ///
    /// Environment variable: `SERVER_URL`
    #[arg(long, env = "SERVER_URL", default_value_t = String::from("http://localhost:8081"))]
    pub server_url: String,

    /// Strategy to run. Repeat to run several; all run when omitted.
    #[arg(long = "strategy", value_enum)]
    pub strategies: Vec<Strategy>,

    /// Number of ids fetched by each request-based strategy, starting at 1.
    ///
    /// Environment variable: `REQUEST_COUNT`
    #[arg(long, env = "REQUEST_COUNT", default_value_t = 4)]
    pub count: usize,

    /// Number of items taken from the stream before detaching.
    ///
    /// Environment variable: `STREAM_TAKE`
    #[arg(long, env = "STREAM_TAKE", default_value_t = 4)]
    pub take: usize,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub strategies: Vec<Strategy>,
    pub count: usize,
    pub take: usize,
}

impl TryFrom<CliArgs> for ClientConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.count == 0 {
            bail!("REQUEST_COUNT must be greater than 0");
        }
        if args.take == 0 {
            bail!("STREAM_TAKE must be greater than 0");
        }

        let strategies = if args.strategies.is_empty() {
            Strategy::ALL.to_vec()
        } else {
            args.strategies
        };

        Ok(Self {
            server_url: args.server_url,
            strategies,
            count: args.count,
            take: args.take,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_run_every_strategy() {
        let args = CliArgs::try_parse_from(["motostream-client"]).unwrap();
        let config = ClientConfig::try_from(args).unwrap();
        assert_eq!(config.server_url, "http://localhost:8081");
        assert_eq!(config.strategies, Strategy::ALL);
        assert_eq!(config.count, 4);
        assert_eq!(config.take, 4);
    }

    #[test]
    fn strategy_flag_is_repeatable() {
        let args = CliArgs::try_parse_from([
            "motostream-client",
            "--strategy",
            "nested-sequential",
            "--strategy",
            "stream",
        ])
        .unwrap();
        let config = ClientConfig::try_from(args).unwrap();
        assert_eq!(
            config.strategies,
            [Strategy::NestedSequential, Strategy::Stream]
        );
    }

    #[test]
    fn zero_counts_are_rejected() {
        let args = CliArgs::try_parse_from(["motostream-client", "--count", "0"]).unwrap();
        assert!(ClientConfig::try_from(args).is_err());

        let args = CliArgs::try_parse_from(["motostream-client", "--take", "0"]).unwrap();
        assert!(ClientConfig::try_from(args).is_err());
    }

    #[test]
    fn unknown_strategy_fails_to_parse() {
        assert!(CliArgs::try_parse_from(["motostream-client", "--strategy", "parallel"]).is_err());
    }
}

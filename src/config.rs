use crate::{Args, Duration};

/// Immutable bundle of run parameters, built once from the parsed command
/// line and owned by the prober for the whole run. Validation of the raw
/// inputs (positive timeout and hop budget) happens at the clap layer.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target: String,
    pub reply_timeout: Duration,
    pub max_hops: u8,
    pub payload_size: usize,
}

impl RunConfig {
    pub fn new(target: String, timeout_secs: u64, max_hops: u8, payload_size: usize) -> Self {
        Self {
            target,
            reply_timeout: Duration::from_secs(timeout_secs),
            max_hops,
            payload_size,
        }
    }
}

impl From<&Args> for RunConfig {
    fn from(args: &Args) -> Self {
        Self::new(
            args.target.clone(),
            args.timeout,
            args.max_hops,
            args.payload_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_run_config_new() {
        let config = RunConfig::new("example.com".to_string(), 4, 64, 64);
        assert_eq!(config.target, "example.com");
        assert_eq!(config.reply_timeout, Duration::from_secs(4));
        assert_eq!(config.max_hops, 64);
        assert_eq!(config.payload_size, 64);
    }

    #[test]
    fn test_run_config_from_args() {
        let args =
            Args::try_parse_from(["tracepath-ng", "-i", "2", "-t", "10", "-s", "32", "host.test"])
                .unwrap();
        let config = RunConfig::from(&args);
        assert_eq!(config.target, "host.test");
        assert_eq!(config.reply_timeout, Duration::from_secs(2));
        assert_eq!(config.max_hops, 10);
        assert_eq!(config.payload_size, 32);
    }
}
